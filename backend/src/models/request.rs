//! Inbound request snapshot handed to the pipeline stages.

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Uri, header};
use cookie::Cookie;

use super::carrier::ResponseCarrier;

/// Immutable view of the parts of an HTTP request the pipeline reads.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
}

impl InboundRequest {
    pub fn new(method: Method, path: &str, query: Option<&str>, headers: HeaderMap) -> Self {
        Self {
            method,
            path: normalize_path(path),
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
            headers,
        }
    }

    pub fn from_parts(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        Self::new(method.clone(), uri.path(), uri.query(), headers.clone())
    }

    /// GET request for `path_and_query` with no headers.
    pub fn get(path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path_and_query, None),
        };
        Self::new(Method::GET, path, query, HeaderMap::new())
    }

    /// Adds a header; values that are not valid header text are dropped.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// All request cookies, in header order. Multiple `Cookie` headers are
    /// concatenated; unreadable headers are skipped.
    pub fn cookies(&self) -> Vec<(String, String)> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(parse_cookie_header)
            .collect()
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies().into_iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    /// The `Cookie` header downstream handlers should see once the
    /// carrier's cookies are applied. `None` when no cookie remains.
    pub fn cookie_header_with(&self, carrier: &ResponseCarrier) -> Option<String> {
        let mut cookies = self.cookies();
        for cookie in carrier.cookies() {
            cookies.retain(|(name, _)| name != &cookie.name);
            if !cookie.is_removal() {
                cookies.push((cookie.name.clone(), cookie.value.clone()));
            }
        }

        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Parse a `Cookie` request header. Malformed pairs are skipped and
/// quoted values unquoted.
pub fn parse_cookie_header(value: &str) -> Vec<(String, String)> {
    Cookie::split_parse(value)
        .filter_map(Result::ok)
        .map(|cookie| (cookie.name().to_string(), cookie.value_trimmed().to_string()))
        .collect()
}

/// Leading `/` added, `\` read as `/`, runs of `/` collapsed: `//host`
/// must never survive into a redirect target.
fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    for c in path.trim().chars() {
        let c = if c == '\\' { '/' } else { c };
        if c == '/' && normalized.ends_with('/') {
            continue;
        }
        if normalized.is_empty() && c != '/' {
            normalized.push('/');
        }
        normalized.push(c);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}
