//! Response carrier
//!
//! A response-in-progress produced by one pipeline stage: a routing
//! disposition plus the cookies the client should receive.

use std::fmt;

use cookie::Cookie;
use serde::Serialize;

/// What should happen to the request after the pipeline ran.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Disposition {
    /// Continue to normal rendering.
    #[default]
    Next,
    /// Send the client elsewhere (path + optional query).
    Redirect(String),
    /// Render a different path without telling the client.
    Rewrite(String),
}

impl Disposition {
    pub fn is_next(&self) -> bool {
        matches!(self, Self::Next)
    }

    /// Append `query` to a redirect or rewrite target.
    pub fn with_query(self, query: Option<&str>) -> Self {
        match (self, query) {
            (Self::Redirect(target), Some(query)) => Self::Redirect(format!("{}?{}", target, query)),
            (Self::Rewrite(target), Some(query)) => Self::Rewrite(format!("{}?{}", target, query)),
            (disposition, _) => disposition,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => write!(f, "next"),
            Self::Redirect(target) => write!(f, "redirect({})", target),
            Self::Rewrite(target) => write!(f, "rewrite({})", target),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl From<SameSite> for cookie::SameSite {
    fn from(same_site: SameSite) -> Self {
        match same_site {
            SameSite::Strict => Self::Strict,
            SameSite::Lax => Self::Lax,
            SameSite::None => Self::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookieAttributes {
    pub path: String,
    pub domain: Option<String>,
    /// Seconds; `Some(0)` deletes the cookie on the client.
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            domain: None,
            max_age: None,
            http_only: false,
            secure: false,
            same_site: SameSite::Lax,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseCookie {
    pub name: String,
    pub value: String,
    pub attributes: CookieAttributes,
}

impl ResponseCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), attributes: CookieAttributes::default() }
    }

    /// A cookie that tells the client to drop `name`.
    pub fn removal(name: impl Into<String>, attributes: CookieAttributes) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            attributes: CookieAttributes { max_age: Some(0), ..attributes },
        }
    }

    pub fn with_attributes(mut self, attributes: CookieAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn is_removal(&self) -> bool {
        self.attributes.max_age == Some(0)
    }

    /// Render as a `Set-Cookie` header value. `SameSite=None` is always
    /// sent `Secure`.
    pub fn to_header_value(&self) -> String {
        let attrs = &self.attributes;
        let mut builder = Cookie::build((self.name.as_str(), self.value.as_str()))
            .path(attrs.path.as_str())
            .same_site(attrs.same_site.into())
            .http_only(attrs.http_only)
            .secure(attrs.secure || attrs.same_site == SameSite::None);
        if let Some(domain) = &attrs.domain {
            builder = builder.domain(domain.as_str());
        }
        if let Some(max_age) = attrs.max_age {
            builder = builder.max_age(cookie::time::Duration::seconds(max_age));
        }
        builder.build().to_string()
    }
}

/// One stage's response-in-progress.
///
/// Cookie names are unique: setting an existing name replaces the entry
/// in place, keeping the original position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResponseCarrier {
    pub disposition: Disposition,
    cookies: Vec<ResponseCookie>,
}

impl ResponseCarrier {
    pub fn pass_through() -> Self {
        Self::default()
    }

    pub fn redirect(target: impl Into<String>) -> Self {
        Self { disposition: Disposition::Redirect(target.into()), cookies: Vec::new() }
    }

    pub fn rewrite(target: impl Into<String>) -> Self {
        Self { disposition: Disposition::Rewrite(target.into()), cookies: Vec::new() }
    }

    pub fn set_cookie(&mut self, cookie: ResponseCookie) {
        match self.cookies.iter_mut().find(|existing| existing.name == cookie.name) {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
    }

    pub fn with_cookie(mut self, cookie: ResponseCookie) -> Self {
        self.set_cookie(cookie);
        self
    }

    pub fn cookie(&self, name: &str) -> Option<&ResponseCookie> {
        self.cookies.iter().find(|cookie| cookie.name == name)
    }

    pub fn cookies(&self) -> &[ResponseCookie] {
        &self.cookies
    }

    pub fn cookie_names(&self) -> Vec<&str> {
        self.cookies.iter().map(|cookie| cookie.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_cookie_replaces_in_place() {
        let mut carrier = ResponseCarrier::pass_through();
        carrier.set_cookie(ResponseCookie::new("a", "1"));
        carrier.set_cookie(ResponseCookie::new("b", "2"));
        carrier.set_cookie(ResponseCookie::new("a", "3"));

        assert_eq!(carrier.cookie_names(), vec!["a", "b"]);
        assert_eq!(carrier.cookie("a").map(|c| c.value.as_str()), Some("3"));
    }

    #[test]
    fn test_header_value_rendering() {
        let cookie = ResponseCookie::new("sb-session", "abc").with_attributes(CookieAttributes {
            domain: Some("shop.example".to_string()),
            max_age: Some(3600),
            http_only: true,
            secure: true,
            ..CookieAttributes::default()
        });
        let rendered = cookie.to_header_value();
        assert!(rendered.starts_with("sb-session=abc;"), "{}", rendered);
        for attribute in [
            "; Path=/",
            "; Domain=shop.example",
            "; Max-Age=3600",
            "; HttpOnly",
            "; Secure",
            "; SameSite=Lax",
        ] {
            assert!(rendered.contains(attribute), "{} missing {}", rendered, attribute);
        }
    }

    #[test]
    fn test_removal_cookie() {
        let cookie = ResponseCookie::removal("sb-session", CookieAttributes::default());
        assert!(cookie.is_removal());

        let rendered = cookie.to_header_value();
        assert!(rendered.starts_with("sb-session=;"), "{}", rendered);
        assert!(rendered.contains("; Max-Age=0"));
        assert!(!rendered.contains("HttpOnly"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn test_same_site_none_forces_secure() {
        let cookie = ResponseCookie::new("x", "y").with_attributes(CookieAttributes {
            same_site: SameSite::None,
            ..CookieAttributes::default()
        });
        let rendered = cookie.to_header_value();
        assert!(rendered.contains("; SameSite=None"));
        assert_eq!(rendered.matches("Secure").count(), 1, "{}", rendered);
    }

    #[test]
    fn test_disposition_display() {
        assert_eq!(Disposition::Next.to_string(), "next");
        assert_eq!(Disposition::Redirect("/sq".into()).to_string(), "redirect(/sq)");
        assert_eq!(Disposition::Rewrite("/sq/shop".into()).to_string(), "rewrite(/sq/shop)");
    }
}
