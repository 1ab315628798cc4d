//! Internationalization utilities for the gateway
//!
//! `Accept-Language` negotiation shared by the locale resolver and the
//! API locale middleware, plus task-local storage for the locale used to
//! render gateway messages.

use std::future::Future;

tokio::task_local! {
    static CURRENT_LOCALE: String;
}

/// Locale for gateway messages when none is in scope.
pub const FALLBACK_LOCALE: &str = "en";

/// Run `fut` with `locale` as the current message locale.
pub async fn with_locale<F>(locale: String, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT_LOCALE.scope(locale, fut).await
}

/// The message locale of the current task.
pub fn get_locale() -> String {
    CURRENT_LOCALE
        .try_with(|locale| locale.clone())
        .unwrap_or_else(|_| FALLBACK_LOCALE.to_string())
}

/// Parse an `Accept-Language` value into (tag, quality) pairs sorted by
/// quality, highest first. Ties keep header order; `q=0` entries are dropped.
pub fn parse_accept_language(header: &str) -> Vec<(String, f32)> {
    let mut tags: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut segments = part.trim().split(';');
            let tag = segments.next()?.trim().to_lowercase().replace('_', "-");
            if tag.is_empty() {
                return None;
            }

            let quality = segments
                .find_map(|s| s.trim().strip_prefix("q=").and_then(|q| q.trim().parse::<f32>().ok()))
                .unwrap_or(1.0)
                .clamp(0.0, 1.0);

            (quality > 0.0).then_some((tag, quality))
        })
        .collect();

    tags.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    tags
}

/// Pick the best supported locale for an `Accept-Language` value.
///
/// Each tag is tried as an exact (case-insensitive) match first, then by
/// its primary subtag (`it-CH` -> `it`). `*` matches nothing.
pub fn negotiate_from_header<'a>(header: Option<&str>, supported: &'a [String]) -> Option<&'a str> {
    let header = header?;
    for (tag, _quality) in parse_accept_language(header) {
        if let Some(found) = supported.iter().find(|code| code.eq_ignore_ascii_case(&tag)) {
            return Some(found.as_str());
        }
        if let Some(primary) = tag.split('-').next()
            && let Some(found) = supported.iter().find(|code| code.eq_ignore_ascii_case(primary))
        {
            return Some(found.as_str());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported() -> Vec<String> {
        vec!["sq".to_string(), "en".to_string(), "it".to_string()]
    }

    #[test]
    fn test_parse_accept_language_orders_by_quality() {
        let parsed = parse_accept_language("en;q=0.5, it-IT, sq;q=0.8, de;q=0");
        let tags: Vec<&str> = parsed.iter().map(|(tag, _)| tag.as_str()).collect();
        assert_eq!(tags, vec!["it-it", "sq", "en"]);
    }

    #[test]
    fn test_negotiate_from_header() {
        let supported = supported();
        assert_eq!(negotiate_from_header(Some("it-CH,en;q=0.9"), &supported), Some("it"));
        assert_eq!(negotiate_from_header(Some("de, en;q=0.1"), &supported), Some("en"));
        assert_eq!(negotiate_from_header(Some("de, fr"), &supported), None);
        assert_eq!(negotiate_from_header(Some("*"), &supported), None);
        assert_eq!(negotiate_from_header(None, &supported), None);
    }

    #[tokio::test]
    async fn test_task_local_locale() {
        assert_eq!(get_locale(), FALLBACK_LOCALE);
        let seen = with_locale("it".to_string(), async { get_locale() }).await;
        assert_eq!(seen, "it");
        assert_eq!(get_locale(), FALLBACK_LOCALE);
    }
}
