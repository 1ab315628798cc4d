//! Merger
//!
//! Reconciles the two stage carriers into the one response the client
//! gets. The locale carrier decides routing; session cookies are copied
//! over it and win on name collisions.

use crate::models::ResponseCarrier;

/// Merge the stage outputs.
///
/// Precedence when a stage produced nothing: locale result, then session
/// result, then an empty pass-through.
pub fn merge(session: Option<ResponseCarrier>, locale: Option<ResponseCarrier>) -> ResponseCarrier {
    match (session, locale) {
        (Some(session), Some(mut merged)) => {
            for cookie in session.cookies() {
                merged.set_cookie(cookie.clone());
            }
            merged
        },
        (None, Some(locale)) => locale,
        (Some(session), None) => session,
        (None, None) => ResponseCarrier::pass_through(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Disposition, ResponseCookie};

    fn value<'a>(carrier: &'a ResponseCarrier, name: &str) -> Option<&'a str> {
        carrier.cookie(name).map(|cookie| cookie.value.as_str())
    }

    #[test]
    fn test_session_cookie_wins_on_collision() {
        let session =
            ResponseCarrier::pass_through().with_cookie(ResponseCookie::new("sb-session", "abc"));
        let locale = ResponseCarrier::pass_through()
            .with_cookie(ResponseCookie::new("sb-session", "old"))
            .with_cookie(ResponseCookie::new("NEXT_LOCALE", "it"));

        let merged = merge(Some(session), Some(locale));
        assert_eq!(value(&merged, "sb-session"), Some("abc"));
        assert_eq!(value(&merged, "NEXT_LOCALE"), Some("it"));
        assert_eq!(merged.cookies().len(), 2);
    }

    #[test]
    fn test_locale_disposition_is_authoritative() {
        let session = ResponseCarrier::pass_through().with_cookie(ResponseCookie::new("sb-session", "abc"));
        let locale = ResponseCarrier::redirect("/sq/shop");

        let merged = merge(Some(session), Some(locale));
        assert_eq!(merged.disposition, Disposition::Redirect("/sq/shop".to_string()));
        assert_eq!(value(&merged, "sb-session"), Some("abc"));
    }

    #[test]
    fn test_fallback_precedence() {
        let session = ResponseCarrier::pass_through().with_cookie(ResponseCookie::new("sb-session", "abc"));
        let locale = ResponseCarrier::rewrite("/sq");

        assert_eq!(merge(None, Some(locale.clone())), locale);
        assert_eq!(merge(Some(session.clone()), None), session);
        assert_eq!(merge(None, None), ResponseCarrier::pass_through());
    }

    #[test]
    fn test_empty_session_leaves_locale_untouched() {
        let locale = ResponseCarrier::redirect("/it/blog").with_cookie(ResponseCookie::new("NEXT_LOCALE", "it"));
        assert_eq!(merge(Some(ResponseCarrier::pass_through()), Some(locale.clone())), locale);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let session = ResponseCarrier::pass_through().with_cookie(ResponseCookie::new("sb-session", "abc"));
        let locale = ResponseCarrier::redirect("/sq")
            .with_cookie(ResponseCookie::new("NEXT_LOCALE", "sq"))
            .with_cookie(ResponseCookie::new("sb-session", "old"));

        let once = merge(Some(session.clone()), Some(locale.clone()));
        let twice = merge(Some(session.clone()), Some(merge(Some(session), Some(locale))));
        assert_eq!(once, twice);
        assert_eq!(twice.cookie_names(), vec!["NEXT_LOCALE", "sb-session"]);
    }
}
