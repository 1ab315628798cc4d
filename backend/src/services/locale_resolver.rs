//! Locale Resolver
//!
//! Second pipeline stage. Maps the request path onto its canonical
//! locale-prefixed form according to the locale table: pass through,
//! redirect, or (for the unprefixed default locale under `as-needed`)
//! rewrite. Pure: no I/O, same inputs always give the same carrier.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{LocaleConfig, LocalePrefix};
use crate::models::{CookieAttributes, InboundRequest, ResponseCarrier, ResponseCookie, SameSite};
use crate::utils::negotiate_from_header;

use axum::http::header::ACCEPT_LANGUAGE;

/// First segments that look like a language tag (`xx`, `xx-YY`, `xx_Hant`).
static LOCALE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2}([-_][A-Za-z]{2,4})?$").unwrap());

#[derive(Debug, PartialEq, Eq)]
enum PathPrefix<'a> {
    /// Exactly one of the configured codes.
    Supported(&'a str),
    /// A configured code spelled differently (`EN`, `pt_br`).
    Miscased(&'a str),
    /// Shaped like a locale but not configured.
    Invalid,
    /// Ordinary first segment, or none.
    Absent,
}

/// Resolve the canonical route for `request`.
pub fn resolve(request: &InboundRequest, config: &LocaleConfig) -> ResponseCarrier {
    let path = request.path();
    let (first, rest) = split_first_segment(path);
    let default = config.default_locale.as_str();

    let (mut carrier, locale) = match classify(first, config) {
        PathPrefix::Supported(locale) => match config.prefix {
            LocalePrefix::AsNeeded if locale == default => {
                (ResponseCarrier::redirect(or_root(rest)), locale)
            },
            _ => (ResponseCarrier::pass_through(), locale),
        },
        PathPrefix::Miscased(locale) => (ResponseCarrier::redirect(localized(config, locale, rest)), locale),
        PathPrefix::Invalid => (ResponseCarrier::redirect(localized(config, default, rest)), default),
        PathPrefix::Absent => {
            let locale = negotiate(request, config);
            let carrier = match config.prefix {
                LocalePrefix::AsNeeded if locale == default => {
                    ResponseCarrier::rewrite(prefixed(locale, path))
                },
                _ => ResponseCarrier::redirect(prefixed(locale, path)),
            };
            (carrier, locale)
        },
    };

    carrier.disposition = std::mem::take(&mut carrier.disposition).with_query(request.query());

    if request.cookie(&config.cookie_name).as_deref() != Some(locale) {
        carrier.set_cookie(locale_cookie(config, locale));
    }

    tracing::debug!("Locale resolved {} -> {} ({})", path, carrier.disposition, locale);
    carrier
}

/// The locale a (post-resolution) path renders in, if it carries one.
pub fn locale_of<'a>(path: &str, config: &'a LocaleConfig) -> Option<&'a str> {
    let (first, _) = split_first_segment(path);
    config.locales.iter().find(|locale| *locale == first).map(String::as_str)
}

/// Preferred locale for an unprefixed path: cookie, then
/// `Accept-Language` (when detection is on), then the default.
fn negotiate<'a>(request: &InboundRequest, config: &'a LocaleConfig) -> &'a str {
    if let Some(cookie) = request.cookie(&config.cookie_name)
        && let Some(locale) = config.canonical(&cookie)
    {
        return locale;
    }

    if config.detection
        && let Some(locale) = negotiate_from_header(request.header(&ACCEPT_LANGUAGE), &config.locales)
    {
        return locale;
    }

    &config.default_locale
}

fn classify<'a>(segment: &str, config: &'a LocaleConfig) -> PathPrefix<'a> {
    if segment.is_empty() {
        return PathPrefix::Absent;
    }
    if let Some(locale) = config.locales.iter().find(|locale| *locale == segment) {
        return PathPrefix::Supported(locale);
    }
    if let Some(locale) = config.canonical(segment) {
        return PathPrefix::Miscased(locale);
    }
    if LOCALE_SEGMENT.is_match(segment) {
        return PathPrefix::Invalid;
    }
    PathPrefix::Absent
}

/// `/sq/shop/x` -> (`sq`, `/shop/x`); `/sq` -> (`sq`, ``); `/` -> (``, ``).
fn split_first_segment(path: &str) -> (&str, &str) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    match trimmed.find('/') {
        Some(pos) => (&trimmed[..pos], &trimmed[pos..]),
        None => (trimmed, ""),
    }
}

/// Where `rest` lives for `locale` under the configured prefix policy.
fn localized(config: &LocaleConfig, locale: &str, rest: &str) -> String {
    if config.prefix == LocalePrefix::AsNeeded && locale == config.default_locale {
        or_root(rest)
    } else {
        prefixed(locale, rest)
    }
}

fn prefixed(locale: &str, path: &str) -> String {
    if path.is_empty() || path == "/" {
        format!("/{}", locale)
    } else {
        format!("/{}{}", locale, path)
    }
}

/// `rest` as a same-site path; never protocol-relative.
fn or_root(rest: &str) -> String {
    format!("/{}", rest.trim_start_matches(['/', '\\']))
}

fn locale_cookie(config: &LocaleConfig, locale: &str) -> ResponseCookie {
    ResponseCookie::new(&config.cookie_name, locale).with_attributes(CookieAttributes {
        max_age: Some(config.cookie_max_age()),
        same_site: SameSite::Lax,
        ..CookieAttributes::default()
    })
}
