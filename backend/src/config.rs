use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Upper bound for cookie lifetimes; browsers cap `Max-Age` at 400 days.
pub const MAX_COOKIE_AGE_SECS: u64 = 400 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub locale: LocaleConfig,
    pub routing: RoutingConfig,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Hosted auth backend (GoTrue-compatible) and session cookie settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL of the auth service; empty disables session refresh.
    pub url: String,
    pub anon_key: String,
    /// HS256 secret the auth service signs access tokens with. Without it
    /// no token is trusted: every session goes to the backend and no
    /// user id is forwarded.
    pub jwt_secret: String,
    pub cookie_name: String,
    /// Upper bound for one refresh round-trip (accepts "3s", "500ms").
    #[serde(deserialize_with = "deserialize_duration_millis")]
    pub timeout_ms: u64,
    /// Refresh once the access token expires within this window.
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub refresh_margin_secs: u64,
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub cookie_max_age_secs: u64,
    pub secure_cookies: bool,
    pub cookie_domain: Option<String>,
}

/// Whether URLs always carry the locale segment, or only for
/// non-default locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocalePrefix {
    Always,
    AsNeeded,
}

impl std::str::FromStr for LocalePrefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "as-needed" | "as_needed" => Ok(Self::AsNeeded),
            other => Err(format!("unsupported locale prefix policy: {}", other)),
        }
    }
}

/// Process-wide locale table. Built once at start, shared read-only.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    pub locales: Vec<String>,
    pub default_locale: String,
    pub prefix: LocalePrefix,
    pub cookie_name: String,
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub cookie_max_age_secs: u64,
    /// Negotiate from `Accept-Language` for unprefixed paths.
    pub detection: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Path prefixes that never enter the edge pipeline.
    pub excluded_prefixes: Vec<String>,
}

/// Page renderer the gateway proxies to.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Empty serves the built-in placeholder page.
    pub url: String,
    #[serde(deserialize_with = "deserialize_duration_millis")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Config {
    /// Load configuration with environment variable override support
    ///
    /// Loading order:
    /// 1. Load from the given path, or the first config.toml found
    /// 2. Override with environment variables (prefixed with APP_)
    /// 3. Validate the final configuration
    pub fn load(path: Option<&str>) -> Result<Self, anyhow::Error> {
        let mut config = match path.map(str::to_string).or_else(Self::find_config_file) {
            Some(config_path) => Self::from_toml(&config_path)?,
            None => {
                tracing::warn!("Configuration file not found, using defaults");
                Config::default()
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST / APP_SERVER_PORT
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,storefront_edge=debug")
    /// - APP_AUTH_URL / APP_AUTH_ANON_KEY / APP_AUTH_JWT_SECRET
    /// - APP_AUTH_TIMEOUT: refresh timeout (accepts "500ms", "3s")
    /// - APP_LOCALES: comma separated locale codes (e.g., "sq,en,it")
    /// - APP_DEFAULT_LOCALE
    /// - APP_LOCALE_PREFIX: "always" or "as-needed"
    /// - APP_UPSTREAM_URL: page renderer base URL
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Ok(url) = std::env::var("APP_AUTH_URL") {
            self.auth.url = url;
            tracing::info!("Override auth.url from env: {}", self.auth.url);
        }

        if let Ok(key) = std::env::var("APP_AUTH_ANON_KEY") {
            self.auth.anon_key = key;
            tracing::info!("Override auth.anon_key from env");
        }

        if let Ok(secret) = std::env::var("APP_AUTH_JWT_SECRET") {
            self.auth.jwt_secret = secret;
            tracing::info!("Override auth.jwt_secret from env");
        }

        if let Ok(timeout) = std::env::var("APP_AUTH_TIMEOUT") {
            match parse_duration_to_millis(&timeout) {
                Ok(val) => {
                    self.auth.timeout_ms = val;
                    tracing::info!("Override auth.timeout_ms from env: {}", val);
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_AUTH_TIMEOUT '{}': {} (keep {}ms)",
                    timeout,
                    e,
                    self.auth.timeout_ms
                ),
            }
        }

        if let Ok(locales) = std::env::var("APP_LOCALES") {
            self.locale.locales = locales
                .split(',')
                .map(|code| code.trim().to_string())
                .filter(|code| !code.is_empty())
                .collect();
            tracing::info!("Override locale.locales from env: {:?}", self.locale.locales);
        }

        if let Ok(default_locale) = std::env::var("APP_DEFAULT_LOCALE") {
            self.locale.default_locale = default_locale.trim().to_string();
            tracing::info!(
                "Override locale.default_locale from env: {}",
                self.locale.default_locale
            );
        }

        if let Ok(prefix) = std::env::var("APP_LOCALE_PREFIX") {
            match prefix.parse() {
                Ok(val) => {
                    self.locale.prefix = val;
                    tracing::info!("Override locale.prefix from env: {:?}", val);
                },
                Err(e) => tracing::warn!("Invalid APP_LOCALE_PREFIX '{}': {}", prefix, e),
            }
        }

        if let Ok(url) = std::env::var("APP_UPSTREAM_URL") {
            self.upstream.url = url;
            tracing::info!("Override upstream.url from env: {}", self.upstream.url);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        self.locale.validate()?;

        if self.auth.url.is_empty() {
            tracing::warn!("auth.url is empty: session refresh is disabled");
        } else {
            validate_http_url("auth.url", &self.auth.url)?;
            if self.auth.anon_key.is_empty() {
                tracing::warn!("auth.anon_key is empty: the auth service will reject refreshes");
            }
            if self.auth.jwt_secret.is_empty() {
                tracing::warn!(
                    "auth.jwt_secret is empty: every session is refreshed and no user id is forwarded"
                );
            }
        }
        if !is_cookie_name(&self.auth.cookie_name) {
            anyhow::bail!("auth.cookie_name '{}' is not a valid cookie name", self.auth.cookie_name);
        }
        if self.auth.timeout_ms == 0 {
            anyhow::bail!("auth.timeout_ms must be > 0");
        }
        if self.auth.cookie_max_age_secs > MAX_COOKIE_AGE_SECS {
            anyhow::bail!(
                "auth.cookie_max_age_secs must be at most {} (400d)",
                MAX_COOKIE_AGE_SECS
            );
        }

        if !self.upstream.url.is_empty() {
            validate_http_url("upstream.url", &self.upstream.url)?;
        }

        for prefix in &self.routing.excluded_prefixes {
            if !prefix.starts_with('/') {
                anyhow::bail!("routing.excluded_prefixes entry '{}' must start with '/'", prefix);
            }
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    pub fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, anyhow::Error> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

impl AuthConfig {
    pub fn enabled(&self) -> bool {
        !self.url.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn refresh_margin(&self) -> i64 {
        i64::try_from(self.refresh_margin_secs).unwrap_or(i64::MAX)
    }

    /// Session cookie `Max-Age`, clamped to [`MAX_COOKIE_AGE_SECS`].
    pub fn cookie_max_age(&self) -> i64 {
        clamp_cookie_age(self.cookie_max_age_secs)
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl LocaleConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.locales.is_empty() {
            anyhow::bail!("locale.locales cannot be empty");
        }
        for (idx, code) in self.locales.iter().enumerate() {
            if code.is_empty() || code.contains('/') {
                anyhow::bail!("locale.locales contains an invalid code '{}'", code);
            }
            if self.locales[..idx].contains(code) {
                anyhow::bail!("locale.locales contains '{}' twice", code);
            }
        }
        if !self.is_supported(&self.default_locale) {
            anyhow::bail!(
                "locale.default_locale '{}' is not one of {:?}",
                self.default_locale,
                self.locales
            );
        }
        if !is_cookie_name(&self.cookie_name) {
            anyhow::bail!("locale.cookie_name '{}' is not a valid cookie name", self.cookie_name);
        }
        if self.cookie_max_age_secs > MAX_COOKIE_AGE_SECS {
            anyhow::bail!(
                "locale.cookie_max_age_secs must be at most {} (400d)",
                MAX_COOKIE_AGE_SECS
            );
        }
        Ok(())
    }

    /// Locale cookie `Max-Age`, clamped to [`MAX_COOKIE_AGE_SECS`].
    pub fn cookie_max_age(&self) -> i64 {
        clamp_cookie_age(self.cookie_max_age_secs)
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.locales.iter().any(|locale| locale == code)
    }

    /// Canonical spelling of `code` when it matches a locale ignoring case
    /// and `_`/`-` differences.
    pub fn canonical(&self, code: &str) -> Option<&str> {
        let wanted = code.replace('_', "-");
        self.locales
            .iter()
            .find(|locale| locale.eq_ignore_ascii_case(&wanted))
            .map(String::as_str)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 3000 }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            jwt_secret: String::new(),
            cookie_name: "sb-session".to_string(),
            timeout_ms: 3_000,
            refresh_margin_secs: 60,
            cookie_max_age_secs: MAX_COOKIE_AGE_SECS,
            secure_cookies: false,
            cookie_domain: None,
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            locales: vec!["sq".to_string(), "en".to_string(), "it".to_string()],
            default_locale: "sq".to_string(),
            prefix: LocalePrefix::Always,
            cookie_name: "NEXT_LOCALE".to_string(),
            cookie_max_age_secs: 365 * 24 * 60 * 60,
            detection: true,
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: vec![
                "/api".to_string(),
                "/_next".to_string(),
                "/_vercel".to_string(),
                "/_static".to_string(),
            ],
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { url: String::new(), timeout_ms: 30_000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,storefront_edge=debug".to_string(), file: None }
    }
}

fn clamp_cookie_age(secs: u64) -> i64 {
    secs.min(MAX_COOKIE_AGE_SECS) as i64
}

fn validate_http_url(field: &str, value: &str) -> Result<(), anyhow::Error> {
    let parsed = reqwest::Url::parse(value)
        .map_err(|e| anyhow::anyhow!("{} '{}' is not a valid URL: {}", field, value, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("{} '{}' must use http or https", field, value);
    }
    Ok(())
}

// =========================
// Helpers for parsing values
// =========================

fn split_number_unit(input: &str) -> Result<(u64, String), String> {
    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    Ok((n, unit.trim().to_string()))
}

pub(crate) fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Accept plain numbers (treated as seconds)
    if let Ok(val) = input.trim().parse::<u64>() {
        return Ok(val);
    }

    let (n, unit) = split_number_unit(input)?;
    let factor: u64 = match unit.as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hour" | "hours" => 60 * 60,
        "d" | "day" | "days" => 60 * 60 * 24,
        _ => return Err(format!("unsupported unit: {}", unit)),
    };
    n.checked_mul(factor).ok_or_else(|| format!("duration too large: {}", input.trim()))
}

pub(crate) fn parse_duration_to_millis(input: &str) -> Result<u64, String> {
    // Accept plain numbers (treated as milliseconds)
    if let Ok(val) = input.trim().parse::<u64>() {
        return Ok(val);
    }

    let (n, unit) = split_number_unit(input)?;
    match unit.as_str() {
        "ms" | "millis" => Ok(n),
        _ => parse_duration_to_secs(input)?
            .checked_mul(1_000)
            .ok_or_else(|| format!("duration too large: {}", input.trim())),
    }
}

// Custom serde deserializers to support numeric or human-friendly string values
struct DurationVisitor {
    parse: fn(&str) -> Result<u64, String>,
    expecting: &'static str,
}

impl<'de> serde::de::Visitor<'de> for DurationVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.expecting)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        (self.parse)(v).map_err(E::custom)
    }
}

/// RFC 6265 cookie-name: a non-empty HTTP token.
fn is_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b))
}

fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor {
        parse: parse_duration_to_secs,
        expecting: "a number of seconds or a string like '30s', '5m', '1h', '7d'",
    })
}

fn deserialize_duration_millis<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor {
        parse: parse_duration_to_millis,
        expecting: "a number of milliseconds or a string like '500ms', '3s'",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_durations() {
        assert_eq!(parse_duration_to_secs("45"), Ok(45));
        assert_eq!(parse_duration_to_secs("5m"), Ok(300));
        assert_eq!(parse_duration_to_secs("400d"), Ok(400 * 86_400));
        assert!(parse_duration_to_secs("5x").is_err());
        assert!(parse_duration_to_secs("ms").is_err());

        assert_eq!(parse_duration_to_millis("250"), Ok(250));
        assert_eq!(parse_duration_to_millis("500ms"), Ok(500));
        assert_eq!(parse_duration_to_millis("3s"), Ok(3_000));
    }

    #[test]
    fn test_oversized_durations_rejected() {
        let huge = format!("{}d", u64::MAX / 10);
        assert!(parse_duration_to_secs(&huge).unwrap_err().contains("too large"));
        assert!(parse_duration_to_millis(&format!("{}s", u64::MAX / 10)).is_err());
        assert!(
            Config::from_toml_str(&format!("[auth]\ncookie_max_age_secs = \"{}\"\n", huge))
                .is_err()
        );
    }

    #[test]
    fn test_cookie_age_bounded() {
        let mut config = Config::default();
        config.auth.cookie_max_age_secs = u64::MAX;
        assert!(config.validate().is_err());
        assert_eq!(config.auth.cookie_max_age(), MAX_COOKIE_AGE_SECS as i64);

        config.auth.cookie_max_age_secs = 60;
        config.locale.cookie_max_age_secs = MAX_COOKIE_AGE_SECS + 1;
        assert!(config.validate().is_err());
        assert_eq!(config.locale.cookie_max_age(), MAX_COOKIE_AGE_SECS as i64);

        config.auth.refresh_margin_secs = u64::MAX;
        assert_eq!(config.auth.refresh_margin(), i64::MAX);
    }

    #[test]
    fn test_cookie_names_validated() {
        for name in ["sb-session", "NEXT_LOCALE", "__Host-sid"] {
            assert!(is_cookie_name(name), "{}", name);
        }
        for name in ["", "a b", "a;b", "a=b", "sé"] {
            assert!(!is_cookie_name(name), "{}", name);
        }

        let mut config = Config::default();
        config.auth.cookie_name = "sb session".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.locale.cookie_name = "locale;x".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_with_human_durations() {
        let config = Config::from_toml_str(
            r#"
            [auth]
            url = "https://auth.example.com"
            timeout_ms = "2s"
            refresh_margin_secs = "2m"

            [locale]
            locales = ["sq", "en", "it"]
            default_locale = "en"
            prefix = "as-needed"
            "#,
        )
        .expect("parse config");

        assert_eq!(config.auth.timeout_ms, 2_000);
        assert_eq!(config.auth.refresh_margin_secs, 120);
        assert_eq!(config.auth.cookie_name, "sb-session");
        assert_eq!(config.locale.prefix, LocalePrefix::AsNeeded);
        assert_eq!(config.locale.cookie_name, "NEXT_LOCALE");
        assert_eq!(config.server.port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_locale_validation() {
        let mut locale = LocaleConfig::default();
        assert!(locale.validate().is_ok());

        locale.default_locale = "de".to_string();
        assert!(locale.validate().is_err());

        locale.default_locale = "sq".to_string();
        locale.locales.push("sq".to_string());
        assert!(locale.validate().is_err());

        locale.locales.clear();
        assert!(locale.validate().is_err());
    }

    #[test]
    fn test_invalid_urls_rejected() {
        let mut config = Config::default();
        config.auth.url = "ftp://auth.example.com".to_string();
        assert!(config.validate().is_err());

        config.auth.url = String::new();
        config.upstream.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_canonical_locale() {
        let mut locale = LocaleConfig::default();
        locale.locales.push("pt-BR".to_string());
        assert_eq!(locale.canonical("EN"), Some("en"));
        assert_eq!(locale.canonical("pt_br"), Some("pt-BR"));
        assert_eq!(locale.canonical("de"), None);
    }

    #[test]
    fn test_prefix_from_str() {
        assert_eq!("always".parse::<LocalePrefix>(), Ok(LocalePrefix::Always));
        assert_eq!("As-Needed".parse::<LocalePrefix>(), Ok(LocalePrefix::AsNeeded));
        assert!("never".parse::<LocalePrefix>().is_err());
    }
}
