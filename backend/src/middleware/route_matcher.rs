use crate::config::RoutingConfig;

/// Decides which paths go through the edge pipeline.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    excluded_prefixes: Vec<String>,
}

impl RouteMatcher {
    pub fn new(excluded_prefixes: Vec<String>) -> Self {
        let excluded_prefixes = excluded_prefixes
            .into_iter()
            .map(|prefix| prefix.trim_end_matches('/').to_string())
            .filter(|prefix| !prefix.is_empty())
            .collect();
        Self { excluded_prefixes }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.excluded_prefixes.clone())
    }

    /// False for excluded prefixes (whole segments only) and for paths
    /// whose last segment looks like a file name.
    pub fn matches(&self, path: &str) -> bool {
        if self.excluded_prefixes.iter().any(|prefix| under_prefix(path, prefix)) {
            return false;
        }

        let last_segment = path.rsplit('/').next().unwrap_or_default();
        !last_segment.contains('.')
    }
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> RouteMatcher {
        RouteMatcher::from_config(&RoutingConfig::default())
    }

    #[test]
    fn test_pages_are_matched() {
        let matcher = matcher();
        for path in ["/", "/sq", "/en/shop", "/stores/tirana", "/apiary", "/sq/blog/"] {
            assert!(matcher.matches(path), "{} should be matched", path);
        }
    }

    #[test]
    fn test_excluded_prefixes() {
        let matcher = matcher();
        for path in ["/api", "/api/health", "/_next/static/chunk", "/_vercel/insights"] {
            assert!(!matcher.matches(path), "{} should be excluded", path);
        }
    }

    #[test]
    fn test_files_are_excluded() {
        let matcher = matcher();
        for path in ["/favicon.ico", "/images/logo.svg", "/sq/robots.txt"] {
            assert!(!matcher.matches(path), "{} should be excluded", path);
        }
    }

    #[test]
    fn test_trailing_slash_in_config_is_ignored() {
        let matcher = RouteMatcher::new(vec!["/admin/".to_string(), "/".to_string()]);
        assert!(!matcher.matches("/admin/agents"));
        assert!(matcher.matches("/sq/shop"));
    }
}
