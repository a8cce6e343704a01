use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Hosts and paths of tracking/analytics resources dropped when
/// `ignore_analytics` is set
///
/// Entries are matched as substrings of `host + path`, so both host entries
/// (`doubleclick.net`) and path entries (`facebook.com/tr`, `gtag.js`) apply.
pub const ANALYTICS_DENYLIST: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "facebook.com/tr",
    "connect.facebook.net",
    "doubleclick.net",
    "adservice.google",
    "hotjar.com",
    "segment.com",
    "analytics.js",
    "gtag.js",
];

/// Link patterns that never lead to a capturable page
const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    r"(?i)\.(pdf|zip|doc|docx|xls|xlsx|jpg|jpeg|png|gif|svg|css|js)$",
    r"(?i)/api/",
    r"(?i)/admin/",
    r"(?i)/login",
    r"(?i)/logout",
];

/// Returns true if the URL points at a known analytics or tracking resource
///
/// # Examples
///
/// ```
/// use site_archiver::url::is_analytics_url;
/// use url::Url;
///
/// let url = Url::parse("https://www.googletagmanager.com/gtm.js?id=X").unwrap();
/// assert!(is_analytics_url(&url));
/// ```
pub fn is_analytics_url(url: &Url) -> bool {
    let host = url.host_str().unwrap_or("").to_ascii_lowercase();
    let target = format!("{}{}", host, url.path().to_ascii_lowercase());
    ANALYTICS_DENYLIST
        .iter()
        .any(|entry| target.contains(entry))
}

/// Compiled set of link ignore patterns
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    patterns: Vec<Regex>,
}

impl IgnoreSet {
    /// Builds the default ignore set plus any extra patterns
    ///
    /// # Returns
    ///
    /// * `Ok(IgnoreSet)` - All patterns compiled
    /// * `Err(ConfigError::InvalidPattern)` - An extra pattern is not a valid regex
    pub fn new(extra_patterns: &[String]) -> Result<Self, ConfigError> {
        let mut patterns = Vec::with_capacity(DEFAULT_IGNORE_PATTERNS.len() + extra_patterns.len());

        for pattern in DEFAULT_IGNORE_PATTERNS {
            let regex = Regex::new(pattern)
                .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
            patterns.push(regex);
        }

        for pattern in extra_patterns {
            let regex = Regex::new(pattern)
                .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
            patterns.push(regex);
        }

        Ok(Self { patterns })
    }

    /// Returns true if the link's path matches any ignore pattern
    ///
    /// Scheme, host and query never take part in the match, so a host such as
    /// `login.example.com` does not trip the `/login` pattern.
    pub fn is_ignored(&self, url: &Url) -> bool {
        let path = url.path();
        self.patterns.iter().any(|pattern| pattern.is_match(path))
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_IGNORE_PATTERNS
                .iter()
                .filter_map(|pattern| Regex::new(pattern).ok())
                .collect(),
        }
    }
}
