use crate::UrlError;
use url::Url;

/// Schemes that never refer to a fetchable resource
const PSEUDO_SCHEMES: &[&str] = &["data:", "blob:", "javascript:"];

/// Parses and validates a seed URL
///
/// The seed must be an absolute HTTP(S) URL with a host.
///
/// # Examples
///
/// ```
/// use site_archiver::url::parse_seed_url;
///
/// let url = parse_seed_url("https://example.com/docs").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
/// assert!(parse_seed_url("ftp://example.com/").is_err());
/// ```
pub fn parse_seed_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Resolves a raw reference found in a document against the page URL
///
/// Returns None if the reference should be excluded:
/// - empty references
/// - `data:`, `blob:` and `javascript:` pseudo URLs
/// - references that fail to resolve
/// - non-HTTP(S) URLs after resolution
///
/// The fragment is stripped from the result, so `a.png` and `a.png#x`
/// resolve to the same absolute URL.
pub fn resolve_reference(raw: &str, base_url: &Url) -> Option<Url> {
    let raw = raw.trim();

    if raw.is_empty() {
        return None;
    }

    let lowered = raw.to_ascii_lowercase();
    if PSEUDO_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return None;
    }

    let mut resolved = base_url.join(raw).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved)
}

/// Normalizes a page URL to origin plus path
///
/// Query strings and fragments are dropped; this is the key used for the
/// visited set and the page map.
///
/// # Examples
///
/// ```
/// use site_archiver::url::normalize_page_url;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/about?tab=2#team").unwrap();
/// assert_eq!(normalize_page_url(&url), "https://example.com/about");
/// ```
pub fn normalize_page_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_query(None);
    normalized.set_fragment(None);
    normalized.to_string()
}
