use url::Url;

/// Returns true if both URLs share scheme, host, and port
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_archiver::url::is_same_origin;
///
/// let a = Url::parse("https://example.com/a").unwrap();
/// let b = Url::parse("https://example.com:443/b?q=1").unwrap();
/// let c = Url::parse("http://example.com/a").unwrap();
/// assert!(is_same_origin(&a, &b));
/// assert!(!is_same_origin(&a, &c));
/// ```
pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
