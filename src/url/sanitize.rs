use url::Url;

/// Maximum length of a sanitized filename component
const MAX_FILENAME_LEN: usize = 200;

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`
///
/// The result is truncated to 200 characters.
///
/// # Examples
///
/// ```
/// use site_archiver::url::sanitize_filename;
///
/// assert_eq!(sanitize_filename("my logo (1)"), "my_logo__1_");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_LEN)
        .collect()
}

/// Sanitizes a hostname for use as a directory name
///
/// Every non-alphanumeric character becomes `_`, so `cdn.example.com`
/// becomes `cdn_example_com`.
pub fn sanitize_host(host: &str) -> String {
    host.to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Returns the raw last path segment of a URL
fn last_segment(url: &Url) -> &str {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("")
}

/// Returns the lower-cased file extension of the URL path, including the dot
///
/// Returns an empty string when the last path segment has no alphanumeric
/// extension.
///
/// # Examples
///
/// ```
/// use site_archiver::url::file_extension;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/fonts/Inter.WOFF2?v=1").unwrap();
/// assert_eq!(file_extension(&url), ".woff2");
/// ```
pub fn file_extension(url: &Url) -> String {
    let segment = last_segment(url);
    match segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

/// Returns the last path segment of the URL without its extension
///
/// Falls back to `file` when the path ends in `/` or is empty.
pub fn file_stem(url: &Url) -> String {
    let segment = last_segment(url);
    let ext_len = file_extension(url).len();
    let stem = &segment[..segment.len() - ext_len];
    if stem.is_empty() {
        "file".to_string()
    } else {
        stem.to_string()
    }
}
