use url::Url;

/// One captured page
///
/// Created once per visited page. `html` is replaced by its rewritten form
/// before the archive is built and is fixed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// URL the page was served from, after redirects
    pub url: Url,

    /// Origin plus path, the key used for the visited set
    pub normalized_url: String,

    /// Archive-relative path of the page's markup
    pub local_path: String,

    /// Captured markup
    pub html: String,

    /// Normalized same-origin links found on the page
    pub discovered_links: Vec<String>,

    /// Link distance from the seed page
    pub depth: u32,
}

impl PageRecord {
    /// Number of directories between the archive root and this page
    ///
    /// `index.html` is at depth 0, `pages/about.html` at depth 1.
    pub fn directory_depth(&self) -> usize {
        self.local_path.matches('/').count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(local_path: &str) -> PageRecord {
        PageRecord {
            url: Url::parse("https://example.com/").unwrap(),
            normalized_url: "https://example.com/".to_string(),
            local_path: local_path.to_string(),
            html: String::new(),
            discovered_links: Vec::new(),
            depth: 0,
        }
    }

    #[test]
    fn test_directory_depth() {
        assert_eq!(record("index.html").directory_depth(), 0);
        assert_eq!(record("pages/about.html").directory_depth(), 1);
        assert_eq!(record("pages/blog/2024/post.html").directory_depth(), 3);
    }
}
