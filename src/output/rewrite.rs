//! Reference rewriting for offline viewing
//!
//! Replaces every reference to a downloaded asset with its archive-relative
//! path. Absolute URLs are replaced literally, longest first. Attribute
//! values and `url(...)` calls are also resolved against the document URL so
//! relative references to known assets are rewritten. Unknown references are
//! left untouched.

use crate::output::layout::root_prefix;
use crate::url::resolve_reference;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use url::Url;

const BASE_TAG: &str = r#"<base href="./">"#;

fn attribute_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)(\s(src|href|poster|data-src|data-lazy-src|data-original|srcset)\s*=\s*)(?:"([^"]*)"|'([^']*)')"#,
        )
        .ok()
    })
    .as_ref()
}

fn css_url_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^"')\s]+))\s*\)"#).ok()
    })
    .as_ref()
}

fn css_import_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)(@import\s+)(?:"([^"]*)"|'([^']*)')"#).ok())
        .as_ref()
}

fn base_tag_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<base\s").ok()).as_ref()
}

fn head_open_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<head(\s[^>]*)?>").ok()).as_ref()
}

fn html_open_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<html(\s[^>]*)?>").ok()).as_ref()
}

/// Mapping from absolute asset URL to archive-relative path
#[derive(Debug, Clone, Default)]
pub struct UrlRewriter {
    /// Sorted longest URL first
    entries: Vec<(String, String)>,
    lookup: HashMap<String, String>,
    local_paths: HashSet<String>,
}

impl UrlRewriter {
    /// Builds a rewriter; the first mapping for a URL wins
    pub fn new(url_map: &[(String, String)]) -> Self {
        let mut lookup = HashMap::with_capacity(url_map.len());
        for (url, local) in url_map {
            lookup.entry(url.clone()).or_insert_with(|| local.clone());
        }

        let mut entries: Vec<(String, String)> =
            lookup.iter().map(|(u, l)| (u.clone(), l.clone())).collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        let local_paths = lookup.values().cloned().collect();

        Self {
            entries,
            lookup,
            local_paths,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the archive path mapped to an absolute URL
    pub fn local_path(&self, url: &str) -> Option<&str> {
        self.lookup.get(url).map(String::as_str)
    }

    /// Binds the rewriter to one document
    ///
    /// `document_url` is where the document was fetched from and
    /// `document_path` is where it is stored in the archive. Rewritten paths
    /// get one `../` per directory level of `document_path`.
    pub fn for_document<'a>(&'a self, document_url: &'a Url, document_path: &str) -> DocumentRewriter<'a> {
        DocumentRewriter {
            map: self,
            base_url: document_url,
            prefix: root_prefix(document_path),
        }
    }
}

/// A rewriter bound to one document's location
#[derive(Debug, Clone)]
pub struct DocumentRewriter<'a> {
    map: &'a UrlRewriter,
    base_url: &'a Url,
    prefix: String,
}

impl<'a> DocumentRewriter<'a> {
    /// Rewrites page markup
    pub fn rewrite_html(&self, html: &str) -> String {
        let rewritten = self.rewrite_attributes(html);
        let rewritten = self.rewrite_url_calls(&rewritten, false);
        self.replace_literals(rewritten)
    }

    /// Rewrites stylesheet text, normalizing `url(...)` quoting for known URLs
    pub fn rewrite_css(&self, css: &str) -> String {
        let rewritten = self.rewrite_imports(css);
        let rewritten = self.rewrite_url_calls(&rewritten, true);
        self.replace_literals(rewritten)
    }

    fn is_local(&self, value: &str) -> bool {
        let stripped = value.strip_prefix(self.prefix.as_str()).unwrap_or(value);
        self.map.local_paths.contains(stripped)
    }

    /// Maps one raw reference to its prefixed local path, if known
    fn map_reference(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() || self.is_local(raw) {
            return None;
        }
        let resolved = resolve_reference(raw, self.base_url)?;
        let local = self.map.lookup.get(resolved.as_str())?;
        Some(format!("{}{}", self.prefix, local))
    }

    fn rewrite_srcset(&self, srcset: &str) -> Option<String> {
        let mut changed = false;
        let candidates: Vec<String> = srcset
            .split(',')
            .map(str::trim)
            .filter(|candidate| !candidate.is_empty())
            .map(|candidate| {
                let (url, descriptor) = match candidate.split_once(char::is_whitespace) {
                    Some((url, descriptor)) => (url, Some(descriptor.trim())),
                    None => (candidate, None),
                };
                let url = match self.map_reference(url) {
                    Some(local) => {
                        changed = true;
                        local
                    }
                    None => url.to_string(),
                };
                match descriptor {
                    Some(d) if !d.is_empty() => format!("{} {}", url, d),
                    _ => url,
                }
            })
            .collect();

        changed.then(|| candidates.join(", "))
    }

    fn rewrite_attributes(&self, html: &str) -> String {
        let Some(re) = attribute_regex() else {
            return html.to_string();
        };

        re.replace_all(html, |caps: &Captures<'_>| {
            let original = caps[0].to_string();
            let (value, quote) = match (caps.get(3), caps.get(4)) {
                (Some(v), _) => (v.as_str(), '"'),
                (None, Some(v)) => (v.as_str(), '\''),
                (None, None) => return original,
            };

            let replacement = if caps[2].eq_ignore_ascii_case("srcset") {
                self.rewrite_srcset(value)
            } else {
                self.map_reference(value)
            };

            match replacement {
                Some(local) => format!("{}{}{}{}", &caps[1], quote, local, quote),
                None => original,
            }
        })
        .into_owned()
    }

    /// Rewrites `url(...)` calls for known URLs
    ///
    /// With `normalize_quotes` the result is always `url("...")`; otherwise
    /// the original quoting is kept so calls inside attribute values stay
    /// well-formed.
    fn rewrite_url_calls(&self, text: &str, normalize_quotes: bool) -> String {
        let Some(re) = css_url_regex() else {
            return text.to_string();
        };

        re.replace_all(text, |caps: &Captures<'_>| {
            let (value, quote) = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(v), _, _) => (v.as_str(), "\""),
                (None, Some(v), _) => (v.as_str(), "'"),
                (None, None, Some(v)) => (v.as_str(), ""),
                (None, None, None) => return caps[0].to_string(),
            };
            let quote = if normalize_quotes { "\"" } else { quote };
            match self.map_reference(value) {
                Some(local) => format!("url({}{}{})", quote, local, quote),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
    }

    fn rewrite_imports(&self, css: &str) -> String {
        let Some(re) = css_import_regex() else {
            return css.to_string();
        };

        re.replace_all(css, |caps: &Captures<'_>| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or("");
            match self.map_reference(value) {
                Some(local) => format!("{}\"{}\"", &caps[1], local),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
    }

    /// Literal replacement of absolute URLs, longest first
    fn replace_literals(&self, mut text: String) -> String {
        for (url, local) in &self.map.entries {
            if text.contains(url.as_str()) {
                text = text.replace(url.as_str(), &format!("{}{}", self.prefix, local));
            }
        }
        text
    }
}

/// Adds `<base href="./">` to markup that has no base element
///
/// The tag goes right after `<head>`; markup without a head gets one after
/// `<html>`. Markup with neither is returned unchanged.
pub fn inject_base_tag(html: &str) -> String {
    if base_tag_regex().map_or(false, |re| re.is_match(html)) {
        return html.to_string();
    }

    if let Some(m) = head_open_regex().and_then(|re| re.find(html)) {
        return format!("{}\n    {}{}", &html[..m.end()], BASE_TAG, &html[m.end()..]);
    }

    if let Some(m) = html_open_regex().and_then(|re| re.find(html)) {
        return format!(
            "{}\n  <head>\n    {}\n  </head>{}",
            &html[..m.end()],
            BASE_TAG,
            &html[m.end()..]
        );
    }

    html.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> UrlRewriter {
        UrlRewriter::new(&[
            ("https://example.com/img/logo.png".to_string(), "images/logo.png".to_string()),
            ("https://example.com/css/site.css".to_string(), "css/site.css".to_string()),
            ("https://example.com/js/app.js".to_string(), "js/app.js".to_string()),
            ("https://example.com/js/app.js.map".to_string(), "js/app.js.map".to_string()),
            ("https://example.com/img/bg.jpg".to_string(), "images/bg.jpg".to_string()),
            (
                "https://cdn.other.com/font.woff2".to_string(),
                "external/cdn_other_com/font.woff2".to_string(),
            ),
        ])
    }

    fn seed_url() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_absolute_attribute_rewritten() {
        let map = rewriter();
        let url = seed_url();
        let out = map
            .for_document(&url, "index.html")
            .rewrite_html(r#"<img src="https://example.com/img/logo.png" alt="x">"#);
        assert_eq!(out, r#"<img src="images/logo.png" alt="x">"#);
    }

    #[test]
    fn test_relative_attribute_rewritten() {
        let map = rewriter();
        let url = Url::parse("https://example.com/blog/post").unwrap();
        let out = map
            .for_document(&url, "pages/blog/post.html")
            .rewrite_html(r#"<link rel="stylesheet" href='../css/site.css'><img data-src="/img/logo.png">"#);
        assert_eq!(
            out,
            r#"<link rel="stylesheet" href='../../css/site.css'><img data-src="../../images/logo.png">"#
        );
    }

    #[test]
    fn test_unmapped_references_untouched() {
        let map = rewriter();
        let url = seed_url();
        let html = r#"<a href="/about">About</a><img src="img/unknown.png"><a href="https://other.com/">x</a>"#;
        assert_eq!(map.for_document(&url, "index.html").rewrite_html(html), html);
    }

    #[test]
    fn test_longest_url_replaced_first() {
        let map = rewriter();
        let url = seed_url();
        let out = map.for_document(&url, "index.html").rewrite_html(
            r#"<script>load("https://example.com/js/app.js.map"); load("https://example.com/js/app.js");</script>"#,
        );
        assert_eq!(
            out,
            r#"<script>load("js/app.js.map"); load("js/app.js");</script>"#
        );
    }

    #[test]
    fn test_srcset_candidates_rewritten() {
        let map = rewriter();
        let url = seed_url();
        let out = map
            .for_document(&url, "index.html")
            .rewrite_html(r#"<img srcset="/img/logo.png 1x, /img/other.png 2x">"#);
        assert_eq!(out, r#"<img srcset="images/logo.png 1x, /img/other.png 2x">"#);
    }

    #[test]
    fn test_inline_style_url_keeps_quoting() {
        let map = rewriter();
        let url = seed_url();
        let out = map
            .for_document(&url, "index.html")
            .rewrite_html(r#"<div style="background: url(/img/bg.jpg) no-repeat"></div>"#);
        assert_eq!(
            out,
            r#"<div style="background: url(images/bg.jpg) no-repeat"></div>"#
        );
    }

    #[test]
    fn test_css_urls_relative_to_stylesheet() {
        let map = rewriter();
        let url = Url::parse("https://example.com/css/site.css").unwrap();
        let css = r#"body { background: url('../img/bg.jpg'); }
@font-face { src: url(https://cdn.other.com/font.woff2) format("woff2"); }
.x { background: url(data:image/png;base64,AAAA); }"#;
        let out = map.for_document(&url, "css/site.css").rewrite_css(css);
        assert_eq!(
            out,
            r#"body { background: url("../images/bg.jpg"); }
@font-face { src: url("../external/cdn_other_com/font.woff2") format("woff2"); }
.x { background: url(data:image/png;base64,AAAA); }"#
        );
    }

    #[test]
    fn test_css_import_rewritten() {
        let map = rewriter();
        let url = Url::parse("https://example.com/css/theme.css").unwrap();
        let out = map
            .for_document(&url, "css/theme.css")
            .rewrite_css(r#"@import 'site.css';"#);
        assert_eq!(out, r#"@import "../css/site.css";"#);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let map = rewriter();
        let url = Url::parse("https://example.com/docs/guide").unwrap();
        let doc = map.for_document(&url, "pages/docs/guide.html");
        let html = r#"<html><head><link rel="stylesheet" href="/css/site.css"></head>
<body style="background-image: url('https://example.com/img/bg.jpg')">
<img src="https://example.com/img/logo.png" srcset="/img/logo.png 2x">
<script src="/js/app.js"></script></body></html>"#;

        let once = doc.rewrite_html(html);
        let twice = doc.rewrite_html(&once);
        assert_ne!(once, html);
        assert_eq!(once, twice);

        let css_url = Url::parse("https://example.com/css/site.css").unwrap();
        let css_doc = map.for_document(&css_url, "css/site.css");
        let css = "a { background: url(/img/bg.jpg) } @import url('site.css');";
        let once = css_doc.rewrite_css(css);
        assert_eq!(css_doc.rewrite_css(&once), once);
    }

    #[test]
    fn test_first_mapping_wins() {
        let map = UrlRewriter::new(&[
            ("https://example.com/a.png".to_string(), "images/a.png".to_string()),
            ("https://example.com/a.png".to_string(), "images/other.png".to_string()),
        ]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.local_path("https://example.com/a.png"), Some("images/a.png"));
    }

    #[test]
    fn test_inject_base_tag_into_head() {
        let out = inject_base_tag("<html><head><title>x</title></head></html>");
        assert_eq!(
            out,
            "<html><head>\n    <base href=\"./\"><title>x</title></head></html>"
        );
    }

    #[test]
    fn test_inject_base_tag_skips_header_element() {
        let out = inject_base_tag("<html lang=\"en\"><body><header>x</header></body></html>");
        assert_eq!(
            out,
            "<html lang=\"en\">\n  <head>\n    <base href=\"./\">\n  </head><body><header>x</header></body></html>"
        );
    }

    #[test]
    fn test_inject_base_tag_existing_base_kept() {
        let html = r#"<html><head><base href="https://example.com/"></head></html>"#;
        assert_eq!(inject_base_tag(html), html);
        assert_eq!(inject_base_tag("plain text"), "plain text");
    }
}
