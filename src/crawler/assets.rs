//! Asset discovery for one materialized page
//!
//! This module scans a page for every resource it references:
//! - Linked stylesheets and `@import` rules in inline stylesheets
//! - Script sources
//! - Images (`src` with lazy-load fallbacks, `srcset`, video posters)
//! - Fonts referenced by `url(...)` in inline stylesheets
//! - Audio and video sources
//! - Background images (computed styles and inline `style` attributes)

use crate::config::CaptureSettings;
use crate::crawler::materializer::MaterializedPage;
use crate::output::asset_local_path;
use crate::state::{AssetDescriptor, AssetKind};
use crate::url::{file_extension, is_analytics_url, is_same_origin, resolve_reference};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Extensions that identify font files
const FONT_EXTENSIONS: &[&str] = &[".woff", ".woff2", ".ttf", ".otf", ".eot"];

/// Image attributes tried in order; lazy loaders keep the real source in `data-*`
const IMAGE_SOURCE_ATTRIBUTES: &[&str] = &["src", "data-src", "data-lazy-src", "data-original"];

fn css_url_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)url\(\s*["']?([^"')]+?)["']?\s*\)"#).ok())
        .as_ref()
}

fn css_import_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)@import\s+(?:url\(\s*)?["']?([^"')\s;]+)["']?"#).ok())
        .as_ref()
}

/// Extracts every `url(...)` argument from stylesheet text
pub fn extract_css_urls(css: &str) -> Vec<String> {
    let Some(re) = css_url_regex() else {
        return Vec::new();
    };
    re.captures_iter(css)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Extracts the targets of `@import` rules from stylesheet text
///
/// Both `@import "a.css"` and `@import url(a.css)` forms are recognized.
pub fn extract_css_imports(css: &str) -> Vec<String> {
    let Some(re) = css_import_regex() else {
        return Vec::new();
    };
    re.captures_iter(css)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Splits a `srcset` attribute into its candidate URLs
pub fn parse_srcset(srcset: &str) -> Vec<String> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Returns true if the URL path ends in a font file extension
pub fn is_font_url(url: &Url) -> bool {
    let ext = file_extension(url);
    FONT_EXTENSIONS.contains(&ext.as_str())
}

/// Scans pages for referenced resources
///
/// Origin checks and archive paths are computed against the task's origin
/// URL (where the seed page landed), so a resource referenced from several
/// pages always produces the same descriptor.
pub struct AssetDiscoverer<'a> {
    origin_url: &'a Url,
    settings: &'a CaptureSettings,
}

/// Per-page accumulator that keeps the first sighting of each URL
struct Collected<'a> {
    discoverer: &'a AssetDiscoverer<'a>,
    base_url: &'a Url,
    seen: HashSet<String>,
    assets: Vec<AssetDescriptor>,
}

impl<'a> Collected<'a> {
    fn add(&mut self, raw: &str, kind: AssetKind) {
        let Some(url) = resolve_reference(raw, self.base_url) else {
            return;
        };
        self.add_resolved(url, kind);
    }

    fn add_resolved(&mut self, url: Url, kind: AssetKind) {
        if !self.discoverer.should_include(&url) {
            tracing::trace!("Excluding asset {}", url);
            return;
        }
        if !self.seen.insert(url.as_str().to_string()) {
            return;
        }
        let local_path = asset_local_path(&url, kind, self.discoverer.origin_url);
        self.assets.push(AssetDescriptor::new(url, kind, local_path));
    }
}

impl<'a> AssetDiscoverer<'a> {
    pub fn new(origin_url: &'a Url, settings: &'a CaptureSettings) -> Self {
        Self { origin_url, settings }
    }

    /// Checks a resolved URL against the capture settings
    ///
    /// - `ignore_external` drops resources outside the task origin
    /// - `ignore_analytics` drops known tracking and analytics resources
    pub fn should_include(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        if self.settings.ignore_external && !is_same_origin(url, self.origin_url) {
            return false;
        }

        if self.settings.ignore_analytics && is_analytics_url(url) {
            return false;
        }

        true
    }

    /// Scans one page and returns a deduplicated list of descriptors
    ///
    /// References are resolved against the page's own URL. Descriptors are
    /// returned in discovery order: stylesheets, scripts, images, fonts,
    /// media, then background images.
    pub fn discover(&self, page: &MaterializedPage) -> Vec<AssetDescriptor> {
        let document = Html::parse_document(&page.html);
        let mut collected = Collected {
            discoverer: self,
            base_url: &page.url,
            seen: HashSet::new(),
            assets: Vec::new(),
        };

        let inline_styles = collect_inline_styles(&document);

        scan_stylesheets(&document, &inline_styles, &mut collected);
        scan_scripts(&document, &mut collected);
        scan_images(&document, &mut collected);
        scan_fonts(&inline_styles, &mut collected);
        scan_media(&document, &mut collected);
        scan_backgrounds(&document, &page.computed_background_images, &mut collected);

        tracing::debug!(
            "Discovered {} assets on {}",
            collected.assets.len(),
            page.url
        );
        collected.assets
    }
}

fn select<'d>(document: &'d Html, selector: &str) -> Vec<ElementRef<'d>> {
    match Selector::parse(selector) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn collect_inline_styles(document: &Html) -> Vec<String> {
    select(document, "style")
        .into_iter()
        .map(|style| style.text().collect::<String>())
        .collect()
}

fn scan_stylesheets(document: &Html, inline_styles: &[String], collected: &mut Collected<'_>) {
    for link in select(document, "link[href]") {
        let is_stylesheet = link
            .value()
            .attr("rel")
            .map(|rel| {
                rel.split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("stylesheet"))
            })
            .unwrap_or(false);
        if !is_stylesheet {
            continue;
        }
        if let Some(href) = link.value().attr("href") {
            collected.add(href, AssetKind::Css);
        }
    }

    for css in inline_styles {
        for import in extract_css_imports(css) {
            collected.add(&import, AssetKind::Css);
        }
    }
}

fn scan_scripts(document: &Html, collected: &mut Collected<'_>) {
    for script in select(document, "script[src]") {
        if let Some(src) = script.value().attr("src") {
            collected.add(src, AssetKind::Js);
        }
    }
}

fn scan_images(document: &Html, collected: &mut Collected<'_>) {
    for img in select(document, "img") {
        let source = IMAGE_SOURCE_ATTRIBUTES
            .iter()
            .filter_map(|attr| img.value().attr(attr))
            .find(|value| !value.trim().is_empty());
        if let Some(src) = source {
            collected.add(src, AssetKind::Image);
        }
        if let Some(srcset) = img.value().attr("srcset") {
            for candidate in parse_srcset(srcset) {
                collected.add(&candidate, AssetKind::Image);
            }
        }
    }

    for source in select(document, "picture source[srcset]") {
        if let Some(srcset) = source.value().attr("srcset") {
            for candidate in parse_srcset(srcset) {
                collected.add(&candidate, AssetKind::Image);
            }
        }
    }

    for video in select(document, "video[poster]") {
        if let Some(poster) = video.value().attr("poster") {
            collected.add(poster, AssetKind::Image);
        }
    }
}

fn scan_fonts(inline_styles: &[String], collected: &mut Collected<'_>) {
    for css in inline_styles {
        for raw in extract_css_urls(css) {
            let Some(url) = resolve_reference(&raw, collected.base_url) else {
                continue;
            };
            if is_font_url(&url) {
                collected.add_resolved(url, AssetKind::Font);
            }
        }
    }
}

fn scan_media(document: &Html, collected: &mut Collected<'_>) {
    for source in select(document, "video source[src], audio source[src], video[src], audio[src]") {
        if let Some(src) = source.value().attr("src") {
            collected.add(src, AssetKind::Media);
        }
    }
}

fn scan_backgrounds(document: &Html, computed: &[String], collected: &mut Collected<'_>) {
    for value in computed {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("none") {
            continue;
        }
        let urls = extract_css_urls(value);
        if urls.is_empty() {
            collected.add(value, AssetKind::Image);
        } else {
            for raw in urls {
                collected.add(&raw, AssetKind::Image);
            }
        }
    }

    for element in select(document, "[style]") {
        let Some(style) = element.value().attr("style") else {
            continue;
        };
        if !style.to_ascii_lowercase().contains("background") {
            continue;
        }
        for raw in extract_css_urls(style) {
            collected.add(&raw, AssetKind::Image);
        }
    }
}
