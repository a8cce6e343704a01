//! Link discovery for the crawl phase
//!
//! Collects `<a href>` targets from a page and reduces them to the set of
//! normalized same-origin page URLs worth visiting.

use crate::url::{is_same_origin, normalize_page_url, resolve_reference, IgnoreSet};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Link targets that never lead to another page
const SKIPPED_PREFIXES: &[&str] = &["#", "javascript:", "mailto:", "tel:", "data:"];

/// Extracts crawlable links from pages
#[derive(Debug, Clone)]
pub struct LinkDiscoverer {
    origin_url: Url,
    same_domain_only: bool,
    ignore: IgnoreSet,
}

impl LinkDiscoverer {
    pub fn new(origin_url: Url, same_domain_only: bool, ignore: IgnoreSet) -> Self {
        Self {
            origin_url,
            same_domain_only,
            ignore,
        }
    }

    /// Replaces the origin that links are judged against
    pub fn set_origin(&mut self, origin_url: Url) {
        self.origin_url = origin_url;
    }

    /// Returns normalized page URLs linked from `html`
    ///
    /// # Link Extraction Rules
    ///
    /// **Include:**
    /// - `<a href="...">` resolving to HTTP(S)
    ///
    /// **Exclude:**
    /// - `#...`, `javascript:`, `mailto:`, `tel:`, `data:` targets
    /// - `<a href="..." download>`
    /// - Cross-origin targets when `same_domain_only` is set
    /// - Targets matching the ignore set
    ///
    /// Results are origin plus path, deduplicated in discovery order.
    pub fn discover(&self, html: &str, page_url: &Url) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        let Ok(a_selector) = Selector::parse("a[href]") else {
            return links;
        };

        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            let Some(href) = element.value().attr("href") else {
                continue;
            };

            if let Some(link) = self.accept(href, page_url) {
                if seen.insert(link.clone()) {
                    links.push(link);
                }
            }
        }

        links
    }

    fn accept(&self, href: &str, page_url: &Url) -> Option<String> {
        let trimmed = href.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if trimmed.is_empty() || SKIPPED_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
            return None;
        }

        let resolved = resolve_reference(trimmed, page_url)?;

        if self.same_domain_only && !is_same_origin(&resolved, &self.origin_url) {
            tracing::trace!("Skipping cross-origin link {}", resolved);
            return None;
        }

        if self.ignore.is_ignored(&resolved) {
            tracing::trace!("Skipping ignored link {}", resolved);
            return None;
        }

        Some(normalize_page_url(&resolved))
    }
}
