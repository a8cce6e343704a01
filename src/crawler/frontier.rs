//! Crawl phase of a capture task
//!
//! Pages are visited depth-first in link-discovery order using an explicit
//! work stack, so traversal depth never grows the call stack.

use crate::crawler::assets::AssetDiscoverer;
use crate::crawler::events::{CaptureEvent, EventSink};
use crate::crawler::links::LinkDiscoverer;
use crate::crawler::materializer::PageMaterializer;
use crate::output::page_local_path;
use crate::state::{CaptureTask, PageRecord};
use crate::url::{normalize_page_url, IgnoreSet};
use crate::CaptureError;
use url::Url;

/// A page waiting to be visited
#[derive(Debug, Clone, PartialEq, Eq)]
struct FrontierEntry {
    url: Url,
    depth: u32,
}

/// Discovered-but-not-yet-visited pages of one task
pub struct CrawlFrontier<'a> {
    materializer: &'a dyn PageMaterializer,
    links: Option<LinkDiscoverer>,
    stack: Vec<FrontierEntry>,
}

impl<'a> CrawlFrontier<'a> {
    /// Creates a frontier seeded with the task's start URL at depth 0
    ///
    /// A link discoverer is only built for modes that follow links.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlFrontier)` - Frontier ready to run
    /// * `Err(CaptureError::Config)` - An extra ignore pattern failed to compile
    pub fn new(task: &CaptureTask, materializer: &'a dyn PageMaterializer) -> Result<Self, CaptureError> {
        let links = if task.mode().follows_links() {
            let ignore = IgnoreSet::new(&task.settings().extra_ignore_patterns)?;
            Some(LinkDiscoverer::new(task.origin_url().clone(), true, ignore))
        } else {
            None
        };

        Ok(Self {
            materializer,
            links,
            stack: vec![FrontierEntry {
                url: task.seed_url().clone(),
                depth: 0,
            }],
        })
    }

    /// Visits pages until the stack drains, the page cap is hit, or the task
    /// is cancelled
    ///
    /// Failure to materialize the seed page is fatal; failures on other pages
    /// increment `failed` and the crawl continues with the next entry.
    pub async fn run(&mut self, task: &mut CaptureTask, events: &EventSink) -> Result<(), CaptureError> {
        let seed_key = normalize_page_url(task.seed_url());
        let max_pages = task.settings().max_pages;
        let max_depth = task.settings().max_depth;

        while let Some(entry) = self.stack.pop() {
            if task.is_cancelled() {
                tracing::info!("Crawl cancelled with {} pages pending", self.stack.len() + 1);
                break;
            }

            if task.pages().len() >= max_pages {
                tracing::info!("Page limit of {} reached", max_pages);
                break;
            }

            let normalized = normalize_page_url(&entry.url);
            if !task.mark_visited(&normalized) {
                continue;
            }

            let is_seed = normalized == seed_key;
            tracing::debug!("Visiting {} at depth {}", entry.url, entry.depth);

            let page = match self.materializer.materialize(&entry.url).await {
                Ok(page) => page,
                Err(failure) if is_seed => {
                    return Err(CaptureError::SeedUnreachable {
                        url: entry.url.to_string(),
                        reason: failure.to_string(),
                    });
                }
                Err(failure) => {
                    tracing::warn!("Failed to materialize {}: {}", entry.url, failure);
                    task.progress.failed += 1;
                    events.progress(task.progress.snapshot());
                    continue;
                }
            };

            if task.is_cancelled() {
                break;
            }

            if is_seed {
                self.adopt_origin(task, &page.url);
            }

            let assets = AssetDiscoverer::new(task.origin_url(), task.settings()).discover(&page);
            let added = task.assets.merge(assets);

            let discovered_links = match &self.links {
                Some(links) => links.discover(&page.html, &page.url),
                None => Vec::new(),
            };

            let local_path = page_local_path(&entry.url, is_seed);
            tracing::info!(
                "Captured {} -> {} ({} new assets, {} links)",
                entry.url,
                local_path,
                added,
                discovered_links.len()
            );

            if entry.depth < max_depth {
                self.push_children(task, &discovered_links, entry.depth + 1);
            }

            events.send(CaptureEvent::PageCaptured {
                url: entry.url.to_string(),
                local_path: local_path.clone(),
            });

            task.record_page(PageRecord {
                url: page.url,
                normalized_url: normalized,
                local_path,
                html: page.html,
                discovered_links,
                depth: entry.depth,
            });
            events.progress(task.progress.snapshot());
        }

        Ok(())
    }

    /// Judges origin against the URL the seed was served from
    ///
    /// A redirected seed would otherwise make every link and asset on the
    /// landing page look cross-origin.
    fn adopt_origin(&mut self, task: &mut CaptureTask, landed: &Url) {
        if landed == task.origin_url() {
            return;
        }

        tracing::info!("Seed {} was served from {}", task.seed_url(), landed);
        task.mark_visited(&normalize_page_url(landed));
        task.set_origin_url(landed.clone());
        if let Some(links) = self.links.as_mut() {
            links.set_origin(landed.clone());
        }
    }

    /// Pushes children in reverse so they pop in discovery order
    fn push_children(&mut self, task: &CaptureTask, links: &[String], depth: u32) {
        for link in links.iter().rev() {
            if task.has_visited(link) {
                continue;
            }
            match Url::parse(link) {
                Ok(url) => self.stack.push(FrontierEntry { url, depth }),
                Err(e) => tracing::trace!("Dropping unparsable link {}: {}", link, e),
            }
        }
    }
}
