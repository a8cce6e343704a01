//! Capture coordinator - main orchestration logic
//!
//! This module sequences the phases of one capture task:
//! - Crawling pages and discovering assets
//! - Downloading assets under the concurrency cap
//! - Rewriting references in stylesheets and pages
//! - Assembling the archive
//! - Reporting the terminal event

use crate::crawler::downloader::DownloadCoordinator;
use crate::crawler::events::{CaptureEvent, EventSink};
use crate::crawler::fetcher::AssetFetcher;
use crate::crawler::frontier::CrawlFrontier;
use crate::crawler::materializer::PageMaterializer;
use crate::output::{build_archive, UrlRewriter};
use crate::state::{AssetKind, CaptureTask, ProgressSnapshot};
use crate::CaptureError;
use std::sync::Arc;

/// Result of a completed capture
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    /// The finished ZIP archive
    pub archive: Vec<u8>,

    /// Final counters, with `completed` set
    pub progress: ProgressSnapshot,

    /// Number of pages captured
    pub pages: usize,

    /// Number of distinct assets discovered
    pub assets: usize,
}

/// Main capture coordinator structure
pub struct Coordinator<'a> {
    materializer: &'a dyn PageMaterializer,
    fetcher: Arc<dyn AssetFetcher>,
}

impl<'a> Coordinator<'a> {
    pub fn new(materializer: &'a dyn PageMaterializer, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self {
            materializer,
            fetcher,
        }
    }

    /// Runs every phase of `task` and emits exactly one terminal event
    ///
    /// # Returns
    ///
    /// * `Ok(CaptureOutcome)` - Archive built; `Completed` was emitted
    /// * `Err(CaptureError::Cancelled)` - No archive; `Cancelled` was emitted
    /// * `Err(_)` - Terminal failure; `Failed` was emitted
    pub async fn run(&self, task: &mut CaptureTask, events: &EventSink) -> Result<CaptureOutcome, CaptureError> {
        tracing::info!(
            "Starting {} capture {} of {}",
            task.mode(),
            task.id(),
            task.seed_url()
        );

        let result = self.execute(task, events).await;
        let snapshot = task.progress().snapshot();

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    "Capture {} completed: {} pages, {} of {} assets downloaded",
                    task.id(),
                    outcome.pages,
                    outcome.progress.downloaded,
                    outcome.assets
                );
                events.send(CaptureEvent::Completed(outcome.progress));
            }
            Err(CaptureError::Cancelled) => {
                tracing::info!("Capture {} cancelled", task.id());
                events.send(CaptureEvent::Cancelled(snapshot));
            }
            Err(e) => {
                tracing::error!("Capture {} failed: {}", task.id(), e);
                events.send(CaptureEvent::Failed {
                    message: e.to_string(),
                    snapshot,
                });
            }
        }

        result
    }

    async fn execute(&self, task: &mut CaptureTask, events: &EventSink) -> Result<CaptureOutcome, CaptureError> {
        let mut frontier = CrawlFrontier::new(task, self.materializer)?;
        frontier.run(task, events).await?;
        if task.is_cancelled() {
            return Err(CaptureError::Cancelled);
        }

        let settings = task.settings();
        let downloader = DownloadCoordinator::new(
            Arc::clone(&self.fetcher),
            settings.max_concurrency,
            settings.max_file_size_bytes,
        );
        downloader.run(task, events).await;
        if task.is_cancelled() {
            return Err(CaptureError::Cancelled);
        }

        rewrite_documents(task);

        let archive = build_archive(&task.pages, &task.assets, task.mode().includes_pages())?;

        task.progress.completed = true;
        let progress = task.progress.snapshot();
        events.progress(progress);

        Ok(CaptureOutcome {
            archive,
            progress,
            pages: task.pages.len(),
            assets: task.assets.len(),
        })
    }
}

/// Rewrites downloaded stylesheets and captured pages in place
fn rewrite_documents(task: &mut CaptureTask) {
    let rewriter = UrlRewriter::new(&task.assets.url_map());
    if rewriter.is_empty() {
        return;
    }

    for position in 0..task.assets.len() {
        let Some(asset) = task.assets.get_mut_at(position) else {
            continue;
        };
        let rewritten = match (asset.kind(), &asset.bytes) {
            (AssetKind::Css, Some(bytes)) => std::str::from_utf8(bytes).ok().map(|css| {
                rewriter
                    .for_document(asset.url(), asset.local_path())
                    .rewrite_css(css)
            }),
            _ => None,
        };
        if let Some(css) = rewritten {
            asset.bytes = Some(css.into_bytes());
        }
    }

    for page in task.pages.iter_mut() {
        let html = rewriter
            .for_document(&page.url, &page.local_path)
            .rewrite_html(&page.html);
        page.html = html;
    }
}

/// Runs one capture task to completion
///
/// # Arguments
///
/// * `task` - The task to run; it holds all state afterwards
/// * `materializer` - Loads pages for scanning
/// * `fetcher` - Fetches asset bytes
/// * `events` - Receives progress and the terminal event
pub async fn run_capture(
    task: &mut CaptureTask,
    materializer: &dyn PageMaterializer,
    fetcher: Arc<dyn AssetFetcher>,
    events: &EventSink,
) -> Result<CaptureOutcome, CaptureError> {
    Coordinator::new(materializer, fetcher).run(task, events).await
}
