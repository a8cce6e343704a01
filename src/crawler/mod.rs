//! Crawler module for capturing pages and their resources
//!
//! This module contains the core capture logic, including:
//! - Page materialization and asset/link discovery
//! - Depth-first crawling with an explicit frontier
//! - Concurrent asset downloads with size limits
//! - Overall capture coordination and progress events

pub mod assets;
mod coordinator;
mod downloader;
pub mod events;
mod fetcher;
mod frontier;
pub mod links;
mod materializer;

pub use assets::AssetDiscoverer;
pub use coordinator::{run_capture, CaptureOutcome, Coordinator};
pub use downloader::DownloadCoordinator;
pub use events::{CaptureEvent, EventSink};
pub use fetcher::{build_http_client, AssetFetcher, HttpFetcher, MAX_REDIRECTS};
pub use frontier::CrawlFrontier;
pub use links::LinkDiscoverer;
pub use materializer::{is_html_content_type, HttpMaterializer, MaterializedPage, PageMaterializer};

use crate::config::CaptureSettings;
use crate::state::{CaptureMode, CaptureTask};
use crate::CaptureError;
use std::sync::Arc;
use std::time::Duration;

/// Builds the default HTTP collaborators for a set of settings
///
/// Both share one client, so connection pooling spans pages and assets.
pub fn http_collaborators(
    settings: &CaptureSettings,
) -> Result<(HttpMaterializer, Arc<HttpFetcher>), CaptureError> {
    let client = build_http_client(settings)?;
    let materializer = HttpMaterializer::new(
        client.clone(),
        Duration::from_millis(settings.settle_delay_ms),
    );
    Ok((materializer, Arc::new(HttpFetcher::new(client))))
}

/// Runs a complete capture over HTTP
///
/// This is the simplest entry point. It will:
/// 1. Validate the seed URL and settings
/// 2. Build the HTTP client
/// 3. Crawl pages and download assets
/// 4. Rewrite references and build the archive
///
/// # Arguments
///
/// * `seed_url` - The page to start from
/// * `mode` - What to collect
/// * `settings` - Capture settings
///
/// # Returns
///
/// * `Ok(CaptureOutcome)` - Capture completed and the archive was built
/// * `Err(CaptureError)` - Capture was rejected or failed
pub async fn capture(
    seed_url: &str,
    mode: CaptureMode,
    settings: CaptureSettings,
) -> Result<CaptureOutcome, CaptureError> {
    let mut task = CaptureTask::new(seed_url, mode, settings)?;
    let (materializer, fetcher) = http_collaborators(task.settings())?;
    run_capture(&mut task, &materializer, fetcher, &EventSink::disabled()).await
}
