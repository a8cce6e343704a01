//! Download phase of a capture task
//!
//! Fetches every asset in the task's map through a steady-state pool of at
//! most `max_concurrency` in-flight requests. Results flow back to the loop
//! that owns the task, which is the only place counters and bytes are written.

use crate::crawler::events::EventSink;
use crate::crawler::fetcher::AssetFetcher;
use crate::state::CaptureTask;
use crate::FetchFailure;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Drives asset fetches for one task
pub struct DownloadCoordinator {
    fetcher: Arc<dyn AssetFetcher>,
    max_concurrency: usize,
    max_file_size_bytes: u64,
}

impl DownloadCoordinator {
    pub fn new(fetcher: Arc<dyn AssetFetcher>, max_concurrency: usize, max_file_size_bytes: u64) -> Self {
        Self {
            fetcher,
            max_concurrency: max_concurrency.max(1),
            max_file_size_bytes,
        }
    }

    /// Downloads all pending assets of `task`
    ///
    /// Before dispatch, an asset is counted as skipped if it already holds
    /// bytes or if an earlier asset claimed the same local path. Every settled
    /// asset emits one progress event. Cancellation stops new dispatches;
    /// fetches already in flight finish but their results are discarded.
    pub async fn run(&self, task: &mut CaptureTask, events: &EventSink) {
        task.progress.total = task.assets.len() as u64;

        let mut claimed: HashSet<String> = task
            .assets
            .downloaded()
            .map(|asset| asset.local_path().to_string())
            .collect();

        let mut pending: Vec<(usize, Url)> = Vec::new();
        let mut pre_skipped = 0u64;
        for (position, asset) in task.assets.iter().enumerate() {
            if asset.is_downloaded() {
                tracing::debug!("Already resolved: {}", asset.url());
                pre_skipped += 1;
            } else if !claimed.insert(asset.local_path().to_string()) {
                tracing::debug!(
                    "Skipping {}: {} is already claimed",
                    asset.url(),
                    asset.local_path()
                );
                pre_skipped += 1;
            } else {
                pending.push((position, asset.url().clone()));
            }
        }

        for _ in 0..pre_skipped {
            task.progress.skipped += 1;
            events.progress(task.progress.snapshot());
        }

        tracing::info!(
            "Downloading {} assets with {} workers",
            pending.len(),
            self.max_concurrency
        );

        let cancel = task.cancellation_token();
        let max_bytes = self.max_file_size_bytes;
        let mut results = stream::iter(pending)
            .take_while(move |_| futures::future::ready(!cancel.is_cancelled()))
            .map(|(position, url)| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    let result = fetcher.fetch(&url, max_bytes).await;
                    (position, url, result)
                }
            })
            .buffer_unordered(self.max_concurrency);

        while let Some((position, url, result)) = results.next().await {
            if task.is_cancelled() {
                tracing::debug!("Discarding result for {} after cancellation", url);
                continue;
            }
            self.settle(task, position, &url, result);
            events.progress(task.progress.snapshot());
        }
    }

    fn settle(
        &self,
        task: &mut CaptureTask,
        position: usize,
        url: &Url,
        result: Result<Vec<u8>, FetchFailure>,
    ) {
        match result {
            Ok(bytes) => {
                let size = bytes.len() as u64;
                if let Some(asset) = task.assets.get_mut_at(position) {
                    asset.size_bytes = Some(size);
                    asset.bytes = Some(bytes);
                }
                task.progress.downloaded += 1;
                task.progress.bytes_downloaded += size;
                tracing::debug!("Downloaded {} ({} bytes)", url, size);
            }
            Err(failure) if failure.is_skip() => {
                if let (Some(asset), FetchFailure::Oversize { size, .. }) =
                    (task.assets.get_mut_at(position), &failure)
                {
                    asset.size_bytes = Some(*size);
                }
                task.progress.skipped += 1;
                tracing::info!("Skipped {}: {}", url, failure);
            }
            Err(failure) => {
                task.progress.failed += 1;
                tracing::warn!("Failed to download {}: {}", url, failure);
            }
        }
    }
}
