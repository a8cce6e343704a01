use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

/// Counters mutated while a task runs
///
/// Only the control flow that owns the task writes these; everyone else sees
/// copies through `ProgressSnapshot`.
#[derive(Debug, Clone)]
pub struct ProgressCounters {
    /// Number of assets scheduled for download
    pub total: u64,

    /// Assets fetched successfully
    pub downloaded: u64,

    /// Assets and pages that failed
    pub failed: u64,

    /// Assets skipped (oversize or already resolved)
    pub skipped: u64,

    /// Total bytes of successfully downloaded assets
    pub bytes_downloaded: u64,

    /// Pages captured so far
    pub pages_crawled: u64,

    /// Pages recorded in the task
    pub pages_total: u64,

    /// Wall-clock start time
    pub started_at: DateTime<Utc>,

    /// Set once the archive has been built
    pub completed: bool,

    started: Instant,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self {
            total: 0,
            downloaded: 0,
            failed: 0,
            skipped: 0,
            bytes_downloaded: 0,
            pages_crawled: 0,
            pages_total: 0,
            started_at: Utc::now(),
            completed: false,
            started: Instant::now(),
        }
    }

    /// Number of assets that reached a terminal state
    pub fn assets_settled(&self) -> u64 {
        self.downloaded + self.skipped
    }

    /// Returns an immutable view of the counters
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total,
            downloaded: self.downloaded,
            failed: self.failed,
            skipped: self.skipped,
            bytes_downloaded: self.bytes_downloaded,
            pages_crawled: self.pages_crawled,
            pages_total: self.pages_total,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            completed: self.completed,
        }
    }
}

impl Default for ProgressCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress event payload pushed to the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub total: u64,
    pub downloaded: u64,
    pub failed: u64,
    pub skipped: u64,
    pub bytes_downloaded: u64,
    pub pages_crawled: u64,
    pub pages_total: u64,
    pub elapsed_ms: u64,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_counters_are_zero() {
        let counters = ProgressCounters::new();
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.downloaded, 0);
        assert_eq!(snapshot.failed, 0);
        assert_eq!(snapshot.pages_crawled, 0);
        assert!(!snapshot.completed);
    }

    #[test]
    fn test_snapshot_copies_counters() {
        let mut counters = ProgressCounters::new();
        counters.total = 4;
        counters.downloaded = 2;
        counters.skipped = 1;
        counters.bytes_downloaded = 2048;
        counters.completed = true;

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.downloaded, 2);
        assert_eq!(snapshot.skipped, 1);
        assert_eq!(snapshot.bytes_downloaded, 2048);
        assert!(snapshot.completed);
        assert_eq!(counters.assets_settled(), 3);
    }
}
