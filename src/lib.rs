//! Site-Archiver: offline capture of web pages and sites
//!
//! This crate discovers every resource a page references, optionally follows
//! same-origin links to a bounded depth, downloads everything under a
//! concurrency cap, rewrites references for offline viewing, and packages the
//! result into a single ZIP archive.

pub mod config;
pub mod crawler;
pub mod output;
pub mod service;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for capture tasks
///
/// Only seed validation and archive assembly are fatal to a task; per-page and
/// per-asset failures are absorbed into the progress counters instead.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid seed URL '{url}': {reason}")]
    InvalidSeedUrl { url: String, reason: String },

    #[error("Nothing was capturable: seed page {url} could not be materialized: {reason}")]
    SeedUnreachable { url: String, reason: String },

    #[error("Capture task was cancelled")]
    Cancelled,

    #[error("Packaging failed after capture succeeded: {0}")]
    ArchiveAssembly(String),

    #[error("Capture task aborted: {0}")]
    TaskAborted(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid ignore pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Failure of a single page or asset fetch
///
/// These never unwind a task. The orchestrator converts them into `failed` or
/// `skipped` counter increments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Response of {size} bytes exceeds limit of {limit} bytes")]
    Oversize { size: u64, limit: u64 },

    #[error("Unexpected content type: {0}")]
    ContentMismatch(String),
}

impl FetchFailure {
    /// Returns true if this failure counts as a skip rather than a failure
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Oversize { .. })
    }
}

impl From<reqwest::Error> for FetchFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchFailure::Timeout
        } else if let Some(status) = e.status() {
            FetchFailure::Status(status.as_u16())
        } else {
            FetchFailure::Network(e.to_string())
        }
    }
}

/// Result type alias for capture operations
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::CaptureSettings;
pub use crawler::{run_capture, CaptureOutcome};
pub use service::{CaptureEvent, CaptureHandle, CaptureService};
pub use state::{AssetDescriptor, AssetKind, CaptureMode, CaptureTask, PageRecord, ProgressSnapshot};
