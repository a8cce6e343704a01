use serde::Deserialize;

/// Default per-asset size cap (50 MiB)
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Default number of in-flight asset fetches
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Main configuration structure loaded from a TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureSettings,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Settings for a single capture task
///
/// Every recognized option is enumerated here with its default. Settings are
/// validated once when a task starts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CaptureSettings {
    /// Assets whose response is larger than this are skipped
    pub max_file_size_bytes: u64,

    /// Maximum number of asset fetches in flight at once
    pub max_concurrency: usize,

    /// Drop resources that are not on the seed's origin
    pub ignore_external: bool,

    /// Drop resources served from known tracking/analytics hosts
    pub ignore_analytics: bool,

    /// Maximum link depth followed from the seed page
    pub max_depth: u32,

    /// Maximum number of pages captured in total
    pub max_pages: usize,

    /// Timeout applied to every individual request (seconds)
    pub request_timeout_secs: u64,

    /// Delay after a page loads before it is scanned (milliseconds)
    pub settle_delay_ms: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Additional regex patterns; matching links are never crawled
    pub extra_ignore_patterns: Vec<String>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            ignore_external: false,
            ignore_analytics: true,
            max_depth: 2,
            max_pages: 50,
            request_timeout_secs: 30,
            settle_delay_ms: 0,
            user_agent: format!("site-archiver/{}", env!("CARGO_PKG_VERSION")),
            extra_ignore_patterns: Vec::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the archive is written to when no explicit path is given
    pub archive_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            archive_dir: ".".to_string(),
        }
    }
}
