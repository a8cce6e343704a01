use crate::config::{self, CaptureSettings};
use crate::state::{AssetMap, PageRecord, ProgressCounters};
use crate::url::parse_seed_url;
use crate::CaptureError;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

/// Identifier of a capture task
pub type TaskId = Uuid;

/// What a capture task collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureMode {
    /// Seed page, linked same-origin pages, and all of their assets
    Full,
    /// Seed page and its assets; links are never followed
    PageOnly,
    /// Assets of the seed page without its markup
    AssetsOnly,
}

impl CaptureMode {
    /// Returns true if discovered links are followed
    pub fn follows_links(&self) -> bool {
        matches!(self, Self::Full)
    }

    /// Returns true if page markup is written to the archive
    pub fn includes_pages(&self) -> bool {
        !matches!(self, Self::AssetsOnly)
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Full => "full",
            Self::PageOnly => "page-only",
            Self::AssetsOnly => "assets-only",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "page-only" | "page" => Ok(Self::PageOnly),
            "assets-only" | "assets" => Ok(Self::AssetsOnly),
            other => Err(format!(
                "unknown capture mode '{}', expected full, page-only, or assets-only",
                other
            )),
        }
    }
}

/// All mutable state of one capture
///
/// The task is owned by the control flow driving it. The crawl phase writes
/// `visited`, `pages`, and `assets`; the download phase writes asset bytes and
/// the download counters. The two phases never overlap.
#[derive(Debug)]
pub struct CaptureTask {
    id: TaskId,
    seed_url: Url,
    origin_url: Option<Url>,
    mode: CaptureMode,
    settings: CaptureSettings,
    visited: HashSet<String>,
    pub(crate) assets: AssetMap,
    pub(crate) pages: Vec<PageRecord>,
    pub(crate) progress: ProgressCounters,
    cancel: CancellationToken,
}

impl CaptureTask {
    /// Creates a task after validating the seed URL and settings
    ///
    /// # Returns
    ///
    /// * `Ok(CaptureTask)` - Task ready to run
    /// * `Err(CaptureError::InvalidSeedUrl)` - Seed is malformed or not HTTP(S)
    /// * `Err(CaptureError::Config)` - Settings failed validation
    pub fn new(
        seed_url: &str,
        mode: CaptureMode,
        settings: CaptureSettings,
    ) -> Result<Self, CaptureError> {
        let seed_url = parse_seed_url(seed_url).map_err(|e| CaptureError::InvalidSeedUrl {
            url: seed_url.to_string(),
            reason: e.to_string(),
        })?;
        config::validate(&settings)?;

        Ok(Self {
            id: Uuid::new_v4(),
            seed_url,
            origin_url: None,
            mode,
            settings,
            visited: HashSet::new(),
            assets: AssetMap::new(),
            pages: Vec::new(),
            progress: ProgressCounters::new(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn seed_url(&self) -> &Url {
        &self.seed_url
    }

    /// URL that origin checks and asset paths are judged against
    ///
    /// This is the seed's final URL once the seed page has materialized,
    /// and the requested seed URL before that.
    pub fn origin_url(&self) -> &Url {
        self.origin_url.as_ref().unwrap_or(&self.seed_url)
    }

    /// Adopts the URL the seed page was actually served from
    pub(crate) fn set_origin_url(&mut self, url: Url) {
        self.origin_url = Some(url);
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn assets(&self) -> &AssetMap {
        &self.assets
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    /// Looks up a captured page by its normalized URL
    pub fn page(&self, normalized_url: &str) -> Option<&PageRecord> {
        self.pages
            .iter()
            .find(|page| page.normalized_url == normalized_url)
    }

    pub fn progress(&self) -> &ProgressCounters {
        &self.progress
    }

    pub fn has_visited(&self, normalized_url: &str) -> bool {
        self.visited.contains(normalized_url)
    }

    /// Marks a page URL visited; returns false if it already was
    pub(crate) fn mark_visited(&mut self, normalized_url: &str) -> bool {
        self.visited.insert(normalized_url.to_string())
    }

    /// Records a captured page
    pub(crate) fn record_page(&mut self, page: PageRecord) {
        self.pages.push(page);
        self.progress.pages_crawled += 1;
        self.progress.pages_total = self.pages.len() as u64;
    }

    /// Returns a token that cancels this task when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Requests cooperative cancellation; never reverts
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
