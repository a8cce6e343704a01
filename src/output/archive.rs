//! ZIP archive assembly
//!
//! Pages are written first, then every downloaded asset. A path is written at
//! most once; assets that failed or were skipped are simply absent.

use crate::state::{AssetMap, CaptureMode, PageRecord};
use crate::url::sanitize_host;
use crate::CaptureError;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use url::Url;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Deflate level used for every entry
pub const COMPRESSION_LEVEL: i64 = 6;

fn assembly_error(context: &str, e: impl std::fmt::Display) -> CaptureError {
    CaptureError::ArchiveAssembly(format!("{}: {}", context, e))
}

/// Incremental in-memory archive writer
pub struct ArchiveBuilder {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    written: HashSet<String>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL))
            .unix_permissions(0o644);

        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options,
            written: HashSet::new(),
        }
    }

    /// Adds a file unless its path was already written
    ///
    /// Returns `Ok(false)` for a duplicate path.
    pub fn add_file(&mut self, path: &str, contents: &[u8]) -> Result<bool, CaptureError> {
        if !self.written.insert(path.to_string()) {
            tracing::debug!("Archive already contains {}", path);
            return Ok(false);
        }

        self.zip
            .start_file(path, self.options)
            .map_err(|e| assembly_error(&format!("start {}", path), e))?;
        self.zip
            .write_all(contents)
            .map_err(|e| assembly_error(&format!("write {}", path), e))?;
        Ok(true)
    }

    /// Number of files written so far
    pub fn len(&self) -> usize {
        self.written.len()
    }

    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }

    /// Finalizes the archive and returns its bytes
    pub fn finish(self) -> Result<Vec<u8>, CaptureError> {
        let cursor = self
            .zip
            .finish()
            .map_err(|e| assembly_error("finish archive", e))?;
        Ok(cursor.into_inner())
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Packages captured pages and downloaded assets into one archive
///
/// # Arguments
///
/// * `pages` - Captured pages with rewritten markup
/// * `assets` - The task's asset map; only downloaded entries are written
/// * `include_pages` - Whether page markup goes into the archive
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - The finished archive
/// * `Err(CaptureError::ArchiveAssembly)` - Compression or write failure
pub fn build_archive(
    pages: &[PageRecord],
    assets: &AssetMap,
    include_pages: bool,
) -> Result<Vec<u8>, CaptureError> {
    let mut builder = ArchiveBuilder::new();

    if include_pages {
        for page in pages {
            builder.add_file(&page.local_path, page.html.as_bytes())?;
        }
    }

    for asset in assets.downloaded() {
        if let Some(bytes) = &asset.bytes {
            builder.add_file(asset.local_path(), bytes)?;
        }
    }

    let files = builder.len();
    let archive = builder.finish()?;
    tracing::info!("Built archive with {} files ({} bytes)", files, archive.len());
    Ok(archive)
}

/// Suggested file name for a task's archive
///
/// `<host>_<YYYY-MM-DD>.zip`, with `_full` inserted before the date for full
/// crawls.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use site_archiver::output::suggested_archive_name;
/// use site_archiver::CaptureMode;
/// use url::Url;
///
/// let seed = Url::parse("https://www.example.com/docs").unwrap();
/// let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// assert_eq!(
///     suggested_archive_name(&seed, CaptureMode::Full, date),
///     "www_example_com_full_2024-03-09.zip"
/// );
/// ```
pub fn suggested_archive_name(seed: &Url, mode: CaptureMode, date: NaiveDate) -> String {
    let host = sanitize_host(seed.host_str().unwrap_or("site"));
    let date = date.format("%Y-%m-%d");
    match mode {
        CaptureMode::Full => format!("{}_full_{}.zip", host, date),
        _ => format!("{}_{}.zip", host, date),
    }
}
