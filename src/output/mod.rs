//! Output module for packaging capture results
//!
//! This module handles:
//! - Deterministic archive paths for pages and assets
//! - Rewriting references for offline viewing
//! - Assembling the ZIP archive
//! - Printing capture summaries

pub mod archive;
pub mod layout;
pub mod rewrite;
pub mod stats;

pub use archive::{build_archive, suggested_archive_name, ArchiveBuilder};
pub use layout::{asset_local_path, page_local_path, root_prefix};
pub use rewrite::{inject_base_tag, DocumentRewriter, UrlRewriter};
pub use stats::{format_bytes, print_summary};
