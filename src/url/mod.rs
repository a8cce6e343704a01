//! URL handling module for Site-Archiver
//!
//! This module provides seed validation, reference resolution, page URL
//! normalization, origin checks, link ignore patterns, and filename
//! sanitization for archive paths.

mod domain;
mod filter;
mod normalize;
mod sanitize;

// Re-export main functions
pub use domain::is_same_origin;
pub use filter::{is_analytics_url, IgnoreSet, ANALYTICS_DENYLIST};
pub use normalize::{normalize_page_url, parse_seed_url, resolve_reference};
pub use sanitize::{file_extension, file_stem, sanitize_filename, sanitize_host};
