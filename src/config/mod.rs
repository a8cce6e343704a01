//! Configuration module for Site-Archiver
//!
//! This module handles loading, parsing, and validating TOML configuration files
//! and the capture settings carried by every task.
//!
//! # Example
//!
//! ```no_run
//! use site_archiver::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("archiver.toml")).unwrap();
//! println!("Capture will use max depth: {}", config.capture.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CaptureSettings, Config, OutputConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_FILE_SIZE_BYTES,
};

pub use parser::{load_config, parse_config};
pub use validation::validate;
