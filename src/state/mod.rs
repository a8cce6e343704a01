//! State module for tracking capture progress
//!
//! This module provides the data model of a capture task.
//!
//! # Components
//!
//! - `AssetDescriptor` / `AssetMap`: One discovered resource and the global deduplicated set
//! - `PageRecord`: One captured page
//! - `ProgressCounters` / `ProgressSnapshot`: Counters mutated during a task and the emitted view
//! - `CaptureTask`: The single owner of all mutable state for one capture

mod asset;
mod page;
mod progress;
mod task;

// Re-export main types
pub use asset::{AssetDescriptor, AssetKind, AssetMap};
pub use page::PageRecord;
pub use progress::{ProgressCounters, ProgressSnapshot};
pub use task::{CaptureMode, CaptureTask, TaskId};
