//! Core domain models and configuration for the snapshot monitor.
//!
//! This module contains the fundamental types shared by every other part of
//! the crate: dataset paths, snapshot versions, job configuration, the
//! filesystems filter and the crate-wide error type.

pub mod config;
pub mod error;
pub mod filter;
pub mod types;

// Re-export commonly used types
pub use config::{AgeRule, Config, CountRule, DatasetSource, GlobalConfig, JobConfig, MonitorRules};
pub use error::{MonitorError, Result};
pub use filter::{DatasetFilter, FilesystemsFilter};
pub use types::{format_duration, DatasetPath, SnapshotVersion};
