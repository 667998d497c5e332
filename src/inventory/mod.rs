//! Dataset inventory capability.
//!
//! The monitor core consumes storage state exclusively through the
//! [`DatasetInventory`] trait: filesystem enumeration, recursive property
//! fetches and snapshot listings. The production implementation shells out
//! to zfs(8); an in-memory implementation backs the tests.

use std::collections::HashMap;

use crate::core::{DatasetPath, Result, SnapshotVersion};

pub mod memory;
pub mod zfs;

pub use memory::MemoryInventory;
pub use zfs::ZfsInventory;

/// Property marking a dataset that exists only to host descendants.
///
/// Placeholders are excluded from monitoring when the property is set to
/// `on` with source `local`.
pub const PLACEHOLDER_PROPERTY: &str = "snapmon:placeholder";

/// Where a property value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertySource {
    /// Set directly on the dataset.
    Local,
    /// Inherited from an ancestor.
    Inherited,
    /// ZFS default value.
    Default,
    /// Received as part of a replication stream.
    Received,
    /// Not set at all.
    None,
    /// Any other source string zfs may report.
    Other(String),
}

impl PropertySource {
    /// Parses the source column of `zfs get`.
    pub fn parse(s: &str) -> Self {
        match s {
            "local" => Self::Local,
            "default" => Self::Default,
            "received" => Self::Received,
            "-" | "none" => Self::None,
            _ if s.starts_with("inherited") => Self::Inherited,
            _ => Self::Other(s.to_string()),
        }
    }
}

/// A property value together with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEntry {
    pub value: String,
    pub source: PropertySource,
}

impl PropertyEntry {
    /// An unset property, as `zfs get` reports for missing user properties.
    pub fn unset() -> Self {
        Self {
            value: "-".to_string(),
            source: PropertySource::None,
        }
    }

    /// True for the placeholder marker: value `on` set locally.
    pub fn is_local_on(&self) -> bool {
        self.source == PropertySource::Local && self.value == "on"
    }
}

/// Read access to datasets, their properties and their snapshots.
#[async_trait::async_trait]
pub trait DatasetInventory: Send + Sync {
    /// Enumerates every filesystem name visible to the monitor.
    async fn list_filesystems(&self) -> Result<Vec<String>>;

    /// Fetches one property for `root` and all its descendants,
    /// unlimited depth.
    async fn recursive_properties(
        &self,
        root: &str,
        property: &str,
    ) -> Result<HashMap<String, PropertyEntry>>;

    /// Lists the snapshots of one filesystem, sorted by creation time.
    async fn snapshots(&self, fs: &DatasetPath) -> Result<Vec<SnapshotVersion>>;
}
