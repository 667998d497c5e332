//! In-memory inventory for tests and demos.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::SystemTime;

use parking_lot::RwLock;

use super::{DatasetInventory, PropertyEntry, PropertySource, PLACEHOLDER_PROPERTY};
use crate::core::{DatasetPath, MonitorError, Result, SnapshotVersion};

#[derive(Debug, Default)]
struct Inner {
    filesystems: BTreeMap<String, Vec<SnapshotVersion>>,
    properties: HashMap<(String, String), PropertyEntry>,
    failing: HashSet<String>,
}

/// Hash-map-backed [`DatasetInventory`].
///
/// Registered filesystems, snapshots and properties behave like a small ZFS
/// pool; `fail_snapshots_for` injects a load error to exercise the loader's
/// cancellation path.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    inner: RwLock<Inner>,
}

impl MemoryInventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a filesystem with no snapshots.
    pub fn add_filesystem<S: Into<String>>(&self, name: S) {
        self.inner.write().filesystems.entry(name.into()).or_default();
    }

    /// Registers a snapshot; the filesystem is created if missing.
    pub fn add_snapshot<F: Into<String>, N: Into<String>>(
        &self,
        fs: F,
        name: N,
        creation: SystemTime,
    ) {
        let mut inner = self.inner.write();
        let snapshots = inner.filesystems.entry(fs.into()).or_default();
        snapshots.push(SnapshotVersion {
            name: name.into(),
            creation,
        });
        snapshots.sort_by(|a, b| a.creation.cmp(&b.creation).then_with(|| a.name.cmp(&b.name)));
    }

    /// Marks a filesystem as a placeholder (property `on`, source `local`).
    pub fn set_placeholder<S: Into<String>>(&self, fs: S) {
        self.set_property(
            fs,
            PLACEHOLDER_PROPERTY,
            PropertyEntry {
                value: "on".to_string(),
                source: PropertySource::Local,
            },
        );
    }

    /// Sets an arbitrary property entry on a filesystem.
    pub fn set_property<F: Into<String>, P: Into<String>>(
        &self,
        fs: F,
        property: P,
        entry: PropertyEntry,
    ) {
        self.inner
            .write()
            .properties
            .insert((fs.into(), property.into()), entry);
    }

    /// Makes snapshot listing fail for one filesystem.
    pub fn fail_snapshots_for<S: Into<String>>(&self, fs: S) {
        self.inner.write().failing.insert(fs.into());
    }
}

#[async_trait::async_trait]
impl DatasetInventory for MemoryInventory {
    async fn list_filesystems(&self) -> Result<Vec<String>> {
        Ok(self.inner.read().filesystems.keys().cloned().collect())
    }

    async fn recursive_properties(
        &self,
        root: &str,
        property: &str,
    ) -> Result<HashMap<String, PropertyEntry>> {
        let inner = self.inner.read();
        if !inner.filesystems.contains_key(root) {
            return Err(MonitorError::inventory(root, "dataset does not exist"));
        }

        let child_prefix = format!("{root}/");
        let mut props = HashMap::new();
        for name in inner.filesystems.keys() {
            if name != root && !name.starts_with(&child_prefix) {
                continue;
            }
            let entry = inner
                .properties
                .get(&(name.clone(), property.to_string()))
                .cloned()
                .unwrap_or_else(PropertyEntry::unset);
            props.insert(name.clone(), entry);
        }
        Ok(props)
    }

    async fn snapshots(&self, fs: &DatasetPath) -> Result<Vec<SnapshotVersion>> {
        let inner = self.inner.read();
        if inner.failing.contains(fs.as_str()) {
            return Err(MonitorError::inventory(fs.as_str(), "injected failure"));
        }
        inner
            .filesystems
            .get(fs.as_str())
            .cloned()
            .ok_or_else(|| MonitorError::inventory(fs.as_str(), "dataset does not exist"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> DatasetPath {
        DatasetPath::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_filesystems_sorted() {
        let inv = MemoryInventory::new();
        inv.add_filesystem("tank/b");
        inv.add_filesystem("tank/a");
        assert_eq!(inv.list_filesystems().await.unwrap(), vec!["tank/a", "tank/b"]);
    }

    #[tokio::test]
    async fn test_recursive_properties_scope() {
        let inv = MemoryInventory::new();
        inv.add_filesystem("backup");
        inv.add_filesystem("backup/host1");
        inv.add_filesystem("backup2");
        inv.set_placeholder("backup/host1");

        let props = inv
            .recursive_properties("backup", PLACEHOLDER_PROPERTY)
            .await
            .unwrap();
        assert_eq!(props.len(), 2);
        assert!(props["backup/host1"].is_local_on());
        assert!(!props.contains_key("backup2"));
    }

    #[tokio::test]
    async fn test_snapshots_missing_dataset() {
        let inv = MemoryInventory::new();
        let err = inv.snapshots(&path("tank/none")).await.unwrap_err();
        assert!(err.to_string().contains("tank/none"));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let inv = MemoryInventory::new();
        inv.add_filesystem("tank/bad");
        inv.fail_snapshots_for("tank/bad");
        assert!(inv.snapshots(&path("tank/bad")).await.is_err());
    }
}
