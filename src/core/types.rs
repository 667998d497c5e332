use std::fmt;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::core::error::{MonitorError, Result};

/// Characters permitted inside a dataset path component.
fn valid_component_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

/// Hierarchical dataset name, e.g. `tank/backups/host1`.
///
/// Construction validates the raw string once; all later consumers rely on
/// the path being well-formed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetPath {
    name: String,
    components: usize,
}

impl DatasetPath {
    /// Parses and validates a dataset path.
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(MonitorError::path(name, "empty dataset path"));
        }

        let mut components = 0;
        for component in name.split('/') {
            if component.is_empty() {
                return Err(MonitorError::path(name.clone(), "empty path component"));
            }
            if let Some(c) = component.chars().find(|c| !valid_component_char(*c)) {
                return Err(MonitorError::path(
                    name.clone(),
                    format!("invalid character {c:?} in path component"),
                ));
            }
            components += 1;
        }

        Ok(Self { name, components })
    }

    /// Number of path components; `tank/a/b` has length 3.
    pub fn length(&self) -> usize {
        self.components
    }

    /// The pool the dataset belongs to (first component).
    pub fn pool(&self) -> &str {
        self.name.split('/').next().unwrap_or(&self.name)
    }

    /// Returns the string representation of the path
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DatasetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl TryFrom<String> for DatasetPath {
    type Error = MonitorError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<DatasetPath> for String {
    fn from(path: DatasetPath) -> Self {
        path.name
    }
}

/// A snapshot as reported by the inventory: the short name after `@` and the
/// creation instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotVersion {
    /// Short snapshot name, e.g. `auto-2024-01-01`.
    pub name: String,
    /// When the snapshot was created.
    pub creation: SystemTime,
}

impl SnapshotVersion {
    /// Full `dataset@snapshot` notation for the given filesystem.
    pub fn full_path(&self, fs: &str) -> String {
        format!("{}@{}", fs, self.name)
    }

    /// Age of the snapshot relative to `now`, truncated to whole seconds.
    ///
    /// A creation instant in the future clamps to zero.
    pub fn age(&self, now: SystemTime) -> Duration {
        let age = now
            .duration_since(self.creation)
            .unwrap_or(Duration::ZERO);
        Duration::from_secs(age.as_secs())
    }
}

/// Formats a duration the way operators read threshold messages: whole
/// seconds, largest unit hours, no zero-padding of the leading unit.
///
/// `3h0m0s`, `10m0s`, `42s`, `0s`.
pub fn format_duration(d: Duration) -> String {
    let total = d.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_path_length() {
        let path = DatasetPath::new("tank/backups/host1").unwrap();
        assert_eq!(path.length(), 3);
        assert_eq!(path.pool(), "tank");
        assert_eq!(path.as_str(), "tank/backups/host1");
    }

    #[test]
    fn test_dataset_path_single_component() {
        let path = DatasetPath::new("tank").unwrap();
        assert_eq!(path.length(), 1);
        assert_eq!(path.pool(), "tank");
    }

    #[test]
    fn test_dataset_path_rejects_empty() {
        assert!(DatasetPath::new("").is_err());
        assert!(DatasetPath::new("tank//data").is_err());
        assert!(DatasetPath::new("/tank").is_err());
        assert!(DatasetPath::new("tank/").is_err());
    }

    #[test]
    fn test_dataset_path_rejects_snapshot_notation() {
        assert!(DatasetPath::new("tank/data@auto-1").is_err());
        assert!(DatasetPath::new("tank/da ta").is_err());
    }

    #[test]
    fn test_full_path() {
        let snap = SnapshotVersion {
            name: "auto-1".to_string(),
            creation: SystemTime::UNIX_EPOCH,
        };
        assert_eq!(snap.full_path("tank/data"), "tank/data@auto-1");
    }

    #[test]
    fn test_age_truncates_to_seconds() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let snap = SnapshotVersion {
            name: "s".to_string(),
            creation: SystemTime::UNIX_EPOCH + Duration::from_millis(58_300),
        };
        assert_eq!(snap.age(now), Duration::from_secs(41));
    }

    #[test]
    fn test_age_clamps_future_creation() {
        let now = SystemTime::UNIX_EPOCH;
        let snap = SnapshotVersion {
            name: "s".to_string(),
            creation: now + Duration::from_secs(60),
        };
        assert_eq!(snap.age(now), Duration::ZERO);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(600)), "10m0s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_secs(3 * 3600 + 61)), "3h1m1s");
        assert_eq!(format_duration(Duration::from_secs(72 * 3600)), "72h0m0s");
    }
}
