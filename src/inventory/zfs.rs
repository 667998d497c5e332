//! zfs(8) command-backed inventory.
//!
//! Every operation maps to one zfs invocation with machine-readable output
//! (`-H` no headers, `-p` parseable values). Commands are logged with their
//! runtime at debug level.

use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime};

use tokio::process::Command;

use super::{DatasetInventory, PropertyEntry, PropertySource};
use crate::core::{DatasetPath, MonitorError, Result, SnapshotVersion};

/// Inventory implementation shelling out to the zfs binary.
#[derive(Debug, Clone)]
pub struct ZfsInventory {
    zfs_bin: String,
}

impl ZfsInventory {
    /// Creates an inventory using the given zfs binary path.
    pub fn new<S: Into<String>>(zfs_bin: S) -> Self {
        Self {
            zfs_bin: zfs_bin.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let command = format!("{} {}", self.zfs_bin, args.join(" "));
        let started = Instant::now();
        let output = Command::new(&self.zfs_bin).args(args).output().await?;
        tracing::debug!(
            cmd = %command,
            runtime_ms = started.elapsed().as_millis() as u64,
            status = output.status.code(),
            "zfs command finished"
        );

        if !output.status.success() {
            return Err(MonitorError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait::async_trait]
impl DatasetInventory for ZfsInventory {
    async fn list_filesystems(&self) -> Result<Vec<String>> {
        let stdout = self
            .run(&["list", "-H", "-p", "-o", "name", "-t", "filesystem"])
            .await?;
        Ok(parse_filesystems(&stdout))
    }

    async fn recursive_properties(
        &self,
        root: &str,
        property: &str,
    ) -> Result<HashMap<String, PropertyEntry>> {
        let stdout = self
            .run(&[
                "get",
                "-Hp",
                "-t",
                "filesystem",
                "-r",
                "-o",
                "name,property,value,source",
                property,
                root,
            ])
            .await?;
        parse_properties(root, &stdout)
    }

    async fn snapshots(&self, fs: &DatasetPath) -> Result<Vec<SnapshotVersion>> {
        let stdout = self
            .run(&[
                "list",
                "-H",
                "-p",
                "-o",
                "name,creation",
                "-t",
                "snapshot",
                "-d",
                "1",
                fs.as_str(),
            ])
            .await?;
        parse_snapshots(fs.as_str(), &stdout)
    }
}

fn parse_filesystems(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_properties(root: &str, stdout: &str) -> Result<HashMap<String, PropertyEntry>> {
    let mut props = HashMap::new();
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let mut fields = line.split('\t');
        let (name, _property, value, source) = match (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) {
            (Some(n), Some(p), Some(v), Some(s)) => (n, p, v, s),
            _ => {
                return Err(MonitorError::inventory(
                    root,
                    format!("unparseable zfs get line: {line:?}"),
                ));
            }
        };
        props.insert(
            name.to_string(),
            PropertyEntry {
                value: value.to_string(),
                source: PropertySource::parse(source),
            },
        );
    }
    Ok(props)
}

fn parse_snapshots(dataset: &str, stdout: &str) -> Result<Vec<SnapshotVersion>> {
    let mut snapshots = Vec::new();
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let (full_name, creation) = line.split_once('\t').ok_or_else(|| {
            MonitorError::inventory(dataset, format!("unparseable zfs list line: {line:?}"))
        })?;
        let (_, name) = full_name.split_once('@').ok_or_else(|| {
            MonitorError::inventory(dataset, format!("not a snapshot name: {full_name:?}"))
        })?;
        let epoch: u64 = creation.trim().parse().map_err(|_| {
            MonitorError::inventory(dataset, format!("invalid creation time: {creation:?}"))
        })?;
        snapshots.push(SnapshotVersion {
            name: name.to_string(),
            creation: SystemTime::UNIX_EPOCH + Duration::from_secs(epoch),
        });
    }
    snapshots.sort_by(|a, b| a.creation.cmp(&b.creation).then_with(|| a.name.cmp(&b.name)));
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filesystems() {
        let out = "tank\ntank/data\ntank/data/home\n";
        assert_eq!(parse_filesystems(out), vec!["tank", "tank/data", "tank/data/home"]);
        assert!(parse_filesystems("").is_empty());
    }

    #[test]
    fn test_parse_properties() {
        let out = "backup\tsnapmon:placeholder\t-\t-\n\
                   backup/host1\tsnapmon:placeholder\ton\tlocal\n\
                   backup/host1/data\tsnapmon:placeholder\ton\tinherited from backup/host1\n";
        let props = parse_properties("backup", out).unwrap();
        assert_eq!(props.len(), 3);
        assert!(props["backup/host1"].is_local_on());
        assert!(!props["backup/host1/data"].is_local_on());
        assert!(!props["backup"].is_local_on());
    }

    #[test]
    fn test_parse_properties_rejects_garbage() {
        let err = parse_properties("backup", "not a record\n").unwrap_err();
        assert!(err.to_string().contains("unparseable"));
    }

    #[test]
    fn test_parse_snapshots_sorted_by_creation() {
        let out = "tank/data@auto-2\t200\ntank/data@auto-1\t100\n";
        let snaps = parse_snapshots("tank/data", out).unwrap();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].name, "auto-1");
        assert_eq!(snaps[1].name, "auto-2");
        assert_eq!(
            snaps[0].creation,
            SystemTime::UNIX_EPOCH + Duration::from_secs(100)
        );
    }

    #[test]
    fn test_parse_snapshots_rejects_bad_records() {
        assert!(parse_snapshots("tank", "tank/data\t100\n").is_err());
        assert!(parse_snapshots("tank", "tank/data@s1\tsoon\n").is_err());
        assert!(parse_snapshots("tank", "tank/data@s1 100\n").is_err());
    }
}
