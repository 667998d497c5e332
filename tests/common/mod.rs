//! Shared fixtures for the monitor integration tests.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use snapmon::core::{Config, JobConfig};
use snapmon::inventory::MemoryInventory;
use snapmon::monitor::{CheckMode, CheckOptions, SnapshotCheck};
use snapmon::response::CheckResponse;

/// Builds a snap job named `backups` selecting everything under `tank`,
/// with the given `monitor:` block body.
pub fn snap_job(monitor_yaml: &str) -> JobConfig {
    let yaml = format!(
        r#"
jobs:
  - name: backups
    type: snap
    filesystems: {{ "tank<": true }}
    monitor:
{monitor_yaml}
"#
    );
    Config::from_yaml(&yaml).unwrap().jobs.remove(0)
}

/// Registers `snapshots` as `(name, age)` pairs on one filesystem.
pub fn inventory_with(fs: &str, snapshots: &[(&str, Duration)]) -> Arc<MemoryInventory> {
    let inv = MemoryInventory::new();
    inv.add_filesystem(fs);
    let now = SystemTime::now();
    for (name, age) in snapshots {
        inv.add_snapshot(fs, *name, now - *age);
    }
    Arc::new(inv)
}

/// A check with default options except for the mode.
pub fn check_with_mode(inv: Arc<MemoryInventory>, mode: CheckMode) -> SnapshotCheck {
    SnapshotCheck::new(
        inv,
        CheckOptions {
            mode,
            ..CheckOptions::default()
        },
    )
}

/// A response whose default line never appears in assertions.
pub fn response() -> CheckResponse {
    CheckResponse::new("unreachable default")
}

pub fn minutes(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

pub fn hours(h: u64) -> Duration {
    Duration::from_secs(h * 3600)
}
