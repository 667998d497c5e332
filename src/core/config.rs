//! Job configuration for the snapshot monitor.
//!
//! Configuration is YAML with:
//! - a `global` section (zfs binary path),
//! - a `jobs` list of replication job definitions.
//!
//! Each job is tagged by `type` and supplies either a filesystems filter
//! (push / snap / source) or a root filesystem (pull / sink), plus the
//! monitor rule lists evaluated against its snapshots.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{MonitorError, Result};
use crate::core::filter::{DatasetFilter, FilesystemsFilter};
use crate::core::types::DatasetPath;

/// Complete monitor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global daemon options.
    pub global: GlobalConfig,
    /// Job definitions.
    pub jobs: Vec<JobConfig>,
}

/// Global daemon options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Path of the zfs binary used by the command inventory.
    pub zfs_bin: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            zfs_bin: "zfs".to_string(),
        }
    }
}

/// A replication job definition, discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JobConfig {
    /// Active sender: replicates the filtered filesystems to a remote sink.
    Push {
        name: String,
        filesystems: FilesystemsFilter,
        #[serde(default)]
        monitor: MonitorRules,
    },
    /// Local snapshotting job over the filtered filesystems.
    Snap {
        name: String,
        filesystems: FilesystemsFilter,
        #[serde(default)]
        monitor: MonitorRules,
    },
    /// Passive sender serving the filtered filesystems to pullers.
    Source {
        name: String,
        filesystems: FilesystemsFilter,
        #[serde(default)]
        monitor: MonitorRules,
    },
    /// Active receiver: replicates a remote source below `root_fs`.
    Pull {
        name: String,
        root_fs: String,
        #[serde(default)]
        monitor: MonitorRules,
    },
    /// Passive receiver: clients replicate below `root_fs/<client>`.
    Sink {
        name: String,
        root_fs: String,
        #[serde(default)]
        monitor: MonitorRules,
    },
}

/// Where a job's datasets come from.
#[derive(Debug, Clone, Copy)]
pub enum DatasetSource<'a> {
    /// Enumerate all filesystems and keep those matching the filter.
    Filter(&'a FilesystemsFilter),
    /// Recursive descent from a root dataset, skipping the first
    /// `skip` hierarchy levels below the root.
    Root { root: &'a str, skip: usize },
}

impl JobConfig {
    /// The job's configured name.
    pub fn name(&self) -> &str {
        match self {
            Self::Push { name, .. }
            | Self::Snap { name, .. }
            | Self::Source { name, .. }
            | Self::Pull { name, .. }
            | Self::Sink { name, .. } => name,
        }
    }

    /// The job's monitor rule lists.
    pub fn monitor(&self) -> &MonitorRules {
        match self {
            Self::Push { monitor, .. }
            | Self::Snap { monitor, .. }
            | Self::Source { monitor, .. }
            | Self::Pull { monitor, .. }
            | Self::Sink { monitor, .. } => monitor,
        }
    }

    /// How the job's datasets are discovered.
    ///
    /// Sink jobs skip one extra level: the per-client identity dataset
    /// directly below the root.
    pub fn dataset_source(&self) -> DatasetSource<'_> {
        match self {
            Self::Push { filesystems, .. }
            | Self::Snap { filesystems, .. }
            | Self::Source { filesystems, .. } => DatasetSource::Filter(filesystems),
            Self::Pull { root_fs, .. } => DatasetSource::Root {
                root: root_fs,
                skip: 0,
            },
            Self::Sink { root_fs, .. } => DatasetSource::Root {
                root: root_fs,
                skip: 1,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name().is_empty() {
            return Err(MonitorError::config("job with empty name"));
        }
        self.monitor().validate(self.name())?;

        match self.dataset_source() {
            DatasetSource::Filter(spec) => {
                DatasetFilter::compile(spec).map_err(|e| {
                    MonitorError::config(format!("job {:?}: {e}", self.name()))
                })?;
            }
            DatasetSource::Root { root, .. } => {
                DatasetPath::new(root).map_err(|e| {
                    MonitorError::config(format!("job {:?}: invalid root_fs: {e}", self.name()))
                })?;
            }
        }
        Ok(())
    }
}

/// Monitor rule lists of a job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorRules {
    /// Age rules applied to the latest snapshot per prefix group.
    pub latest: Vec<AgeRule>,
    /// Age rules applied to the oldest snapshot per prefix group.
    pub oldest: Vec<AgeRule>,
    /// Count rules applied to the group sizes.
    pub count: Vec<CountRule>,
}

impl MonitorRules {
    fn validate(&self, job: &str) -> Result<()> {
        for rule in self.latest.iter().chain(&self.oldest) {
            if rule.critical.is_zero() {
                return Err(MonitorError::config(format!(
                    "job {job:?}: age rule with prefix {:?} requires a non-zero critical threshold",
                    rule.prefix
                )));
            }
        }
        for rule in &self.count {
            if rule.critical == 0 {
                return Err(MonitorError::config(format!(
                    "job {job:?}: count rule with prefix {:?} requires a non-zero critical threshold",
                    rule.prefix
                )));
            }
        }
        Ok(())
    }
}

/// Age threshold rule for one snapshot name prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeRule {
    /// Snapshot name prefix; empty matches every snapshot.
    #[serde(default)]
    pub prefix: String,
    /// Warning threshold; zero disables the warning level.
    #[serde(default, with = "humantime_serde")]
    pub warning: Duration,
    /// Critical threshold; must be non-zero.
    #[serde(with = "humantime_serde")]
    pub critical: Duration,
}

/// Count threshold rule for one snapshot name prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountRule {
    /// Snapshot name prefix; empty matches every snapshot.
    #[serde(default)]
    pub prefix: String,
    /// Warning threshold; zero disables the warning level.
    #[serde(default)]
    pub warning: u64,
    /// Critical threshold; must be non-zero.
    pub critical: u64,
}

impl Config {
    /// Parses and validates a YAML configuration document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Validates job definitions: unique names and well-formed rules.
    pub fn validate(&self) -> Result<()> {
        let mut names = std::collections::HashSet::new();
        for job in &self.jobs {
            job.validate()?;
            if !names.insert(job.name()) {
                return Err(MonitorError::config(format!(
                    "duplicate job name {:?}",
                    job.name()
                )));
            }
        }
        Ok(())
    }

    /// Looks up a job by name.
    pub fn job(&self, name: &str) -> Result<&JobConfig> {
        self.jobs
            .iter()
            .find(|j| j.name() == name)
            .ok_or_else(|| MonitorError::config(format!("job {name:?} not defined in config")))
    }
}
