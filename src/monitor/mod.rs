//! Snapshot monitoring core.
//!
//! One [`run::SnapshotCheck`] instance performs one monitoring run over one
//! job: resolve the job's datasets, preload their snapshot lists with
//! bounded concurrency, group snapshots by rule prefix and evaluate the
//! configured thresholds, reporting verdicts to a
//! [`StatusSink`](crate::response::StatusSink).

use std::time::Duration;

pub mod group;
pub mod loader;
pub mod resolver;
pub mod rules;
pub mod run;

pub use group::{group_by_prefix, GroupAggregate};
pub use loader::{DatasetCache, SnapshotLoader};
pub use run::SnapshotCheck;

/// What a run checks and which snapshot represents each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// Age of the latest snapshot per group; the run summary reports the
    /// minimum age observed.
    #[default]
    AgeLatest,
    /// Age of the oldest snapshot per group; the run summary reports the
    /// maximum age observed.
    AgeOldest,
    /// Snapshot counts per group.
    Counts,
}

impl CheckMode {
    /// True when groups are represented by their oldest snapshot.
    pub fn oldest(&self) -> bool {
        matches!(self, Self::AgeOldest)
    }

    /// True for count mode.
    pub fn counts(&self) -> bool {
        matches!(self, Self::Counts)
    }

    /// Label used in age verdicts and summaries.
    pub fn snapshot_type(&self) -> &'static str {
        if self.oldest() {
            "oldest"
        } else {
            "latest"
        }
    }
}

/// Single rule supplied on the command line, replacing the job's
/// configured rule list.
#[derive(Debug, Clone)]
pub enum RuleOverride {
    /// Age thresholds; zero warning disables the warning level.
    Age {
        prefix: String,
        warning: Duration,
        critical: Duration,
    },
    /// Count thresholds; zero warning disables the warning level.
    Count {
        prefix: String,
        warning: u64,
        critical: u64,
    },
}

/// Run parameters, applied once at construction.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// What to check.
    pub mode: CheckMode,
    /// Concurrency limit for snapshot preloading; zero selects the host's
    /// available parallelism.
    pub max_procs: usize,
    /// Optional CLI rule replacing the configured rule list.
    pub rule_override: Option<RuleOverride>,
}
