//! Threshold rule evaluation.
//!
//! Verdicts are values: a breach carries its severity and message, it never
//! travels the error channel. Rules are checked in configured order and the
//! first breach terminates evaluation for the dataset at hand.

use std::time::{Duration, SystemTime};

use crate::core::{format_duration, AgeRule, CountRule, SnapshotVersion};
use crate::monitor::group::GroupAggregate;
use crate::response::Severity;

/// Outcome of one count rule against one group.
#[derive(Debug, PartialEq, Eq)]
pub enum CountVerdict {
    /// Empty group, empty prefix: nothing expected, nothing checked.
    Skip,
    /// Within thresholds; the count feeds the run summary.
    Ok(u64),
    /// Missing snapshots or threshold crossed.
    Breach { severity: Severity, message: String },
}

/// Outcome of one age rule against one group representative.
#[derive(Debug, PartialEq, Eq)]
pub enum AgeVerdict {
    /// Empty group, empty prefix: nothing expected, nothing checked.
    Skip,
    /// Within thresholds; age and name feed the run summary.
    Ok { age: Duration, snapshot: String },
    /// Missing snapshots or threshold crossed.
    Breach { severity: Severity, message: String },
}

fn no_snapshots(fs: &str, prefix: &str) -> String {
    format!("{fs:?} has no snapshots with prefix {prefix:?}")
}

/// Applies a count rule to a group.
pub fn evaluate_count_rule(rule: &CountRule, fs: &str, group: &GroupAggregate<'_>) -> CountVerdict {
    if group.count == 0 {
        if rule.prefix.is_empty() {
            return CountVerdict::Skip;
        }
        return CountVerdict::Breach {
            severity: Severity::Critical,
            message: no_snapshots(fs, &rule.prefix),
        };
    }

    let message = |threshold: u64| {
        format!(
            "{fs}: {:?} snapshots count: {} ({threshold})",
            rule.prefix, group.count
        )
    };
    if group.count >= rule.critical {
        CountVerdict::Breach {
            severity: Severity::Critical,
            message: message(rule.critical),
        }
    } else if rule.warning > 0 && group.count >= rule.warning {
        CountVerdict::Breach {
            severity: Severity::Warning,
            message: message(rule.warning),
        }
    } else {
        CountVerdict::Ok(group.count)
    }
}

/// Applies an age rule to a group representative.
///
/// `snapshot_type` is the mode label (`latest` / `oldest`) used in breach
/// messages. Ages are truncated to whole seconds before comparison, so
/// message and verdict always agree.
pub fn evaluate_age_rule(
    rule: &AgeRule,
    fs: &str,
    snapshot_type: &str,
    snapshot: Option<&SnapshotVersion>,
    now: SystemTime,
) -> AgeVerdict {
    let Some(snapshot) = snapshot else {
        if rule.prefix.is_empty() {
            return AgeVerdict::Skip;
        }
        return AgeVerdict::Breach {
            severity: Severity::Critical,
            message: no_snapshots(fs, &rule.prefix),
        };
    };

    let age = snapshot.age(now);
    let message = |threshold: Duration| {
        format!(
            "{snapshot_type} {:?} too old: {:?} > {:?}",
            snapshot.full_path(fs),
            format_duration(age),
            format_duration(threshold)
        )
    };
    if age >= rule.critical {
        AgeVerdict::Breach {
            severity: Severity::Critical,
            message: message(rule.critical),
        }
    } else if !rule.warning.is_zero() && age >= rule.warning {
        AgeVerdict::Breach {
            severity: Severity::Warning,
            message: message(rule.warning),
        }
    } else {
        AgeVerdict::Ok {
            age,
            snapshot: snapshot.name.clone(),
        }
    }
}
