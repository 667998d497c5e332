//! Prefix grouping of snapshot lists.

use crate::core::SnapshotVersion;

/// Aggregate over the snapshots matching one rule prefix.
#[derive(Debug, Default)]
pub struct GroupAggregate<'a> {
    /// Number of snapshots in the group.
    pub count: u64,
    /// Snapshot with the minimum creation time.
    pub oldest: Option<&'a SnapshotVersion>,
    /// Snapshot with the maximum creation time.
    pub latest: Option<&'a SnapshotVersion>,
}

impl<'a> GroupAggregate<'a> {
    /// The snapshot representing this group under the given mode.
    pub fn representative(&self, oldest: bool) -> Option<&'a SnapshotVersion> {
        if oldest {
            self.oldest
        } else {
            self.latest
        }
    }
}

/// Buckets snapshots into one aggregate per prefix.
///
/// Single pass: each snapshot goes to the first prefix that matches its
/// name (an empty prefix matches everything, comparison is plain byte
/// prefix). Snapshots matching no prefix are ignored. The result always has
/// `prefixes.len()` entries; groups nothing matched stay empty. When two
/// snapshots share a creation time the first encountered wins for both
/// `oldest` and `latest`.
pub fn group_by_prefix<'a>(
    snapshots: &'a [SnapshotVersion],
    prefixes: &[&str],
) -> Vec<GroupAggregate<'a>> {
    let mut groups: Vec<GroupAggregate<'a>> =
        (0..prefixes.len()).map(|_| GroupAggregate::default()).collect();

    for snapshot in snapshots {
        for (group, prefix) in groups.iter_mut().zip(prefixes) {
            if !prefix.is_empty() && !snapshot.name.starts_with(prefix) {
                continue;
            }
            group.count += 1;
            match group.oldest {
                Some(oldest) if snapshot.creation >= oldest.creation => {}
                _ => group.oldest = Some(snapshot),
            }
            match group.latest {
                Some(latest) if snapshot.creation <= latest.creation => {}
                _ => group.latest = Some(snapshot),
            }
            break;
        }
    }
    groups
}
