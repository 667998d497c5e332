//! Filesystems filter for filter-driven jobs.
//!
//! Patterns come from the job configuration as a map of dataset patterns to
//! accept/reject flags. A trailing `<` selects the dataset and its whole
//! subtree; without it the pattern matches exactly one dataset. The most
//! specific matching pattern decides, an exact match beating a subtree match
//! of the same depth. Datasets matching no pattern are rejected.
//!
//! ```yaml
//! filesystems:
//!   "tank/data<": true
//!   "tank/data/tmp": false
//! ```

use std::collections::BTreeMap;

use crate::core::error::{MonitorError, Result};
use crate::core::types::DatasetPath;

/// Raw filter specification as it appears in the job configuration.
pub type FilesystemsFilter = BTreeMap<String, bool>;

#[derive(Debug, Clone)]
struct FilterEntry {
    components: Vec<String>,
    subtree: bool,
    accept: bool,
}

impl FilterEntry {
    fn matches(&self, components: &[&str]) -> bool {
        if self.subtree {
            components.len() >= self.components.len()
                && self
                    .components
                    .iter()
                    .zip(components)
                    .all(|(pattern, actual)| pattern == actual)
        } else {
            components.len() == self.components.len()
                && self
                    .components
                    .iter()
                    .zip(components)
                    .all(|(pattern, actual)| pattern == actual)
        }
    }

    /// Deeper patterns are more specific; at equal depth an exact pattern
    /// outranks a subtree pattern.
    fn specificity(&self) -> usize {
        self.components.len() * 2 + usize::from(!self.subtree)
    }
}

/// Compiled dataset filter with longest-match semantics.
#[derive(Debug, Clone)]
pub struct DatasetFilter {
    entries: Vec<FilterEntry>,
}

impl DatasetFilter {
    /// Compiles the configured pattern map, validating every pattern.
    pub fn compile(spec: &FilesystemsFilter) -> Result<Self> {
        if spec.is_empty() {
            return Err(MonitorError::config("empty filesystems filter"));
        }

        let mut entries = Vec::with_capacity(spec.len());
        for (pattern, accept) in spec {
            let (path, subtree) = match pattern.strip_suffix('<') {
                Some(rest) => (rest, true),
                None => (pattern.as_str(), false),
            };

            let components = if path.is_empty() {
                if !subtree {
                    return Err(MonitorError::config("empty filesystems filter pattern"));
                }
                // bare "<" selects every dataset
                Vec::new()
            } else {
                DatasetPath::new(path)
                    .map_err(|e| {
                        MonitorError::config(format!("invalid filter pattern {pattern:?}: {e}"))
                    })?
                    .as_str()
                    .split('/')
                    .map(str::to_string)
                    .collect()
            };

            entries.push(FilterEntry {
                components,
                subtree,
                accept: *accept,
            });
        }

        Ok(Self { entries })
    }

    /// Returns whether the dataset is selected by the filter.
    pub fn matches(&self, path: &DatasetPath) -> bool {
        let components: Vec<&str> = path.as_str().split('/').collect();

        let mut verdict = false;
        let mut best = 0;
        for entry in &self.entries {
            if entry.matches(&components) {
                let specificity = entry.specificity() + 1;
                if specificity > best {
                    best = specificity;
                    verdict = entry.accept;
                }
            }
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(pairs: &[(&str, bool)]) -> DatasetFilter {
        let spec: FilesystemsFilter = pairs
            .iter()
            .map(|(pattern, ok)| (pattern.to_string(), *ok))
            .collect();
        DatasetFilter::compile(&spec).unwrap()
    }

    fn path(s: &str) -> DatasetPath {
        DatasetPath::new(s).unwrap()
    }

    #[test]
    fn test_subtree_match() {
        let f = filter(&[("tank/data<", true)]);
        assert!(f.matches(&path("tank/data")));
        assert!(f.matches(&path("tank/data/a/b")));
        assert!(!f.matches(&path("tank/other")));
        assert!(!f.matches(&path("tank")));
    }

    #[test]
    fn test_exact_match_only() {
        let f = filter(&[("tank/data", true)]);
        assert!(f.matches(&path("tank/data")));
        assert!(!f.matches(&path("tank/data/child")));
    }

    #[test]
    fn test_most_specific_wins() {
        let f = filter(&[("tank<", true), ("tank/tmp<", false)]);
        assert!(f.matches(&path("tank/data")));
        assert!(!f.matches(&path("tank/tmp")));
        assert!(!f.matches(&path("tank/tmp/scratch")));
    }

    #[test]
    fn test_exact_beats_subtree_at_same_depth() {
        let f = filter(&[("tank/data<", false), ("tank/data", true)]);
        assert!(f.matches(&path("tank/data")));
        assert!(!f.matches(&path("tank/data/child")));
    }

    #[test]
    fn test_root_wildcard() {
        let f = filter(&[("<", true), ("scratch<", false)]);
        assert!(f.matches(&path("tank")));
        assert!(f.matches(&path("tank/a/b")));
        assert!(!f.matches(&path("scratch/tmp")));
    }

    #[test]
    fn test_no_match_rejects() {
        let f = filter(&[("tank/data<", true)]);
        assert!(!f.matches(&path("zroot/var")));
    }

    #[test]
    fn test_component_boundary() {
        // "tank/data<" must not match "tank/database"
        let f = filter(&[("tank/data<", true)]);
        assert!(!f.matches(&path("tank/database")));
    }

    #[test]
    fn test_rejects_bad_patterns() {
        assert!(DatasetFilter::compile(&FilesystemsFilter::new()).is_err());

        let mut spec = FilesystemsFilter::new();
        spec.insert(String::new(), true);
        assert!(DatasetFilter::compile(&spec).is_err());

        let mut spec = FilesystemsFilter::new();
        spec.insert("tank//data".to_string(), true);
        assert!(DatasetFilter::compile(&spec).is_err());
    }
}
