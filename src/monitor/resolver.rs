//! Dataset resolution: job definition to ordered dataset list.
//!
//! The returned order is a contract: it fixes the order of status updates,
//! hence which breach an operator sees first.

use crate::core::{DatasetFilter, DatasetPath, DatasetSource, JobConfig, Result};
use crate::inventory::{DatasetInventory, PLACEHOLDER_PROPERTY};

/// Resolves the datasets a job monitors, sorted lexicographically and
/// deduplicated.
pub async fn resolve(inventory: &dyn DatasetInventory, job: &JobConfig) -> Result<Vec<String>> {
    let mut datasets = match job.dataset_source() {
        DatasetSource::Filter(spec) => {
            let filter = DatasetFilter::compile(spec)?;
            from_filter(inventory, &filter).await?
        }
        DatasetSource::Root { root, skip } => from_root(inventory, root, skip).await?,
    };

    datasets.sort();
    datasets.dedup();
    tracing::debug!(job = job.name(), datasets = datasets.len(), "resolved datasets");
    Ok(datasets)
}

async fn from_filter(
    inventory: &dyn DatasetInventory,
    filter: &DatasetFilter,
) -> Result<Vec<String>> {
    let mut filtered = Vec::new();
    for fs in inventory.list_filesystems().await? {
        let path = DatasetPath::new(fs.as_str())?;
        if filter.matches(&path) {
            filtered.push(fs);
        }
    }
    Ok(filtered)
}

async fn from_root(
    inventory: &dyn DatasetInventory,
    root: &str,
    skip: usize,
) -> Result<Vec<String>> {
    let root_path = DatasetPath::new(root)?;
    let props = inventory
        .recursive_properties(root, PLACEHOLDER_PROPERTY)
        .await?;

    let mut filtered = Vec::with_capacity(props.len());
    for (fs, placeholder) in props {
        let path = DatasetPath::new(fs.as_str())?;
        if path.length() < root_path.length() + 1 + skip {
            continue;
        }
        if placeholder.is_local_on() {
            continue;
        }
        filtered.push(fs);
    }
    Ok(filtered)
}
