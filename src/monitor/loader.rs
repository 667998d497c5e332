//! Concurrent snapshot preloading.
//!
//! Each dataset's snapshot list is fetched independently; at most
//! `max_procs` fetches are in flight. The cache mutex guards only map
//! insertion and is never held across an await.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;

use crate::core::{DatasetPath, MonitorError, Result, SnapshotVersion};
use crate::inventory::DatasetInventory;

/// Snapshot lists keyed by dataset name.
pub type DatasetCache = HashMap<String, Vec<SnapshotVersion>>;

/// Bounded-concurrency loader filling a shared [`DatasetCache`].
pub struct SnapshotLoader {
    inventory: Arc<dyn DatasetInventory>,
    max_procs: usize,
}

impl SnapshotLoader {
    /// Creates a loader; `max_procs == 0` selects the host's available
    /// parallelism.
    pub fn new(inventory: Arc<dyn DatasetInventory>, max_procs: usize) -> Self {
        let max_procs = if max_procs == 0 {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        } else {
            max_procs
        };
        Self {
            inventory,
            max_procs,
        }
    }

    /// Loads every dataset's snapshot list into `cache`.
    ///
    /// The first load error cancels scheduling: no further task is
    /// dispatched once the shared flag is set, tasks already in flight run
    /// to completion and their results are discarded with the run. The
    /// first error is returned.
    pub async fn preload(&self, datasets: &[String], cache: Arc<Mutex<DatasetCache>>) -> Result<()> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();
        let mut first_err = None;

        for dataset in datasets {
            while tasks.len() >= self.max_procs {
                collect(&mut tasks, &cancelled, &mut first_err).await;
            }
            if cancelled.load(Ordering::Acquire) {
                break;
            }

            let inventory = Arc::clone(&self.inventory);
            let cache = Arc::clone(&cache);
            let cancelled = Arc::clone(&cancelled);
            let dataset = dataset.clone();
            tasks.spawn(async move {
                if cancelled.load(Ordering::Acquire) {
                    return Ok(());
                }
                match load_snapshots(inventory.as_ref(), &dataset).await {
                    Ok(snapshots) => {
                        cache.lock().insert(dataset, snapshots);
                        Ok(())
                    }
                    Err(e) => {
                        cancelled.store(true, Ordering::Release);
                        Err(e)
                    }
                }
            });
        }

        while !tasks.is_empty() {
            collect(&mut tasks, &cancelled, &mut first_err).await;
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Loads a single dataset, bypassing the cache.
    pub async fn load_one(&self, dataset: &str) -> Result<Vec<SnapshotVersion>> {
        load_snapshots(self.inventory.as_ref(), dataset).await
    }
}

async fn load_snapshots(
    inventory: &dyn DatasetInventory,
    dataset: &str,
) -> Result<Vec<SnapshotVersion>> {
    let path = DatasetPath::new(dataset)?;
    inventory.snapshots(&path).await
}

async fn collect(
    tasks: &mut JoinSet<Result<()>>,
    cancelled: &AtomicBool,
    first_err: &mut Option<MonitorError>,
) {
    let Some(joined) = tasks.join_next().await else {
        return;
    };
    let failure = match joined {
        Ok(Ok(())) => return,
        Ok(Err(e)) => e,
        Err(join_err) => join_err.into(),
    };
    cancelled.store(true, Ordering::Release);
    if first_err.is_none() {
        *first_err = Some(failure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::MemoryInventory;
    use std::time::SystemTime;

    fn inventory(datasets: &[&str]) -> Arc<MemoryInventory> {
        let inv = MemoryInventory::new();
        for (i, fs) in datasets.iter().enumerate() {
            inv.add_snapshot(
                *fs,
                format!("auto-{i}"),
                SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(i as u64),
            );
        }
        Arc::new(inv)
    }

    #[tokio::test]
    async fn test_preload_fills_cache() {
        let datasets: Vec<String> = (0..10).map(|i| format!("tank/fs{i}")).collect();
        let names: Vec<&str> = datasets.iter().map(String::as_str).collect();
        let inv = inventory(&names);

        let loader = SnapshotLoader::new(inv, 4);
        let cache = Arc::new(Mutex::new(DatasetCache::new()));
        loader.preload(&datasets, Arc::clone(&cache)).await.unwrap();

        let cache = cache.lock();
        assert_eq!(cache.len(), datasets.len());
        for dataset in &datasets {
            assert_eq!(cache[dataset].len(), 1);
        }
    }

    #[tokio::test]
    async fn test_cache_identical_across_limits() {
        let datasets: Vec<String> = (0..32).map(|i| format!("tank/fs{i:02}")).collect();
        let names: Vec<&str> = datasets.iter().map(String::as_str).collect();

        let mut baseline = None;
        for max_procs in [1, 2, 4, 8, 64] {
            let loader = SnapshotLoader::new(inventory(&names), max_procs);
            let cache = Arc::new(Mutex::new(DatasetCache::new()));
            loader.preload(&datasets, Arc::clone(&cache)).await.unwrap();

            let mut loaded: Vec<(String, Vec<String>)> = cache
                .lock()
                .iter()
                .map(|(fs, snaps)| {
                    (fs.clone(), snaps.iter().map(|s| s.name.clone()).collect())
                })
                .collect();
            loaded.sort();

            match &baseline {
                None => baseline = Some(loaded),
                Some(expected) => assert_eq!(&loaded, expected, "max_procs={max_procs}"),
            }
        }
    }

    #[tokio::test]
    async fn test_first_error_returned() {
        let datasets: Vec<String> = (0..8).map(|i| format!("tank/fs{i}")).collect();
        let names: Vec<&str> = datasets.iter().map(String::as_str).collect();
        let inv = inventory(&names);
        inv.fail_snapshots_for("tank/fs3");

        let loader = SnapshotLoader::new(inv, 2);
        let cache = Arc::new(Mutex::new(DatasetCache::new()));
        let err = loader.preload(&datasets, cache).await.unwrap_err();
        assert!(err.to_string().contains("tank/fs3"));
    }

    #[tokio::test]
    async fn test_error_stops_scheduling() {
        // With concurrency 1 the failure is observed before later datasets
        // are dispatched, so none of them may appear in the cache.
        let datasets: Vec<String> = vec![
            "tank/a".to_string(),
            "tank/bad".to_string(),
            "tank/c".to_string(),
            "tank/d".to_string(),
        ];
        let inv = inventory(&["tank/a", "tank/bad", "tank/c", "tank/d"]);
        inv.fail_snapshots_for("tank/bad");

        let loader = SnapshotLoader::new(inv, 1);
        let cache = Arc::new(Mutex::new(DatasetCache::new()));
        assert!(loader.preload(&datasets, Arc::clone(&cache)).await.is_err());

        let cache = cache.lock();
        assert!(!cache.contains_key("tank/c"));
        assert!(!cache.contains_key("tank/d"));
    }

    #[tokio::test]
    async fn test_invalid_dataset_name_is_fatal() {
        let inv = inventory(&["tank/a"]);
        let loader = SnapshotLoader::new(inv, 4);
        let cache = Arc::new(Mutex::new(DatasetCache::new()));
        let err = loader
            .preload(&["tank//broken".to_string()], cache)
            .await
            .unwrap_err();
        assert_eq!(err.category(), "path");
    }

    #[tokio::test]
    async fn test_load_one() {
        let inv = inventory(&["tank/a"]);
        let loader = SnapshotLoader::new(inv, 1);
        let snapshots = loader.load_one("tank/a").await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert!(loader.load_one("tank/missing").await.is_err());
    }
}
