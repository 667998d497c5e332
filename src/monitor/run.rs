//! Monitor run orchestration.
//!
//! A [`SnapshotCheck`] owns the state of one monitoring run: the resolved
//! dataset order, the snapshot cache and the verdict accumulation. Dataset
//! resolution and preloading happen once per instance; [`SnapshotCheck::reset`]
//! clears the verdict state while keeping the loaded data, so one fixture
//! can be re-evaluated under different thresholds.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;

use crate::core::{
    format_duration, AgeRule, CountRule, JobConfig, MonitorError, Result, SnapshotVersion,
};
use crate::inventory::DatasetInventory;
use crate::monitor::group::group_by_prefix;
use crate::monitor::loader::{DatasetCache, SnapshotLoader};
use crate::monitor::rules::{evaluate_age_rule, evaluate_count_rule, AgeVerdict, CountVerdict};
use crate::monitor::{resolver, CheckOptions, RuleOverride};
use crate::response::{Severity, StatusSink};

const NO_RULES: &str = "no monitor rules or cli args defined";

#[derive(Debug)]
struct AgeSummary {
    age: Duration,
    snapshot: String,
}

/// One monitoring run over one job.
pub struct SnapshotCheck {
    inventory: Arc<dyn DatasetInventory>,
    options: CheckOptions,

    job: String,
    ordered_datasets: Option<Vec<String>>,
    cache: Arc<Mutex<DatasetCache>>,

    failed: bool,
    total_count: u64,
    age_summary: Option<AgeSummary>,
}

impl SnapshotCheck {
    /// Creates a run with the given inventory and options.
    pub fn new(inventory: Arc<dyn DatasetInventory>, options: CheckOptions) -> Self {
        Self {
            inventory,
            options,
            job: String::new(),
            ordered_datasets: None,
            cache: Arc::new(Mutex::new(DatasetCache::new())),
            failed: false,
            total_count: 0,
            age_summary: None,
        }
    }

    /// Executes the run: resolve, preload, evaluate every dataset in sorted
    /// order, then append the OK summary unless a verdict was non-OK.
    ///
    /// Threshold breaches go to `sink`; only configuration and inventory
    /// failures surface as errors.
    pub async fn run(&mut self, job: &JobConfig, sink: &mut dyn StatusSink) -> Result<()> {
        self.job = job.name().to_string();
        self.ensure_loaded(job).await?;

        if self.options.mode.counts() {
            let rules = self.count_rules(job)?;
            self.check_counts(&rules, sink).await?;
        } else {
            let rules = self.age_rules(job)?;
            self.check_ages(&rules, SystemTime::now(), sink).await?;
        }

        self.summarise(sink);
        Ok(())
    }

    /// True when any verdict of this run was non-OK.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Clears the verdict state, keeping resolved datasets and the snapshot
    /// cache for re-evaluation.
    pub fn reset(&mut self) -> &mut Self {
        self.failed = false;
        self.total_count = 0;
        self.age_summary = None;
        self
    }

    async fn ensure_loaded(&mut self, job: &JobConfig) -> Result<()> {
        if self.ordered_datasets.is_some() {
            return Ok(());
        }
        let datasets = resolver::resolve(self.inventory.as_ref(), job).await?;
        let loader = SnapshotLoader::new(Arc::clone(&self.inventory), self.options.max_procs);
        loader.preload(&datasets, Arc::clone(&self.cache)).await?;
        self.ordered_datasets = Some(datasets);
        Ok(())
    }

    /// Cache lookup with a lazy single-dataset load as fallback. After a
    /// successful preload every resolved dataset hits the cache.
    async fn snapshots(&self, dataset: &str) -> Result<Vec<SnapshotVersion>> {
        if let Some(snapshots) = self.cache.lock().get(dataset) {
            return Ok(snapshots.clone());
        }
        let loader = SnapshotLoader::new(Arc::clone(&self.inventory), 1);
        let snapshots = loader.load_one(dataset).await?;
        self.cache.lock().insert(dataset.to_string(), snapshots.clone());
        Ok(snapshots)
    }

    fn ordered_datasets(&self) -> Vec<String> {
        self.ordered_datasets.clone().unwrap_or_default()
    }

    fn count_rules(&self, job: &JobConfig) -> Result<Vec<CountRule>> {
        match &self.options.rule_override {
            Some(RuleOverride::Count {
                prefix,
                warning,
                critical,
            }) => Ok(vec![CountRule {
                prefix: prefix.clone(),
                warning: *warning,
                critical: *critical,
            }]),
            Some(RuleOverride::Age { .. }) => Err(MonitorError::config(
                "count mode requires count thresholds, not durations",
            )),
            None => {
                let rules = job.monitor().count.clone();
                if rules.is_empty() {
                    return Err(MonitorError::config(NO_RULES));
                }
                Ok(rules)
            }
        }
    }

    fn age_rules(&self, job: &JobConfig) -> Result<Vec<AgeRule>> {
        match &self.options.rule_override {
            Some(RuleOverride::Age {
                prefix,
                warning,
                critical,
            }) => Ok(vec![AgeRule {
                prefix: prefix.clone(),
                warning: *warning,
                critical: *critical,
            }]),
            Some(RuleOverride::Count { .. }) => Err(MonitorError::config(
                "age mode requires duration thresholds, not counts",
            )),
            None => {
                let monitor = job.monitor();
                let rules = if self.options.mode.oldest() {
                    monitor.oldest.clone()
                } else {
                    monitor.latest.clone()
                };
                if rules.is_empty() {
                    return Err(MonitorError::config(NO_RULES));
                }
                Ok(rules)
            }
        }
    }

    async fn check_counts(&mut self, rules: &[CountRule], sink: &mut dyn StatusSink) -> Result<()> {
        let prefixes: Vec<&str> = rules.iter().map(|r| r.prefix.as_str()).collect();
        for dataset in self.ordered_datasets() {
            let snapshots = self.snapshots(&dataset).await?;
            let groups = group_by_prefix(&snapshots, &prefixes);
            for (rule, group) in rules.iter().zip(&groups) {
                match evaluate_count_rule(rule, &dataset, group) {
                    CountVerdict::Skip => {}
                    CountVerdict::Ok(count) => self.total_count += count,
                    CountVerdict::Breach { severity, message } => {
                        self.update_status(sink, severity, &message);
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    async fn check_ages(
        &mut self,
        rules: &[AgeRule],
        now: SystemTime,
        sink: &mut dyn StatusSink,
    ) -> Result<()> {
        let oldest = self.options.mode.oldest();
        let snapshot_type = self.options.mode.snapshot_type();
        let prefixes: Vec<&str> = rules.iter().map(|r| r.prefix.as_str()).collect();

        for dataset in self.ordered_datasets() {
            let snapshots = self.snapshots(&dataset).await?;
            let groups = group_by_prefix(&snapshots, &prefixes);
            for (rule, group) in rules.iter().zip(&groups) {
                let representative = group.representative(oldest);
                match evaluate_age_rule(rule, &dataset, snapshot_type, representative, now) {
                    AgeVerdict::Skip => {}
                    AgeVerdict::Ok { age, snapshot } => self.update_age_summary(age, snapshot),
                    AgeVerdict::Breach { severity, message } => {
                        self.update_status(sink, severity, &message);
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn update_age_summary(&mut self, age: Duration, snapshot: String) {
        let oldest = self.options.mode.oldest();
        let replace = match &self.age_summary {
            None => true,
            Some(current) if oldest => age > current.age,
            Some(current) => age < current.age,
        };
        if replace {
            self.age_summary = Some(AgeSummary { age, snapshot });
        }
    }

    fn summarise(&mut self, sink: &mut dyn StatusSink) {
        if self.failed {
            return;
        }
        let message = if self.options.mode.counts() {
            format!("all snapshots count: {}", self.total_count)
        } else {
            let (snapshot, age) = match &self.age_summary {
                Some(summary) => (summary.snapshot.as_str(), summary.age),
                None => ("", Duration::ZERO),
            };
            format!(
                "{} {snapshot:?}: {}",
                self.options.mode.snapshot_type(),
                format_duration(age)
            )
        };
        self.update_status(sink, Severity::Ok, &message);
    }

    fn update_status(&mut self, sink: &mut dyn StatusSink, severity: Severity, message: &str) {
        self.failed = self.failed || !severity.is_ok();
        sink.update_status(severity, &format!("job {:?}: {message}", self.job));
    }
}
