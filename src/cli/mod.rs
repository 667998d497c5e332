//! Command-line interface for the snapshot monitor.
//!
//! `snapmon` is a monitoring-plugin style check: it evaluates one job's
//! snapshot thresholds and exits with the conventional plugin code
//! (OK=0, WARNING=1, CRITICAL=2, UNKNOWN=3), printing a single status line.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::core::{Config, MonitorError, Result};
use crate::inventory::ZfsInventory;
use crate::monitor::{CheckMode, CheckOptions, RuleOverride, SnapshotCheck};
use crate::response::{CheckResponse, Severity};

/// Snapshot age and count monitoring for ZFS replication jobs.
#[derive(Parser, Debug)]
#[command(name = "snapmon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Job configuration file
    #[arg(short, long, env = "SNAPMON_CONFIG", default_value = "/etc/snapmon/snapmon.yml")]
    pub config: PathBuf,

    /// Name of the job to check
    #[arg(short, long)]
    pub job: String,

    /// Snapshot name prefix; replaces the job's configured rules with a
    /// single rule built from --warn/--crit
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Warning threshold: a duration, or a count with --counts
    #[arg(short, long)]
    pub warn: Option<String>,

    /// Critical threshold: a duration, or a count with --counts
    #[arg(long)]
    pub crit: Option<String>,

    /// Check the oldest snapshot of each group instead of the latest
    #[arg(long)]
    pub oldest: bool,

    /// Check snapshot counts instead of ages
    #[arg(long, conflicts_with = "oldest")]
    pub counts: bool,

    /// Concurrency limit for snapshot loading (0 = available parallelism)
    #[arg(long, default_value_t = 0)]
    pub max_procs: usize,

    /// Enable debug logging
    #[arg(short, long, env = "SNAPMON_DEBUG")]
    pub debug: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let log_level = if self.debug { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_env("SNAPMON_LOG")
            .unwrap_or_else(|_| EnvFilter::new(log_level));

        // status line goes to stdout, diagnostics to stderr
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| MonitorError::config(format!("failed to initialize logging: {e}")))?;

        Ok(())
    }

    /// The check mode selected by the mode flags.
    pub fn mode(&self) -> CheckMode {
        if self.counts {
            CheckMode::Counts
        } else if self.oldest {
            CheckMode::AgeOldest
        } else {
            CheckMode::AgeLatest
        }
    }

    /// Builds the run options, parsing threshold flags per mode.
    pub fn check_options(&self) -> Result<CheckOptions> {
        Ok(CheckOptions {
            mode: self.mode(),
            max_procs: self.max_procs,
            rule_override: self.rule_override()?,
        })
    }

    fn rule_override(&self) -> Result<Option<RuleOverride>> {
        let Some(prefix) = &self.prefix else {
            return Ok(None);
        };
        let crit = self
            .crit
            .as_deref()
            .ok_or_else(|| MonitorError::config("--prefix requires --crit"))?;

        let rule = if self.counts {
            RuleOverride::Count {
                prefix: prefix.clone(),
                warning: self.warn.as_deref().map(parse_count).transpose()?.unwrap_or(0),
                critical: parse_count(crit)?,
            }
        } else {
            RuleOverride::Age {
                prefix: prefix.clone(),
                warning: self
                    .warn
                    .as_deref()
                    .map(parse_duration)
                    .transpose()?
                    .unwrap_or(Duration::ZERO),
                critical: parse_duration(crit)?,
            }
        };
        Ok(Some(rule))
    }
}

fn parse_duration(s: &str) -> Result<Duration> {
    humantime::parse_duration(s)
        .map_err(|e| MonitorError::config(format!("invalid duration {s:?}: {e}")))
}

fn parse_count(s: &str) -> Result<u64> {
    s.parse()
        .map_err(|_| MonitorError::config(format!("invalid count {s:?}")))
}

/// Execute the check and return the process exit code.
pub async fn execute(cli: Cli) -> i32 {
    if let Err(e) = cli.init_logging() {
        eprintln!("{}: {e}", Severity::Unknown);
        return Severity::Unknown.exit_code();
    }

    match run_check(&cli).await {
        Ok(response) => {
            println!("{}", response.output_line());
            response.exit_code()
        }
        Err(e) => {
            tracing::debug!(category = e.category(), "check failed");
            println!("{}: job {:?}: {e}", Severity::Unknown, cli.job);
            Severity::Unknown.exit_code()
        }
    }
}

async fn run_check(cli: &Cli) -> Result<CheckResponse> {
    let config = Config::load(&cli.config)?;
    let job = config.job(&cli.job)?;

    let inventory = Arc::new(ZfsInventory::new(config.global.zfs_bin.clone()));
    let mut check = SnapshotCheck::new(inventory, cli.check_options()?);

    let mut response = CheckResponse::new(format!("job {:?}: snapshots checked", cli.job));
    check.run(job, &mut response).await?;
    Ok(response)
}
