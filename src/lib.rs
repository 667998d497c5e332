//! Snapmon - snapshot monitoring for ZFS replication jobs.
//!
//! Snapmon inspects the snapshot inventories of the datasets a replication
//! job manages, classifies snapshots by name prefix and checks age or count
//! thresholds, reporting monitoring-plugin style verdicts.
//!
//! # Architecture
//!
//! - `core`: domain models, job configuration, errors
//! - `inventory`: dataset/snapshot access (zfs command or in-memory)
//! - `monitor`: resolution, concurrent preloading, grouping, rule evaluation
//! - `response`: severity levels and the status sink
//! - `cli`: command-line check wrapper
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use snapmon::core::Config;
//! use snapmon::inventory::ZfsInventory;
//! use snapmon::monitor::{CheckOptions, SnapshotCheck};
//! use snapmon::response::CheckResponse;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("/etc/snapmon/snapmon.yml")?;
//!     let job = config.job("backups")?;
//!
//!     let inventory = Arc::new(ZfsInventory::new(config.global.zfs_bin.clone()));
//!     let mut check = SnapshotCheck::new(inventory, CheckOptions::default());
//!     let mut response = CheckResponse::new("snapshots checked");
//!     check.run(job, &mut response).await?;
//!
//!     println!("{}", response.output_line());
//!     std::process::exit(response.exit_code());
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod inventory;
pub mod monitor;
pub mod response;

pub use crate::core::{Config, MonitorError, Result};
pub use crate::monitor::{CheckMode, CheckOptions, SnapshotCheck};
pub use crate::response::{CheckResponse, Severity, StatusSink};
