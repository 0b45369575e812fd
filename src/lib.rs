//! # dhcpdash
//!
//! An HTTP dashboard for isc-dhcpd lease files.
//!
//! ## Features
//!
//! - Parses dhcpd.leases(5) into structured, deduplicated records
//! - One record per (IP, hardware address), latest grant wins
//! - Numeric IP ordering and human-readable timestamp deltas
//! - Periodic re-read on a fixed interval; failures never disturb readers
//! - JSON, raw-text, and static-page views over HTTP
//! - Optional MAC-to-name aliases from the config file
//!
//! ## Quick Start
//!
//! ```no_run
//! use dhcpdash::{Config, DashboardServer};
//!
//! #[tokio::main]
//! async fn main() -> dhcpdash::Result<()> {
//!     let config = Config {
//!         leases_file: Some("/var/db/dhcpd.leases".into()),
//!         ..Config::default()
//!     };
//!     config.validate()?;
//!     let server = DashboardServer::new(config)?;
//!     server.run().await
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`Config`] - Dashboard configuration (listen address, lease file, aliases)
//! - [`parser`] - dhcpd.leases(5) stanza parsing with tagged values
//! - [`lease`] - Deduplication, numeric-IP sorting, record normalization
//! - [`LeaseCache`] - Periodically refreshed snapshot, swapped atomically
//! - [`DashboardServer`] - The axum HTTP surface

pub mod cache;
pub mod config;
pub mod error;
pub mod lease;
pub mod parser;
pub mod server;

pub use cache::{LeaseCache, Snapshot};
pub use config::Config;
pub use error::{Error, Result};
pub use lease::{AnnotatedTime, LeaseRecord, RecordValue};
pub use parser::{LeaseValue, RawLeaseEntry};
pub use server::DashboardServer;
