//! The snapshot cache and its refresh cycle.
//!
//! One [`Snapshot`] value holds everything the HTTP layer serves: the raw
//! lease-file text, the normalized records, the time of the last refresh
//! attempt, and that attempt's error, if any. A published snapshot is never
//! mutated. Every refresh builds a complete replacement and swaps it in
//! behind the lock, so a reader holds either the whole old state or the
//! whole new one.
//!
//! # Thread Safety
//!
//! [`LeaseCache::current`] clones an `Arc` out of a read guard; readers
//! never hold the lock across I/O. The write path belongs to the single
//! refresh task spawned in
//! [`DashboardServer::run`](crate::server::DashboardServer::run), so ticks
//! are strictly sequential and cannot interleave their writes.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::lease::{LeaseRecord, build_records};
use crate::parser::parse_leases;

/// One refresh attempt's complete outcome.
///
/// Exactly one of `leases`/`error` is populated: records on success, a
/// message on failure.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Wall-clock time of the last refresh attempt, successful or not.
    pub updated: DateTime<Utc>,

    /// The last successfully read lease-file text, served verbatim at
    /// `/dhcpd.txt`. A failed read keeps the previous text; a failed parse
    /// still replaces it, since new text was read even though it did not
    /// parse.
    pub raw: String,

    /// The normalized records, or `None` when the last refresh failed.
    pub leases: Option<Vec<LeaseRecord>>,

    /// The last refresh's failure message, or `None` when it succeeded.
    pub error: Option<String>,

    /// Whether an alias map is configured. Static for the process lifetime;
    /// lets the page decide whether to render the alias column.
    pub aliases_enabled: bool,
}

/// Periodically refreshed view of the lease file.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use dhcpdash::{Config, LeaseCache};
///
/// # fn example() -> dhcpdash::Result<()> {
/// let config = Arc::new(Config {
///     leases_file: Some("/var/db/dhcpd.leases".into()),
///     ..Config::default()
/// });
/// let cache = LeaseCache::bootstrap(config)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LeaseCache {
    snapshot: RwLock<Arc<Snapshot>>,
    config: Arc<Config>,
    leases_path: PathBuf,
}

impl LeaseCache {
    /// Reads and parses the lease file once, synchronously.
    ///
    /// This is the startup path; the periodic schedule only begins from a
    /// good first snapshot.
    ///
    /// # Errors
    ///
    /// Returns the read or parse failure. Unlike refresh-time failures,
    /// these propagate and abort startup.
    pub fn bootstrap(config: Arc<Config>) -> Result<Self> {
        let leases_path = config.leases_path()?.to_path_buf();
        let raw = std::fs::read_to_string(&leases_path)?;
        let entries = parse_leases(&raw)?;

        let now = Utc::now();
        let records = build_records(entries, now, config.aliases.as_ref());
        let snapshot = Snapshot {
            updated: now,
            raw,
            leases: Some(records),
            error: None,
            aliases_enabled: config.aliases_enabled(),
        };

        Ok(Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            config,
            leases_path,
        })
    }

    /// The current snapshot. Cheap; safe from any number of handler tasks.
    pub async fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// One refresh tick: re-read the file, rebuild, publish a new snapshot.
    ///
    /// Never fails. A read error keeps the previous `raw` text and records
    /// the message; a parse error records the message alongside the newly
    /// read text. Either way `leases` is cleared and `updated` advances, and
    /// the next tick starts from scratch.
    pub async fn refresh(&self) {
        let now = Utc::now();
        let aliases_enabled = self.config.aliases_enabled();

        let next = match tokio::fs::read_to_string(&self.leases_path).await {
            Ok(raw) => match parse_leases(&raw) {
                Ok(entries) => {
                    let records = build_records(entries, now, self.config.aliases.as_ref());
                    Snapshot {
                        updated: now,
                        raw,
                        leases: Some(records),
                        error: None,
                        aliases_enabled,
                    }
                }
                Err(error) => Snapshot {
                    updated: now,
                    raw,
                    leases: None,
                    error: Some(error.to_string()),
                    aliases_enabled,
                },
            },
            Err(error) => {
                let previous = self.current().await;
                Snapshot {
                    updated: now,
                    raw: previous.raw.clone(),
                    leases: None,
                    error: Some(error.to_string()),
                    aliases_enabled,
                }
            }
        };

        if let Some(message) = &next.error {
            warn!("lease refresh failed: {}", message);
        } else if let Some(records) = &next.leases {
            debug!(
                "refreshed {} leases from {}",
                records.len(),
                self.leases_path.display()
            );
        }

        *self.snapshot.write().await = Arc::new(next);
    }
}
