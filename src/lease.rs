//! Lease record normalization and deduplication.
//!
//! dhcpd appends a new stanza to the lease file every time a lease changes
//! state, so one address routinely has many historical stanzas. This module
//! reduces the parsed stanzas to the current view the dashboard serves:
//!
//! 1. deduplicate per (IP, hardware address), keeping the stanza with the
//!    latest `starts` timestamp
//! 2. sort ascending by the address's 32-bit numeric value
//! 3. normalize each survivor into a [`LeaseRecord`]: expiry flag, alias
//!    lookup, and human-readable timestamp deltas
//!
//! Normalization happens once per refresh. `expired` and the `human` strings
//! are relative to the refresh time, not the request time, so they can lag
//! real time by up to one refresh interval.

use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::parser::{LeaseValue, RawLeaseEntry};

/// A timestamp paired with its human-readable delta, e.g. "12 minutes ago".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedTime {
    pub date: DateTime<Utc>,
    pub human: String,
}

/// A normalized field value as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    Time(AnnotatedTime),
    Text(String),
}

/// One lease as served to the dashboard.
///
/// Unique per (IP, hardware address) within a snapshot. Stanza fields the
/// dashboard has no opinion about pass through in `fields`, with timestamps
/// annotated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaseRecord {
    /// The leased address. Serializes as a dotted-quad string.
    pub ip: Ipv4Addr,

    /// Hardware address, absent for non-Ethernet stanzas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,

    /// True iff `ends` was strictly before the refresh wall-clock time.
    /// A lease that never ends is never expired.
    pub expired: bool,

    /// Display name for the hardware address, from the configured alias map.
    /// `None` (omitted from JSON) when no map is configured; empty for
    /// unmapped addresses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// All other stanza fields, keyed by statement name.
    #[serde(flatten)]
    pub fields: BTreeMap<String, RecordValue>,
}

impl LeaseRecord {
    /// The annotated `starts` timestamp, if the stanza had one.
    pub fn starts(&self) -> Option<&AnnotatedTime> {
        self.time_field("starts")
    }

    /// The annotated `ends` timestamp, if the stanza had one.
    pub fn ends(&self) -> Option<&AnnotatedTime> {
        self.time_field("ends")
    }

    fn time_field(&self, key: &str) -> Option<&AnnotatedTime> {
        match self.fields.get(key) {
            Some(RecordValue::Time(time)) => Some(time),
            _ => None,
        }
    }
}

/// Collapses stanzas sharing an (IP, hardware address) pair into the most
/// recent one.
///
/// A stanza replaces the stored one only when its `starts` is strictly
/// greater, so on equal timestamps the first stanza seen wins. A stanza
/// without a `starts` date orders before any stanza that has one. Output
/// order is unspecified; the caller sorts.
pub fn dedupe_latest(entries: Vec<RawLeaseEntry>) -> Vec<RawLeaseEntry> {
    let mut hosts: HashMap<(Ipv4Addr, Option<String>), RawLeaseEntry> = HashMap::new();

    for entry in entries {
        let key = (entry.ip, entry.mac_address.clone());
        match hosts.get(&key) {
            None => {
                hosts.insert(key, entry);
            }
            Some(stored) => {
                if entry.starts() > stored.starts() {
                    hosts.insert(key, entry);
                }
            }
        }
    }

    hosts.into_values().collect()
}

/// Orders entries ascending by the address's numeric value.
///
/// Dotted-quad strings sort lexically (`10.0.0.1` before `9.0.0.1`);
/// comparing the 32-bit value does not. The hardware address is the
/// secondary key so one IP with several MACs keeps a stable order.
pub fn sort_by_ip(entries: &mut [RawLeaseEntry]) {
    entries.sort_by_key(|entry| (u32::from(entry.ip), entry.mac_address.clone()));
}

/// Converts one deduplicated stanza into the record shape the dashboard
/// serves.
///
/// `now` is the refresh wall-clock time; `aliases` is the configured
/// hardware-address map, if any.
pub fn normalize(
    entry: RawLeaseEntry,
    now: DateTime<Utc>,
    aliases: Option<&HashMap<String, String>>,
) -> LeaseRecord {
    let expired = entry.ends().is_some_and(|ends| ends < now);

    let alias = aliases.map(|map| {
        entry
            .mac_address
            .as_ref()
            .and_then(|mac| map.get(mac).cloned())
            .unwrap_or_default()
    });

    let mut fields = BTreeMap::new();
    for (key, value) in entry.fields {
        let value = match value {
            LeaseValue::Time(date) => RecordValue::Time(AnnotatedTime {
                date,
                human: human_time(now, date),
            }),
            LeaseValue::Text(text) => RecordValue::Text(text),
        };
        fields.insert(key, value);
    }

    LeaseRecord {
        ip: entry.ip,
        mac_address: entry.mac_address,
        expired,
        alias,
        fields,
    }
}

/// Full pipeline: deduplicate, sort, normalize.
pub fn build_records(
    entries: Vec<RawLeaseEntry>,
    now: DateTime<Utc>,
    aliases: Option<&HashMap<String, String>>,
) -> Vec<LeaseRecord> {
    let mut entries = dedupe_latest(entries);
    sort_by_ip(&mut entries);
    entries
        .into_iter()
        .map(|entry| normalize(entry, now, aliases))
        .collect()
}

/// Formats `date` relative to `now`: "42 seconds ago", "in 3 hours".
pub fn human_time(now: DateTime<Utc>, date: DateTime<Utc>) -> String {
    let delta = (now - date).num_seconds();
    let future = delta < 0;
    let seconds = delta.unsigned_abs();

    let (amount, unit) = if seconds < 60 {
        (seconds, "second")
    } else if seconds < 3_600 {
        (seconds / 60, "minute")
    } else if seconds < 86_400 {
        (seconds / 3_600, "hour")
    } else if seconds < 604_800 {
        (seconds / 86_400, "day")
    } else if seconds < 2_592_000 {
        (seconds / 604_800, "week")
    } else if seconds < 31_536_000 {
        (seconds / 2_592_000, "month")
    } else {
        (seconds / 31_536_000, "year")
    };

    let plural = if amount == 1 { "" } else { "s" };
    if future {
        format!("in {amount} {unit}{plural}")
    } else {
        format!("{amount} {unit}{plural} ago")
    }
}
