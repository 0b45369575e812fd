//! dhcpd.leases(5) parsing.
//!
//! The lease database written by isc-dhcpd is a sequence of `lease` stanzas:
//!
//! ```text
//! lease 192.168.1.10 {
//!   starts 4 2015/05/08 14:52:05;
//!   ends 4 2015/05/08 15:02:05;
//!   binding state active;
//!   hardware ethernet aa:bb:cc:dd:ee:ff;
//!   client-hostname "printer";
//! }
//! ```
//!
//! This module parses the subset the dashboard needs. Each statement value
//! is tagged as [`LeaseValue::Time`] or [`LeaseValue::Text`] at parse time,
//! so downstream formatting dispatches on the tag rather than inspecting
//! values. Timestamps are written by dhcpd in UTC; the literal `never` and
//! `epoch <seconds>` forms are also accepted.
//!
//! Anything the dashboard does not understand is skipped, not rejected:
//! comments, bare top-level statements (`server-duid`, `authoring-byte-order`)
//! and non-lease blocks (`failover peer ... state`). Structural damage is
//! rejected: a bad stanza address, a statement without its `;`, a malformed
//! date, or a block left open at end of input.

use std::net::Ipv4Addr;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{Error, Result};

/// Statement keys whose value is a timestamp, per dhcpd.leases(5).
const DATE_KEYS: [&str; 6] = ["starts", "ends", "tstp", "tsfp", "atsfp", "cltt"];

/// Multi-word keys that must not split at the first space.
const COMPOUND_KEYS: [&str; 3] = ["next binding state", "rewind binding state", "binding state"];

/// Timestamp layout used by dhcpd, minus the redundant leading weekday.
const DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// A parsed statement value, tagged by type.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaseValue {
    /// A timestamp (`starts`, `ends`, `cltt`, ...).
    Time(DateTime<Utc>),
    /// Any other token or quoted string, including the literal `never`.
    Text(String),
}

/// One `lease` stanza, as written by the DHCP server.
///
/// Multiple stanzas for the same lease are normal: dhcpd appends a new one
/// on every state change rather than rewriting in place. Collapsing them to
/// the current grant happens later, in [`crate::lease`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawLeaseEntry {
    /// The leased address, from the stanza header.
    pub ip: Ipv4Addr,
    /// Hardware address from `hardware ethernet`, if present.
    pub mac_address: Option<String>,
    /// Remaining statements, in file order.
    pub fields: Vec<(String, LeaseValue)>,
}

impl RawLeaseEntry {
    fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip,
            mac_address: None,
            fields: Vec::new(),
        }
    }

    /// Returns the named field's timestamp, if present and time-typed.
    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .and_then(|(_, value)| match value {
                LeaseValue::Time(date) => Some(*date),
                LeaseValue::Text(_) => None,
            })
    }

    /// When the lease was granted. `None` for stanzas without a `starts` date.
    pub fn starts(&self) -> Option<DateTime<Utc>> {
        self.timestamp("starts")
    }

    /// When the lease expires. `None` when absent or the literal `never`.
    pub fn ends(&self) -> Option<DateTime<Utc>> {
        self.timestamp("ends")
    }
}

/// Parses lease-file text into stanza entries, in file order.
///
/// # Errors
///
/// Returns [`Error::LeaseParse`] with a line number for a malformed stanza
/// address, a statement missing its terminating `;`, a malformed timestamp,
/// or a block left unterminated at end of input.
pub fn parse_leases(text: &str) -> Result<Vec<RawLeaseEntry>> {
    let mut entries = Vec::new();
    let mut current: Option<RawLeaseEntry> = None;
    let mut skip_depth: usize = 0;
    let mut open_line = 0;

    for (index, raw_line) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if skip_depth > 0 {
            if line.ends_with('{') {
                skip_depth += 1;
            } else if line == "}" {
                skip_depth -= 1;
            }
            continue;
        }

        if current.is_some() {
            if line == "}" {
                if let Some(done) = current.take() {
                    entries.push(done);
                }
            } else if line.ends_with('{') {
                // nested `on <events> { ... }` block; nothing to serve
                skip_depth = 1;
                open_line = line_number;
            } else if let Some(entry) = current.as_mut() {
                parse_statement(entry, line, line_number)?;
            }
            continue;
        }

        if let Some(header) = line
            .strip_prefix("lease ")
            .and_then(|rest| rest.strip_suffix('{'))
        {
            let header = header.trim();
            let ip = header.parse::<Ipv4Addr>().map_err(|_| {
                Error::LeaseParse(format!("line {line_number}: invalid lease address {header:?}"))
            })?;
            current = Some(RawLeaseEntry::new(ip));
            open_line = line_number;
        } else if line.ends_with('{') {
            skip_depth = 1;
            open_line = line_number;
        }
        // bare top-level statements carry nothing the dashboard serves
    }

    if skip_depth > 0 || current.is_some() {
        return Err(Error::LeaseParse(format!(
            "line {open_line}: block is never closed"
        )));
    }

    Ok(entries)
}

fn parse_statement(entry: &mut RawLeaseEntry, line: &str, line_number: usize) -> Result<()> {
    let Some(statement) = line.strip_suffix(';') else {
        return Err(Error::LeaseParse(format!(
            "line {line_number}: statement missing ';': {line:?}"
        )));
    };
    let statement = statement.trim();

    for key in DATE_KEYS {
        if let Some(value) = statement
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(' '))
        {
            let value = parse_date(value.trim(), line_number)?;
            entry.fields.push((key.to_string(), value));
            return Ok(());
        }
    }

    if let Some(rest) = statement.strip_prefix("hardware ") {
        match rest.split_once(' ') {
            Some(("ethernet", address)) => {
                entry.mac_address = Some(address.trim().to_string());
            }
            Some((kind, address)) => {
                entry.fields.push((
                    format!("hardware {kind}"),
                    LeaseValue::Text(address.trim().to_string()),
                ));
            }
            None => {
                entry
                    .fields
                    .push(("hardware".to_string(), LeaseValue::Text(rest.to_string())));
            }
        }
        return Ok(());
    }

    for key in COMPOUND_KEYS {
        if let Some(value) = statement
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(' '))
        {
            entry
                .fields
                .push((key.to_string(), LeaseValue::Text(value.trim().to_string())));
            return Ok(());
        }
    }

    match statement.split_once(' ') {
        Some((key, value)) => {
            entry
                .fields
                .push((key.to_string(), LeaseValue::Text(unquote(value.trim()))));
        }
        // flag statements such as `abandoned;`
        None => {
            entry
                .fields
                .push((statement.to_string(), LeaseValue::Text(String::new())));
        }
    }

    Ok(())
}

fn parse_date(value: &str, line_number: usize) -> Result<LeaseValue> {
    if value == "never" {
        return Ok(LeaseValue::Text("never".to_string()));
    }

    if let Some(seconds) = value.strip_prefix("epoch ") {
        let seconds: i64 = seconds.trim().parse().map_err(|_| {
            Error::LeaseParse(format!("line {line_number}: invalid epoch date {value:?}"))
        })?;
        let date = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
            Error::LeaseParse(format!("line {line_number}: epoch date out of range {value:?}"))
        })?;
        return Ok(LeaseValue::Time(date));
    }

    let candidate = value
        .split_once(' ')
        .map(|(_, rest)| rest.trim())
        .unwrap_or(value);
    let parsed = NaiveDateTime::parse_from_str(candidate, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, DATE_FORMAT))
        .map_err(|_| Error::LeaseParse(format!("line {line_number}: invalid date {value:?}")))?;

    Ok(LeaseValue::Time(parsed.and_utc()))
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}
