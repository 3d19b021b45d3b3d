//! Core domain types for lanwatch host discovery.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Reported liveness of a discovered host.
///
/// A ping sweep reports a small set of states; anything other than `up` is
/// carried through opaquely rather than interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostStatus {
    Up,
    Other(String),
}

impl HostStatus {
    pub fn parse(state: &str) -> Self {
        if state == "up" {
            Self::Up
        } else {
            Self::Other(state.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Up => "up",
            Self::Other(s) => s,
        }
    }
}

/// A single host seen during one discovery pass.
///
/// Records are created fresh on every pass and never mutated; within one
/// reconciliation run a later pass's record for the same address supersedes
/// the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Dotted-quad IPv4 address, the unique key within a run.
    pub address: String,
    /// Reverse-resolved name; empty when the scanner reported none.
    pub hostname: String,
    /// Hardware address. Only present when the scanner ran with elevated
    /// privileges; absence is not an error.
    pub mac: Option<String>,
    pub status: HostStatus,
}

impl HostRecord {
    /// Numeric value of the final dotted segment, used as the sort key for
    /// host tables. `"10.0.0.10"` must sort after `"10.0.0.9"`, which a
    /// plain string compare gets wrong.
    pub fn last_octet(&self) -> u32 {
        self.address
            .rsplit('.')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(u32::MAX)
    }
}

/// Outcome of one reconciliation run: the merged host view plus the diff
/// against the previously persisted baseline.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// One record per unique address, sorted ascending by last octet.
    pub hosts: Vec<HostRecord>,
    /// Addresses present now but absent from the prior run. Unordered.
    pub new_addresses: HashSet<String>,
    /// Addresses present in the prior run but absent now. Unordered.
    pub removed_addresses: HashSet<String>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
