//! Multi-pass discovery reconciliation.
//!
//! Runs N sequential ping sweeps over the target prefix, merges the passes
//! into one record per address (a later pass supersedes an earlier one),
//! sorts by the numeric value of the final octet, and diffs the merged
//! address set against the baseline persisted by the previous run.

use std::collections::{HashMap, HashSet};

use lanwatch_core::{HostRecord, ReconcileReport, SettingsStore};

use crate::error::Result;
use crate::scanner::HostProbe;

/// Drives discovery passes and owns the baseline read/write for one run.
pub struct Reconciler<'a, P> {
    probe: &'a P,
    store: &'a SettingsStore,
}

impl<'a, P: HostProbe> Reconciler<'a, P> {
    pub fn new(probe: &'a P, store: &'a SettingsStore) -> Self {
        Self { probe, store }
    }

    /// Run a full reconciliation: sweep, merge, sort, diff, persist.
    ///
    /// `prefix` and `passes` fall back to the settings file when absent. A
    /// requested pass count below 1 is clamped to 1: a run was asked for,
    /// so at least one sweep happens.
    ///
    /// Any sweep failure aborts the whole run and propagates; there is no
    /// partial-result salvage across passes. A run that found no hosts at
    /// all returns an empty report and leaves the baseline untouched, so a
    /// transient false-negative sweep is not recorded as everything having
    /// left the network.
    pub async fn run(&self, prefix: Option<&str>, passes: Option<u32>) -> Result<ReconcileReport> {
        let settings = self.store.load()?;
        let prefix = prefix.unwrap_or_else(|| settings.base_ip());
        let passes = passes.unwrap_or_else(|| settings.attempts()).max(1);

        tracing::info!(prefix, passes, "Starting discovery run");

        let mut merged: HashMap<String, HostRecord> = HashMap::new();
        for pass in 0..passes {
            let hosts = self.probe.discover(prefix).await?;
            tracing::debug!(pass, found = hosts.len(), "Discovery pass complete");
            for host in hosts {
                // Last-write-wins per address across passes.
                merged.insert(host.address.clone(), host);
            }
        }

        if merged.is_empty() {
            tracing::info!(prefix, "No hosts found, baseline left untouched");
            return Ok(ReconcileReport::default());
        }

        let mut hosts: Vec<HostRecord> = merged.into_values().collect();
        hosts.sort_by_key(|h| h.last_octet());

        let current: Vec<String> = hosts.iter().map(|h| h.address.clone()).collect();
        let current_set: HashSet<String> = current.iter().cloned().collect();
        let baseline: HashSet<String> = settings.baseline().into_iter().collect();

        let new_addresses = &current_set - &baseline;
        let removed_addresses = &baseline - &current_set;

        self.store.set_baseline(&current)?;

        tracing::info!(
            hosts = hosts.len(),
            new = new_addresses.len(),
            removed = removed_addresses.len(),
            "Discovery run complete"
        );

        Ok(ReconcileReport {
            hosts,
            new_addresses,
            removed_addresses,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use lanwatch_core::HostStatus;

    use super::*;
    use crate::error::DiscoverError;

    /// Scripted probe: pops one pre-seeded pass per call. Exhausted passes
    /// report nothing; a seeded `Err` aborts like a real scan failure.
    struct FakeProbe {
        passes: Mutex<VecDeque<Result<Vec<HostRecord>>>>,
        calls: Mutex<u32>,
    }

    impl FakeProbe {
        fn new(passes: Vec<Result<Vec<HostRecord>>>) -> Self {
            Self {
                passes: Mutex::new(passes.into()),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl HostProbe for FakeProbe {
        async fn discover(&self, _prefix: &str) -> Result<Vec<HostRecord>> {
            *self.calls.lock().unwrap() += 1;
            self.passes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn host(address: &str) -> HostRecord {
        HostRecord {
            address: address.to_string(),
            hostname: String::new(),
            mac: None,
            status: HostStatus::Up,
        }
    }

    fn named_host(address: &str, hostname: &str) -> HostRecord {
        HostRecord {
            hostname: hostname.to_string(),
            ..host(address)
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("lanwatch.toml"))
    }

    #[tokio::test]
    async fn test_last_pass_wins_per_address() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let probe = FakeProbe::new(vec![
            Ok(vec![named_host("10.0.0.5", "old-name"), host("10.0.0.7")]),
            Ok(vec![named_host("10.0.0.5", "new-name")]),
        ]);

        let report = Reconciler::new(&probe, &store)
            .run(Some("10.0.0.0"), Some(2))
            .await
            .unwrap();

        assert_eq!(report.hosts.len(), 2);
        let merged = report
            .hosts
            .iter()
            .find(|h| h.address == "10.0.0.5")
            .unwrap();
        assert_eq!(merged.hostname, "new-name");
    }

    #[tokio::test]
    async fn test_hosts_sorted_by_numeric_last_octet() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let probe = FakeProbe::new(vec![Ok(vec![
            host("10.0.0.9"),
            host("10.0.0.10"),
            host("10.0.0.2"),
        ])]);

        let report = Reconciler::new(&probe, &store)
            .run(Some("10.0.0.0"), Some(1))
            .await
            .unwrap();

        let order: Vec<&str> = report.hosts.iter().map(|h| h.address.as_str()).collect();
        assert_eq!(order, vec!["10.0.0.2", "10.0.0.9", "10.0.0.10"]);
    }

    #[tokio::test]
    async fn test_diff_against_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .set_baseline(&["10.0.0.2".to_string(), "10.0.0.3".to_string()])
            .unwrap();

        let probe = FakeProbe::new(vec![Ok(vec![host("10.0.0.3"), host("10.0.0.4")])]);
        let report = Reconciler::new(&probe, &store)
            .run(Some("10.0.0.0"), Some(1))
            .await
            .unwrap();

        assert_eq!(
            report.new_addresses,
            HashSet::from(["10.0.0.4".to_string()])
        );
        assert_eq!(
            report.removed_addresses,
            HashSet::from(["10.0.0.2".to_string()])
        );
        assert!(report.new_addresses.is_disjoint(&report.removed_addresses));

        // The run's own address list becomes the next baseline.
        assert_eq!(store.load().unwrap().results.last, "10.0.0.3,10.0.0.4");
    }

    #[tokio::test]
    async fn test_unchanged_network_yields_empty_diffs() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let passes = || Ok(vec![host("10.0.0.2"), host("10.0.0.3")]);

        let probe = FakeProbe::new(vec![passes()]);
        Reconciler::new(&probe, &store)
            .run(Some("10.0.0.0"), Some(1))
            .await
            .unwrap();

        let probe = FakeProbe::new(vec![passes()]);
        let second = Reconciler::new(&probe, &store)
            .run(Some("10.0.0.0"), Some(1))
            .await
            .unwrap();

        assert!(second.new_addresses.is_empty());
        assert!(second.removed_addresses.is_empty());
        assert_eq!(second.hosts.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_hosts_leaves_baseline_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .set_baseline(&["10.0.0.2".to_string(), "10.0.0.3".to_string()])
            .unwrap();

        let probe = FakeProbe::new(vec![Ok(vec![]), Ok(vec![]), Ok(vec![])]);
        let report = Reconciler::new(&probe, &store)
            .run(Some("10.0.0.0"), Some(3))
            .await
            .unwrap();

        assert!(report.is_empty());
        assert!(report.new_addresses.is_empty());
        assert!(report.removed_addresses.is_empty());
        assert_eq!(store.load().unwrap().results.last, "10.0.0.2,10.0.0.3");
    }

    #[tokio::test]
    async fn test_pass_count_below_one_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let probe = FakeProbe::new(vec![Ok(vec![host("10.0.0.1")])]);

        let report = Reconciler::new(&probe, &store)
            .run(Some("10.0.0.0"), Some(0))
            .await
            .unwrap();

        assert_eq!(probe.call_count(), 1);
        assert_eq!(report.hosts.len(), 1);
    }

    #[tokio::test]
    async fn test_defaults_come_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set_attempts(2).unwrap();

        let probe = FakeProbe::new(vec![Ok(vec![host("10.0.0.1")]), Ok(vec![host("10.0.0.2")])]);
        let report = Reconciler::new(&probe, &store)
            .run(None, None)
            .await
            .unwrap();

        assert_eq!(probe.call_count(), 2);
        assert_eq!(report.hosts.len(), 2);
    }

    #[tokio::test]
    async fn test_scan_failure_aborts_run_and_keeps_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set_baseline(&["10.0.0.2".to_string()]).unwrap();

        let probe = FakeProbe::new(vec![
            Ok(vec![host("10.0.0.3")]),
            Err(DiscoverError::NmapFailed {
                code: 1,
                stderr: "interface down".to_string(),
            }),
        ]);

        let err = Reconciler::new(&probe, &store)
            .run(Some("10.0.0.0"), Some(3))
            .await
            .unwrap_err();

        assert!(matches!(err, DiscoverError::NmapFailed { .. }));
        // No partial-result salvage: the first pass's findings were discarded.
        assert_eq!(store.load().unwrap().results.last, "10.0.0.2");
    }
}
