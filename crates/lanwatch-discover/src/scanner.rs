//! Nmap process wrapper.
//!
//! Executes nmap as a child process via `tokio::process::Command` and turns
//! the XML output into [`HostRecord`]s. Passes run strictly one at a time;
//! the scanner holds the network interface exclusively while sweeping.

use std::time::Instant;

use ipnet::Ipv4Net;
use lanwatch_core::{HostRecord, HostStatus};
use tokio::process::Command;
use uuid::Uuid;

use crate::error::{DiscoverError, Result};
use crate::nmap_xml::{self, NmapRun};

/// Source of discovery passes.
///
/// The production implementation shells out to nmap; tests substitute a
/// scripted probe.
#[allow(async_fn_in_trait)]
pub trait HostProbe {
    async fn discover(&self, prefix: &str) -> Result<Vec<HostRecord>>;
}

/// Result of a single ping sweep.
pub struct ScanPass {
    /// Unique ID for this pass, for log correlation.
    pub scan_id: Uuid,
    /// The swept target expression, e.g. `192.168.1.0/24`.
    pub target: String,
    /// Hosts reported by nmap, in scanner order.
    pub hosts: Vec<HostRecord>,
    /// Wall-clock duration of the sweep.
    pub duration: std::time::Duration,
}

/// Wrapper around the nmap binary.
pub struct NmapScanner {
    nmap_path: String,
}

impl NmapScanner {
    pub fn new(nmap_path: &str) -> Self {
        Self {
            nmap_path: nmap_path.to_string(),
        }
    }

    /// Verify nmap is installed and accessible.
    pub async fn verify_installation(&self) -> Result<String> {
        let output = Command::new(&self.nmap_path)
            .arg("--version")
            .output()
            .await
            .map_err(|_| DiscoverError::NmapNotFound {
                path: self.nmap_path.clone(),
            })?;

        String::from_utf8(output.stdout).map_err(|e| DiscoverError::XmlParse(e.to_string()))
    }

    /// Run one ping sweep (`-sn`) over `{prefix}/24`.
    ///
    /// Nmap is invoked with `-oX -` to write XML to stdout. A non-zero exit
    /// or unparseable output is an error; a sweep that found nothing is not.
    pub async fn ping_scan(&self, prefix: &str) -> Result<ScanPass> {
        let target = validate_target(prefix)?;
        let scan_id = Uuid::new_v4();
        let start = Instant::now();

        tracing::info!(
            scan_id = %scan_id,
            target = %target,
            "Starting ping sweep"
        );

        let output = Command::new(&self.nmap_path)
            .arg("-sn")
            .arg("-oX")
            .arg("-")
            .arg("--noninteractive")
            .arg(&target)
            .output()
            .await
            .map_err(|e| DiscoverError::NmapNotFound {
                path: format!("{}: {e}", self.nmap_path),
            })?;

        let duration = start.elapsed();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(DiscoverError::NmapFailed {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        let nmap_run = nmap_xml::parse_nmap_xml(&output.stdout)?;
        let hosts = host_records(&nmap_run);

        tracing::info!(
            scan_id = %scan_id,
            target = %target,
            hosts = hosts.len(),
            duration_ms = duration.as_millis(),
            "Ping sweep complete"
        );

        Ok(ScanPass {
            scan_id,
            target,
            hosts,
            duration,
        })
    }
}

impl HostProbe for NmapScanner {
    async fn discover(&self, prefix: &str) -> Result<Vec<HostRecord>> {
        Ok(self.ping_scan(prefix).await?.hosts)
    }
}

/// Turn a base address like `192.168.1.0` into the `/24` target expression,
/// rejecting anything that does not parse as an IPv4 network.
fn validate_target(prefix: &str) -> Result<String> {
    let target = format!("{prefix}/24");
    target
        .parse::<Ipv4Net>()
        .map_err(|e| DiscoverError::InvalidPrefix {
            prefix: prefix.to_string(),
            reason: e.to_string(),
        })?;
    Ok(target)
}

/// Convert parsed nmap output into host records. Hosts without an IPv4
/// address are dropped; a missing hostname degrades to the empty string and
/// a missing MAC stays absent.
pub fn host_records(run: &NmapRun) -> Vec<HostRecord> {
    run.hosts
        .iter()
        .filter_map(|h| {
            Some(HostRecord {
                address: h.ipv4()?.to_string(),
                hostname: h.hostname().unwrap_or("").to_string(),
                mac: h.mac().map(String::from),
                status: HostStatus::parse(h.state()),
            })
        })
        .collect()
}
