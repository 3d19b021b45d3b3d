//! Persistent settings store.
//!
//! A single small TOML file carries three sections:
//!
//! ```toml
//! [config]
//! BASE_IP_NMAP = "192.168.1.0"
//! NUM_ATTEMPTS = "3"
//!
//! [alias]
//! "AA:BB:CC:DD:EE:FF" = "router"
//!
//! [results]
//! last = "192.168.1.1,192.168.1.23"
//! ```
//!
//! `[config]` holds scan defaults, `[alias]` maps MAC addresses to labels,
//! and `[results] last` is the comma-joined baseline from the most recent
//! run. Every mutation reloads the file, rewrites it whole, and returns the
//! new snapshot; no shared mutable configuration object exists.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SettingsError};

/// Base address of the /24 swept when the settings file carries no override.
pub const DEFAULT_BASE_IP: &str = "192.168.1.0";

/// Discovery passes per run when the settings file carries no override.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// In-memory snapshot of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub config: ScanConfig,
    /// MAC address -> label, ordered by key as stored.
    #[serde(default)]
    pub alias: BTreeMap<String, String>,
    #[serde(default)]
    pub results: LastRun,
}

/// The `[config]` section. Values are kept as strings, matching the file
/// format; accessors on [`Settings`] parse and apply defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(rename = "BASE_IP_NMAP", default, skip_serializing_if = "Option::is_none")]
    pub base_ip: Option<String>,
    #[serde(rename = "NUM_ATTEMPTS", default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<String>,
}

/// The `[results]` section: the persisted baseline address list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LastRun {
    #[serde(default)]
    pub last: String,
}

impl Settings {
    /// Effective base address for the scan prefix.
    pub fn base_ip(&self) -> &str {
        self.config.base_ip.as_deref().unwrap_or(DEFAULT_BASE_IP)
    }

    /// Effective number of discovery passes. An unparseable stored value
    /// falls back to the default.
    pub fn attempts(&self) -> u32 {
        self.config
            .attempts
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_ATTEMPTS)
    }

    /// Case-insensitive alias lookup: exact key first, then a
    /// case-insensitive sweep. Absence of a match is not an error.
    pub fn alias_for(&self, mac: &str) -> Option<&str> {
        if let Some(label) = self.alias.get(mac) {
            return Some(label);
        }
        self.alias
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(mac))
            .map(|(_, label)| label.as_str())
    }

    /// Baseline address list from the previous run, empty if none was
    /// persisted yet.
    pub fn baseline(&self) -> Vec<String> {
        if self.results.last.is_empty() {
            Vec::new()
        } else {
            self.results.last.split(',').map(str::to_string).collect()
        }
    }

    /// Recognized config keys with their effective values, for display.
    pub fn config_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("BASE_IP_NMAP", self.base_ip().to_string()),
            ("NUM_ATTEMPTS", self.attempts().to_string()),
        ]
    }
}

/// Handle to the settings file on disk.
///
/// `load` returns an owned snapshot; mutations rewrite the whole file and
/// hand back the state as written.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the settings file. A missing file is "no configuration":
    /// defaults all around, not an error.
    pub fn load(&self) -> Result<Settings> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Settings file missing, using defaults");
                Ok(Settings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let text = toml::to_string(settings)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    /// Change the default pass count. Values below 1 are rejected and the
    /// stored value is retained.
    pub fn set_attempts(&self, attempts: u32) -> Result<Settings> {
        if attempts < 1 {
            return Err(SettingsError::InvalidAttempts(attempts));
        }
        let mut settings = self.load()?;
        settings.config.attempts = Some(attempts.to_string());
        self.save(&settings)?;
        Ok(settings)
    }

    /// Change the default base address for the scan prefix.
    pub fn set_base_ip(&self, base_ip: &str) -> Result<Settings> {
        let mut settings = self.load()?;
        settings.config.base_ip = Some(base_ip.to_string());
        self.save(&settings)?;
        Ok(settings)
    }

    /// Add or replace an alias entry. The key is stored as given; lookup is
    /// case-insensitive.
    pub fn add_alias(&self, mac: &str, label: &str) -> Result<Settings> {
        let mut settings = self.load()?;
        settings.alias.insert(mac.to_string(), label.to_string());
        self.save(&settings)?;
        Ok(settings)
    }

    /// Remove the alias at the given position in stored key order. An
    /// out-of-range index leaves the file untouched.
    pub fn remove_alias(&self, index: usize) -> Result<Settings> {
        let mut settings = self.load()?;
        let key = settings
            .alias
            .keys()
            .nth(index)
            .cloned()
            .ok_or(SettingsError::AliasIndex(index))?;
        settings.alias.remove(&key);
        self.save(&settings)?;
        Ok(settings)
    }

    /// Overwrite the baseline with the current run's address list.
    pub fn set_baseline(&self, addresses: &[String]) -> Result<Settings> {
        let mut settings = self.load()?;
        settings.results.last = addresses.join(",");
        self.save(&settings)?;
        Ok(settings)
    }
}
