//! lanwatch-core: shared domain types and the persistent settings store.
//!
//! This crate provides the pieces shared between the discovery binary and
//! any future frontend:
//! - Host records and reconciliation reports
//! - The on-disk settings file (scan defaults, MAC aliases, last-run baseline)
//! - Common error types

pub mod error;
pub mod settings;
pub mod types;

pub use error::SettingsError;
pub use settings::{Settings, SettingsStore};
pub use types::{HostRecord, HostStatus, ReconcileReport};
