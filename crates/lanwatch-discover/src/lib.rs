//! lanwatch-discover: the `lanwatch` CLI.
//!
//! Wraps nmap ping sweeps, reconciles results across repeated passes,
//! and diffs the merged host set against the previously persisted baseline.

pub mod error;
pub mod nmap_xml;
pub mod reconcile;
pub mod render;
pub mod scanner;
