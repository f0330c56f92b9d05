//! Out-of-band health monitoring of connected integrations

pub mod monitor;

pub use monitor::{HealthMonitor, SweepSummary};
