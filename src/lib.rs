//! KaleWatch Library
//!
//! Price telemetry core for the KALE token: feed polling, bounded history,
//! look-back windows and statistics

pub mod analytics;
pub mod config;
pub mod oracle;
pub mod persistence;
pub mod report;
pub mod types;

#[cfg(feature = "dashboard")]
pub mod dashboard;
