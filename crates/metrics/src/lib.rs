//! Metrics names and recorder setup for reelsmith.
//!
//! Consumer crates record through the re-exported `metrics` facade macros:
//!
//! ```rust,ignore
//! use reelsmith_metrics::{counter, jobs, labels};
//!
//! counter!(jobs::EXECUTED_TOTAL, labels::OPERATION => "trim").increment(1);
//! ```
//!
//! # Features
//!
//! - `prometheus`: serve a Prometheus scrape endpoint from [`init_metrics`]

mod definitions;
pub mod error;
mod recorder;

pub use {
    definitions::*,
    error::{Error, Result},
    recorder::{MetricsRecorderConfig, init_metrics},
};

pub use metrics::{counter, gauge, histogram};
