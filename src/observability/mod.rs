//! Observability utilities for logging and metrics.

pub mod logging;
pub mod metrics;
