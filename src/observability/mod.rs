//! Observability module providing logging and metrics.
//!
//! - Structured logging with configurable formats (pretty, compact, JSON)
//! - Prometheus counters and gauges for archive throughput and failures

pub mod metrics;
#[cfg(feature = "server")]
mod tracing_init;

#[cfg(feature = "server")]
pub use tracing_init::*;
