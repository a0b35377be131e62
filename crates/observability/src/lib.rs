//! Tracing and metrics shared by every logiflow process.

/// Tracing configuration (filters, output format).
pub mod tracing;

/// Counters and timings injected into the pipeline and the monitor.
pub mod metrics;

pub use metrics::{InMemoryMetrics, MetricsSink, MetricsSnapshot, NoopMetrics};
pub use tracing::LogFormat;
