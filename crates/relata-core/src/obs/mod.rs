//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Structured log events go through `tracing`; counters go through the
//! metrics sink. Neither path touches storage internals.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EntityCounters, EntitySummary, EventOps, EventPerf, EventReport, EventState};
pub use sink::{ExecKind, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all};
