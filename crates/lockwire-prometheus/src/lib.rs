//! Prometheus metrics for terminal sessions and task runners.
//!
//! [`PrometheusMetrics`] implements [`lockwire_core::SessionMetrics`] (pass it to
//! `SessionContextBuilder::with_metrics`) and [`lockwire_exec::Subscribe`] (add it to
//! a `SubscriberSet` listening on the runners' bus).
//!
//! ## Metrics
//! - `lockwire_sessions_total{action, outcome}` - Counter; `outcome` is `ok` or an error code label
//! - `lockwire_session_duration_seconds{action}` - Histogram
//! - `lockwire_tasks_total{status}` - Counter of finished tasks (`succeeded|failed|skipped`)
//! - `lockwire_runners_total{state}` - Counter of finished runners
//!
//! ## HTTP Server
//! This crate does NOT serve `/metrics`; encode [`PrometheusMetrics::gather`] with a
//! [`TextEncoder`] in the host application's HTTP stack.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
