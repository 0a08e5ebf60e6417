//! Lightweight in-process metrics (dependency-free).
//!
//! Admission outcomes and evaluator latency are stored as atomics and
//! rendered by the `/metrics` handler in Prometheus text format.

pub mod metrics;

pub use metrics::AdmissionMetrics;
