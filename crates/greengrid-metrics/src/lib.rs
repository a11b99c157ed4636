//! greengrid-metrics — observability for GreenGrid.
//!
//! Counts API requests and scheduling outcomes, and renders them together
//! with region and workload gauges in Prometheus text format.
//!
//! # Architecture
//!
//! ```text
//! MetricsCollector
//!   ├── record_request()   ← API middleware, per HTTP request
//!   ├── record_scheduled() ← scheduler, per placement
//!   ├── record_failure()   ← scheduler, per rejected request
//!   └── snapshot() → MetricsSnapshot
//!
//! Prometheus exposition
//!   └── render_prometheus(snapshot, regions, workloads) → text/plain for /metrics
//! ```

pub mod collector;
pub mod prometheus;

pub use collector::{FailureStat, MetricsCollector, MetricsSnapshot, RequestStat, ScheduledStat};
pub use prometheus::render_prometheus;
