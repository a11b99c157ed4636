//! greengrid-scheduler — the service layer between the API and the engine.
//!
//! Reads region snapshots from the state store, hands them to the
//! allocation engine, and persists the resulting workload records. The
//! scheduler:
//!
//! - Snapshots active regions once per request
//! - Assigns a UUID to every placed workload
//! - Records placements and failures in the metrics collector
//! - Serves the region listing, detail and ranking views
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   ├── StateStore (read Region, write WorkloadRecord)
//!   ├── AllocationEngine (pure scoring and selection)
//!   └── MetricsCollector (placement / failure counters)
//! ```

pub mod error;
pub mod scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use scheduler::Scheduler;
