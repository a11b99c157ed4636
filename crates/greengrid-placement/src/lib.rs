//! GreenGrid allocation engine — region selection by carbon, cost and fit.
//!
//! This crate decides where a workload should run. It does NOT store
//! regions or workloads (that's `greengrid-state`) and does not persist
//! its decisions (that's `greengrid-scheduler`). Every function here is
//! pure over plain data.
//!
//! # Components
//!
//! - **`request`** — Workload requests and their validation
//! - **`gpu`** — GPU lookup table (cost multiplier, power, specs)
//! - **`estimate`** — Hourly/total cost and emissions estimates
//! - **`scorer`** — Feasibility filter, composite score, ranking
//! - **`reasoning`** — Human-readable justification of a choice
//! - **`engine`** — Allocation engine (schedule, score listing)
//! - **`convert`** — Views and records built from state store types

pub mod convert;
pub mod engine;
pub mod error;
pub mod estimate;
pub mod gpu;
pub mod reasoning;
pub mod request;
pub mod scorer;

pub use convert::{GpuInventory, RegionDetails, RegionSummary, region_details, workload_record};
pub use engine::{AllocationEngine, START_BUFFER_MINUTES, ScheduleDecision};
pub use error::{PlacementError, PlacementResult};
pub use gpu::{GpuCatalog, GpuProfile};
pub use reasoning::generate_reasoning;
pub use request::WorkloadRequest;
pub use scorer::{
    RegionScore, ScoreBreakdown, ScoringPolicy, ScoringWeights, is_feasible, rank_regions,
    score_region, score_regions,
};
