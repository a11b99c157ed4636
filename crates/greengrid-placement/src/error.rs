//! Allocation error types.

use thiserror::Error;

/// Terminal outcomes of a scheduling call. None of these are retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlacementError {
    /// The catalog held no active regions at all.
    #[error("no active regions available")]
    NoActiveCapacity,

    /// Regions exist but none satisfies the request's hard constraints.
    #[error("no regions meet the workload requirements ({candidates} active regions considered)")]
    NoFeasibleRegion { candidates: usize },

    #[error("invalid workload request: {0}")]
    InvalidRequest(String),

    #[error("invalid scoring policy: {0}")]
    InvalidPolicy(String),
}

impl PlacementError {
    /// Short snake_case label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            PlacementError::NoActiveCapacity => "no_active_capacity",
            PlacementError::NoFeasibleRegion { .. } => "no_feasible_region",
            PlacementError::InvalidRequest(_) => "invalid_request",
            PlacementError::InvalidPolicy(_) => "invalid_policy",
        }
    }
}

pub type PlacementResult<T> = Result<T, PlacementError>;
