//! Scheduler error types.

use greengrid_placement::PlacementError;
use greengrid_state::StateError;
use thiserror::Error;

/// Errors that can occur during scheduling operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error("state store error: {0}")]
    State(#[from] StateError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
