//! greengrid-api — REST API for GreenGrid.
//!
//! Provides axum route handlers for scheduling workloads, ranking and
//! inspecting regions, listing workload records, and Prometheus scraping.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Service banner |
//! | GET | `/health` | Liveness check |
//! | POST | `/api/v1/jobs/schedule` | Place a workload on the best region |
//! | POST | `/api/v1/regions/rank` | Score every active region for a request |
//! | GET | `/api/v1/regions/scores` | Energy/cost/capacity listing of active regions |
//! | GET | `/api/v1/regions/{id}/details` | Region details with GPU specs |
//! | PUT | `/api/v1/regions/{id}` | Insert or replace a region |
//! | GET | `/api/v1/workloads` | List workload records (`?status=&region_id=`) |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;
pub mod middleware;

use axum::Router;
use axum::routing::{get, post, put};
use greengrid_scheduler::Scheduler;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub scheduler: Scheduler,
}

/// Build the complete API router with request metrics attached.
pub fn build_router(scheduler: Scheduler) -> Router {
    let state = ApiState { scheduler };

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/v1/jobs/schedule", post(handlers::schedule_job))
        .route("/api/v1/regions/rank", post(handlers::rank_regions))
        .route("/api/v1/regions/scores", get(handlers::region_scores))
        .route("/api/v1/regions/{id}/details", get(handlers::region_details))
        .route("/api/v1/regions/{id}", put(handlers::put_region))
        .route("/api/v1/workloads", get(handlers::list_workloads))
        .route("/metrics", get(handlers::prometheus_metrics))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::record_request,
        ))
        .with_state(state)
}
