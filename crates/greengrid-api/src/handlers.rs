//! REST API handlers.
//!
//! Each handler calls into the `Scheduler` and returns JSON responses in
//! the `{success, data, error}` envelope.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;

use greengrid_core::WorkloadStatus;
use greengrid_placement::{PlacementError, WorkloadRequest};
use greengrid_scheduler::SchedulerError;
use greengrid_state::{Region, StateError, WorkloadFilter};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

/// Map a scheduler failure to its HTTP status.
fn scheduler_error(e: SchedulerError) -> Response {
    let status = match &e {
        SchedulerError::Placement(PlacementError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
        SchedulerError::Placement(PlacementError::NoFeasibleRegion { .. }) => StatusCode::CONFLICT,
        SchedulerError::Placement(PlacementError::NoActiveCapacity) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        SchedulerError::State(StateError::Invalid(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(&e.to_string(), status)
}

// ── Service ────────────────────────────────────────────────────

/// GET /
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "GreenGrid",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

// ── Scheduling ─────────────────────────────────────────────────

/// POST /api/v1/jobs/schedule
pub async fn schedule_job(
    State(state): State<ApiState>,
    payload: Result<Json<WorkloadRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(e) => return error_response(&e.body_text(), StatusCode::BAD_REQUEST),
    };
    match state.scheduler.schedule(&request).await {
        Ok(record) => (StatusCode::CREATED, ApiResponse::ok(record)).into_response(),
        Err(e) => scheduler_error(e),
    }
}

// ── Regions ────────────────────────────────────────────────────

/// POST /api/v1/regions/rank
pub async fn rank_regions(
    State(state): State<ApiState>,
    payload: Result<Json<WorkloadRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(e) => return error_response(&e.body_text(), StatusCode::BAD_REQUEST),
    };
    match state.scheduler.score_regions(&request) {
        Ok(scores) => ApiResponse::ok(scores).into_response(),
        Err(e) => scheduler_error(e),
    }
}

/// GET /api/v1/regions/scores
pub async fn region_scores(State(state): State<ApiState>) -> Response {
    match state.scheduler.region_scores() {
        Ok(summaries) => ApiResponse::ok(summaries).into_response(),
        Err(e) => scheduler_error(e),
    }
}

/// GET /api/v1/regions/{id}/details
pub async fn region_details(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    match state.scheduler.region_details(&id) {
        Ok(Some(details)) => ApiResponse::ok(details).into_response(),
        Ok(None) => error_response("region not found", StatusCode::NOT_FOUND),
        Err(e) => scheduler_error(e),
    }
}

/// PUT /api/v1/regions/{id}
pub async fn put_region(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<Region>, JsonRejection>,
) -> Response {
    let Json(region) = match payload {
        Ok(body) => body,
        Err(e) => return error_response(&e.body_text(), StatusCode::BAD_REQUEST),
    };
    if region.region_id != id {
        return error_response(
            &format!("region_id {} does not match path {id}", region.region_id),
            StatusCode::BAD_REQUEST,
        );
    }
    match state.scheduler.upsert_region(region) {
        Ok(stored) => ApiResponse::ok(stored).into_response(),
        Err(e) => scheduler_error(e),
    }
}

// ── Workloads ──────────────────────────────────────────────────

/// Query parameters for the workload listing.
#[derive(Debug, Default, Deserialize)]
pub struct WorkloadQuery {
    pub status: Option<String>,
    pub region_id: Option<String>,
}

/// GET /api/v1/workloads
pub async fn list_workloads(
    State(state): State<ApiState>,
    Query(query): Query<WorkloadQuery>,
) -> Response {
    let status = match query.status.as_deref().map(str::parse::<WorkloadStatus>) {
        Some(Err(e)) => return error_response(&e.to_string(), StatusCode::BAD_REQUEST),
        Some(Ok(s)) => Some(s),
        None => None,
    };
    let filter = WorkloadFilter {
        status,
        region_id: query.region_id,
    };
    match state.scheduler.list_workloads(&filter) {
        Ok(records) => ApiResponse::ok(records).into_response(),
        Err(e) => scheduler_error(e),
    }
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> Response {
    match state.scheduler.render_metrics().await {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => scheduler_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greengrid_core::WorkloadType;
    use greengrid_metrics::MetricsCollector;
    use greengrid_placement::AllocationEngine;
    use greengrid_scheduler::Scheduler;
    use greengrid_state::StateStore;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn test_region(id: &str, green: f64, cost: f64, carbon: f64) -> Region {
        Region {
            region_id: id.to_string(),
            name: format!("Region {id}"),
            location: None,
            green_energy_score: green,
            renewable_percentage: green,
            carbon_intensity: carbon,
            electricity_cost: cost,
            gpu_availability: BTreeMap::from([("V100".to_string(), 20), ("T4".to_string(), 50)]),
            cpu_availability: 500,
            memory_availability_gb: 2000.0,
            renewable_sources: BTreeMap::new(),
            network_latency: BTreeMap::new(),
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn empty_state() -> ApiState {
        let scheduler = Scheduler::new(
            StateStore::open_in_memory().unwrap(),
            AllocationEngine::default(),
            Arc::new(MetricsCollector::new()),
        );
        ApiState { scheduler }
    }

    fn test_state() -> ApiState {
        let state = empty_state();
        let store = state.scheduler.store();
        store.put_region(&test_region("region-a", 85.0, 0.15, 150.0)).unwrap();
        store.put_region(&test_region("region-b", 95.0, 0.10, 80.0)).unwrap();
        state
    }

    fn t4_request() -> WorkloadRequest {
        WorkloadRequest::new("inference", WorkloadType::LlmInference, 1.0).with_gpu("T4", 1)
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let resp = health().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "healthy");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn schedule_returns_created_record() {
        let state = test_state();
        let resp = schedule_job(State(state.clone()), Ok(Json(t4_request()))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["region_id"], "region-b");
        assert_eq!(json["data"]["status"], "scheduled");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn schedule_invalid_request_is_bad_request() {
        let state = test_state();
        let request = WorkloadRequest::new("bad", WorkloadType::LlmTraining, -1.0);
        let resp = schedule_job(State(state), Ok(Json(request))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn schedule_infeasible_is_conflict() {
        let state = test_state();
        let request =
            WorkloadRequest::new("huge", WorkloadType::LlmTraining, 1.0).with_gpu("V100", 100);
        let resp = schedule_job(State(state), Ok(Json(request))).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn schedule_without_regions_is_unavailable() {
        let resp = schedule_job(State(empty_state()), Ok(Json(t4_request()))).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "no active regions available");
    }

    #[tokio::test]
    async fn rank_lists_every_region() {
        let resp = rank_regions(State(test_state()), Ok(Json(t4_request()))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
        assert_eq!(json["data"][0]["feasible"], true);
    }

    #[tokio::test]
    async fn region_scores_lists_active_regions() {
        let resp = region_scores(State(test_state())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"][0]["region_id"], "region-a");
        assert_eq!(json["data"][1]["region_name"], "Region region-b");
    }

    #[tokio::test]
    async fn region_details_known_region() {
        let resp = region_details(State(test_state()), Path("region-b".to_string())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["gpu_types"][0]["type"], "T4");
        assert_eq!(json["data"]["gpu_types"][0]["specifications"]["power_watts"], 70.0);
    }

    #[tokio::test]
    async fn region_details_unknown_region() {
        let resp = region_details(State(test_state()), Path("nope".to_string())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_region_stores_region() {
        let state = empty_state();
        let region = test_region("eu-north-1", 95.0, 0.08, 50.0);
        let resp = put_region(
            State(state.clone()),
            Path("eu-north-1".to_string()),
            Ok(Json(region)),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.scheduler.store().get_region("eu-north-1").unwrap().is_some());
    }

    #[tokio::test]
    async fn put_region_rejects_invalid_scores() {
        let region = test_region("eu-north-1", 120.0, 0.08, 50.0);
        let resp = put_region(
            State(empty_state()),
            Path("eu-north-1".to_string()),
            Ok(Json(region)),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn put_region_rejects_mismatched_id() {
        let region = test_region("eu-north-1", 95.0, 0.08, 50.0);
        let resp = put_region(
            State(empty_state()),
            Path("us-west-1".to_string()),
            Ok(Json(region)),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_workloads_filters_by_status() {
        let state = test_state();
        state.scheduler.schedule(&t4_request()).await.unwrap();

        let query = WorkloadQuery {
            status: Some("scheduled".to_string()),
            region_id: None,
        };
        let resp = list_workloads(State(state.clone()), Query(query)).await;
        let json = body_json(resp).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 1);

        let query = WorkloadQuery {
            status: Some("running".to_string()),
            region_id: None,
        };
        let resp = list_workloads(State(state), Query(query)).await;
        let json = body_json(resp).await;
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_workloads_rejects_unknown_status() {
        let query = WorkloadQuery {
            status: Some("sleeping".to_string()),
            region_id: None,
        };
        let resp = list_workloads(State(test_state()), Query(query)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "unknown status: sleeping");
    }

    #[tokio::test]
    async fn prometheus_endpoint_returns_text() {
        let resp = prometheus_metrics(State(test_state())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("text/plain"));
    }
}
