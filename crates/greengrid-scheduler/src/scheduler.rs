//! Scheduler — places workloads on regions and records the outcome.
//!
//! Each call reads one snapshot of the region catalog and hands it to the
//! allocation engine. Catalog updates that land mid-request are not seen
//! until the next call. Placement failures are reported, never retried.

use std::sync::Arc;

use chrono::Utc;
use greengrid_metrics::{MetricsCollector, render_prometheus};
use greengrid_placement::{
    AllocationEngine, RegionDetails, RegionScore, RegionSummary, WorkloadRequest, region_details,
    workload_record,
};
use greengrid_state::{Region, StateStore, WorkloadFilter, WorkloadRecord};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SchedulerResult;

/// Connects the state store, the allocation engine and the metrics collector.
#[derive(Clone)]
pub struct Scheduler {
    store: StateStore,
    engine: Arc<AllocationEngine>,
    metrics: Arc<MetricsCollector>,
}

impl Scheduler {
    pub fn new(store: StateStore, engine: AllocationEngine, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            store,
            engine: Arc::new(engine),
            metrics,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn engine(&self) -> &AllocationEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Choose a region for `request` and persist the scheduled record.
    pub async fn schedule(&self, request: &WorkloadRequest) -> SchedulerResult<WorkloadRecord> {
        let regions = self.store.list_active_regions()?;
        debug!(workload = %request.name, regions = regions.len(), "region snapshot taken");

        let decision = match self.engine.schedule_workload(request, &regions) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(workload = %request.name, error = %e, "placement failed");
                self.metrics.record_failure(e.reason()).await;
                return Err(e.into());
            }
        };

        let workload_id = Uuid::new_v4().to_string();
        let record = workload_record(request, &decision, &workload_id, Utc::now());
        self.store.put_workload(&record)?;

        self.metrics
            .record_scheduled(
                &decision.region_id,
                request.workload_type,
                request.priority,
                request.estimated_duration_hours,
            )
            .await;

        info!(
            %workload_id,
            workload = %request.name,
            region = %decision.region_id,
            "workload scheduled"
        );
        Ok(record)
    }

    /// Score every active region for `request`, in catalog order.
    pub fn score_regions(&self, request: &WorkloadRequest) -> SchedulerResult<Vec<RegionScore>> {
        request.validate()?;
        let regions = self.store.list_active_regions()?;
        Ok(self.engine.score_regions(request, &regions)?)
    }

    /// Energy, cost and capacity attributes of every active region.
    pub fn region_scores(&self) -> SchedulerResult<Vec<RegionSummary>> {
        let regions = self.store.list_active_regions()?;
        Ok(regions.iter().map(RegionSummary::from).collect())
    }

    /// Full view of one region, or `None` when the identifier is unknown.
    pub fn region_details(&self, region_id: &str) -> SchedulerResult<Option<RegionDetails>> {
        let region = self.store.get_region(region_id)?;
        Ok(region.map(|r| region_details(&r, &self.engine.policy().gpus)))
    }

    /// Insert or replace a region, stamping its timestamps.
    ///
    /// An existing region keeps its original creation time.
    pub fn upsert_region(&self, mut region: Region) -> SchedulerResult<Region> {
        let now = unix_now();
        region.created_at = match self.store.get_region(&region.region_id)? {
            Some(existing) => existing.created_at,
            None => now,
        };
        region.updated_at = now;
        self.store.put_region(&region)?;
        info!(region = %region.region_id, active = region.is_active, "region upserted");
        Ok(region)
    }

    pub fn list_workloads(&self, filter: &WorkloadFilter) -> SchedulerResult<Vec<WorkloadRecord>> {
        Ok(self.store.list_workloads(filter)?)
    }

    /// Prometheus exposition of counters plus current region and workload gauges.
    pub async fn render_metrics(&self) -> SchedulerResult<String> {
        let snapshot = self.metrics.snapshot().await;
        let regions = self.store.list_active_regions()?;
        let workloads = self.store.list_workloads(&WorkloadFilter::default())?;
        Ok(render_prometheus(&snapshot, &regions, &workloads))
    }
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}
