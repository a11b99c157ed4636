//! Allocation engine — turns a request and a catalog snapshot into a decision.
//!
//! Given the regions and a workload request, the engine:
//! 1. Drops inactive regions and fails fast on an empty catalog
//! 2. Scores every region (infeasible ones are rejected inside the scorer)
//! 3. Picks the best feasible region
//! 4. Estimates start/end times, total cost and emissions, and explains the choice
//!
//! The engine holds only its scoring policy and is safe to share across
//! concurrent requests.

use chrono::{DateTime, Duration, Utc};
use greengrid_core::GreenGridConfig;
use greengrid_state::{Region, RegionId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PlacementError, PlacementResult};
use crate::estimate::{total_cost, total_emissions_kg};
use crate::reasoning::generate_reasoning;
use crate::request::WorkloadRequest;
use crate::scorer::{RegionScore, ScoringPolicy, rank_regions, score_regions};

/// Fixed delay between the decision and the estimated start.
pub const START_BUFFER_MINUTES: i64 = 5;

/// The engine's answer for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDecision {
    pub region_id: RegionId,
    pub region_name: String,
    pub estimated_start_time: DateTime<Utc>,
    pub estimated_end_time: DateTime<Utc>,
    pub estimated_cost: f64,
    /// Kilograms of CO2.
    pub estimated_emissions: f64,
    pub green_energy_score: f64,
    /// Composite score of the chosen region.
    pub score: f64,
    pub reasoning: String,
}

/// Stateless region-selection engine.
#[derive(Debug, Clone, Default)]
pub struct AllocationEngine {
    policy: ScoringPolicy,
}

impl AllocationEngine {
    pub fn new(policy: ScoringPolicy) -> PlacementResult<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn from_config(config: &GreenGridConfig) -> PlacementResult<Self> {
        Self::new(ScoringPolicy::from_config(config)?)
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Pick a region for `request`, timing the estimate from now.
    pub fn schedule_workload(
        &self,
        request: &WorkloadRequest,
        regions: &[Region],
    ) -> PlacementResult<ScheduleDecision> {
        self.schedule_workload_at(request, regions, Utc::now())
    }

    /// Pick a region for `request`, timing the estimate from `now`.
    pub fn schedule_workload_at(
        &self,
        request: &WorkloadRequest,
        regions: &[Region],
        now: DateTime<Utc>,
    ) -> PlacementResult<ScheduleDecision> {
        request.validate()?;

        let active: Vec<&Region> = regions.iter().filter(|r| r.is_active).collect();
        if active.is_empty() {
            warn!(workload = %request.name, "no active regions in catalog");
            return Err(PlacementError::NoActiveCapacity);
        }

        for model in request.gpu_requirements.keys() {
            if !self.policy.gpus.is_known(model) {
                warn!(gpu = %model, "unknown GPU model, no cost or power contribution");
            }
        }

        let ranked = rank_regions(active.iter().copied(), request, &self.policy);
        for s in &ranked {
            debug!(region = %s.region.region_id, score = s.score, "scored region");
        }

        let Some(best) = ranked.into_iter().next() else {
            warn!(
                workload = %request.name,
                candidates = active.len(),
                "no region satisfies the workload requirements"
            );
            return Err(PlacementError::NoFeasibleRegion {
                candidates: active.len(),
            });
        };
        let region = &best.region;

        let (start, end) = estimate_window(now, request.estimated_duration_hours)?;
        let estimated_cost = total_cost(region, request, &self.policy.gpus);
        let estimated_emissions = total_emissions_kg(region, request, &self.policy.gpus);
        let reasoning = generate_reasoning(region, request);

        info!(
            workload = %request.name,
            region = %region.region_id,
            score = best.score,
            cost = estimated_cost,
            emissions_kg = estimated_emissions,
            "workload placed"
        );

        Ok(ScheduleDecision {
            region_id: region.region_id.clone(),
            region_name: region.name.clone(),
            estimated_start_time: start,
            estimated_end_time: end,
            estimated_cost,
            estimated_emissions,
            green_energy_score: region.green_energy_score,
            score: best.score,
            reasoning,
        })
    }

    /// Score every active region for `request` without choosing one.
    /// Inactive regions are left out of the listing.
    pub fn score_regions(
        &self,
        request: &WorkloadRequest,
        regions: &[Region],
    ) -> PlacementResult<Vec<RegionScore>> {
        request.validate()?;
        Ok(score_regions(
            regions.iter().filter(|r| r.is_active),
            request,
            &self.policy,
        ))
    }
}

/// Start after the fixed buffer, end after the estimated duration.
fn estimate_window(
    now: DateTime<Utc>,
    duration_hours: f64,
) -> PlacementResult<(DateTime<Utc>, DateTime<Utc>)> {
    let out_of_range =
        || PlacementError::InvalidRequest(format!("duration of {duration_hours}h is out of range"));

    let start = now + Duration::minutes(START_BUFFER_MINUTES);
    let millis = (duration_hours * 3_600_000.0).round();
    if millis > i64::MAX as f64 {
        return Err(out_of_range());
    }
    let run = Duration::try_milliseconds(millis as i64).ok_or_else(out_of_range)?;
    let end = start.checked_add_signed(run).ok_or_else(out_of_range)?;
    Ok((start, end))
}
