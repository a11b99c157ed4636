//! Region scoring for allocation decisions.
//!
//! Evaluates candidate regions using a weighted combination of:
//! - **Green energy**: the region's green-energy score, normalized to 0..=1
//! - **Cost**: cheaper electricity scores higher, zero at the reference ceiling
//! - **Availability**: GPU headroom relative to twice the requested count
//! - **Latency**: a constant placeholder until a network-distance model exists
//!
//! Regions that fail any hard constraint are rejected before scoring.

use greengrid_core::GreenGridConfig;
use greengrid_state::Region;
use serde::{Deserialize, Serialize};

use crate::error::{PlacementError, PlacementResult};
use crate::estimate::{hourly_cost, total_emissions_kg};
use crate::gpu::GpuCatalog;
use crate::request::WorkloadRequest;

/// Electricity price (per kWh) at which the cost sub-score reaches zero.
pub const COST_CEILING_PER_KWH: f64 = 0.25;

/// Latency sub-score used when no override is configured.
pub const DEFAULT_LATENCY_SCORE: f64 = 0.8;

/// Availability at this multiple of the requested count earns full marks.
const AVAILABILITY_HEADROOM: f64 = 2.0;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Weights for the scoring components. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub green_energy: f64,
    pub cost: f64,
    pub availability: f64,
    pub latency: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            green_energy: 0.4,
            cost: 0.3,
            availability: 0.2,
            latency: 0.1,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.green_energy + self.cost + self.availability + self.latency
    }

    pub fn validate(&self) -> PlacementResult<()> {
        let all = [self.green_energy, self.cost, self.availability, self.latency];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(PlacementError::InvalidPolicy(
                "weights must be non-negative numbers".to_string(),
            ));
        }
        if (self.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PlacementError::InvalidPolicy(format!(
                "weights must sum to 1.0, got {}",
                self.sum()
            )));
        }
        Ok(())
    }
}

/// Everything the scorer needs besides the region and request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    pub weights: ScoringWeights,
    /// Constant latency sub-score in 0..=1.
    pub latency_score: f64,
    pub gpus: GpuCatalog,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            latency_score: DEFAULT_LATENCY_SCORE,
            gpus: GpuCatalog::default(),
        }
    }
}

impl ScoringPolicy {
    /// Build a policy from `[scoring]` and `[gpus.*]`, defaulting whatever is omitted.
    pub fn from_config(config: &GreenGridConfig) -> PlacementResult<Self> {
        let mut policy = Self::default();
        if let Some(scoring) = &config.scoring {
            let w = &mut policy.weights;
            w.green_energy = scoring.green_energy_weight.unwrap_or(w.green_energy);
            w.cost = scoring.cost_weight.unwrap_or(w.cost);
            w.availability = scoring.availability_weight.unwrap_or(w.availability);
            w.latency = scoring.latency_weight.unwrap_or(w.latency);
            policy.latency_score = scoring.latency_score.unwrap_or(policy.latency_score);
        }
        if let Some(gpus) = &config.gpus {
            policy.gpus = GpuCatalog::with_overrides(gpus)?;
        }
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> PlacementResult<()> {
        self.weights.validate()?;
        if !(0.0..=1.0).contains(&self.latency_score) {
            return Err(PlacementError::InvalidPolicy(format!(
                "latency_score must be within 0..=1, got {}",
                self.latency_score
            )));
        }
        self.gpus.validate()
    }
}

/// Individual score components, each in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub green_energy: f64,
    pub cost: f64,
    pub availability: f64,
    pub latency: f64,
}

/// Scored result for a single region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionScore {
    pub region: Region,
    /// Composite score (higher = better). 0.0 when infeasible.
    pub score: f64,
    pub feasible: bool,
    /// Absent for infeasible regions.
    pub breakdown: Option<ScoreBreakdown>,
}

/// True iff `region` satisfies every hard constraint of `request`.
pub fn is_feasible(region: &Region, request: &WorkloadRequest, gpus: &GpuCatalog) -> bool {
    if let Some(allowed) = request.region_allowlist()
        && !allowed.contains(&region.region_id)
    {
        return false;
    }

    let gpus_ok = request
        .gpu_requirements
        .iter()
        .all(|(model, &required)| region.gpu_count(model) >= required);
    if !gpus_ok {
        return false;
    }

    if let Some(memory) = request.memory_gb
        && region.memory_availability_gb < memory
    {
        return false;
    }

    if let Some(cores) = request.cpu_cores
        && region.cpu_availability < cores
    {
        return false;
    }

    if let Some(max_cost) = request.max_cost_per_hour
        && hourly_cost(region, request, gpus) > max_cost
    {
        return false;
    }

    if let Some(max_emissions) = request.max_carbon_emissions
        && total_emissions_kg(region, request, gpus) > max_emissions
    {
        return false;
    }

    true
}

pub fn green_energy_score(region: &Region) -> f64 {
    region.green_energy_score / 100.0
}

/// Linear from 1.0 at free electricity down to 0.0 at the ceiling and above.
pub fn cost_score(region: &Region) -> f64 {
    (1.0 - region.electricity_cost / COST_CEILING_PER_KWH).max(0.0)
}

/// Count-weighted average of per-model `min(1, available / (2 * required))`.
///
/// Models requested with a count of zero carry no weight. A request with
/// no weighted model scores 1.0, the same as one without GPU requirements.
pub fn availability_score(region: &Region, request: &WorkloadRequest) -> f64 {
    let mut total_score = 0.0;
    let mut total_weight = 0.0;

    for (model, &required) in &request.gpu_requirements {
        if required == 0 {
            continue;
        }
        let required = f64::from(required);
        let available = f64::from(region.gpu_count(model));
        let score = (available / (required * AVAILABILITY_HEADROOM)).min(1.0);
        total_score += score * required;
        total_weight += required;
    }

    if total_weight > 0.0 {
        total_score / total_weight
    } else {
        1.0
    }
}

/// Score a single region for the given request.
///
/// Returns `None` when the region fails the feasibility filter.
pub fn score_region(
    region: &Region,
    request: &WorkloadRequest,
    policy: &ScoringPolicy,
) -> Option<RegionScore> {
    if !is_feasible(region, request, &policy.gpus) {
        return None;
    }

    let breakdown = ScoreBreakdown {
        green_energy: green_energy_score(region),
        cost: cost_score(region),
        availability: availability_score(region, request),
        latency: policy.latency_score,
    };

    let w = &policy.weights;
    let score = w.green_energy * breakdown.green_energy
        + w.cost * breakdown.cost
        + w.availability * breakdown.availability
        + w.latency * breakdown.latency;

    Some(RegionScore {
        region: region.clone(),
        score,
        feasible: true,
        breakdown: Some(breakdown),
    })
}

/// Score every region in catalog order. Infeasible regions get 0.0.
pub fn score_regions<'a>(
    regions: impl IntoIterator<Item = &'a Region>,
    request: &WorkloadRequest,
    policy: &ScoringPolicy,
) -> Vec<RegionScore> {
    regions
        .into_iter()
        .map(|r| {
            score_region(r, request, policy).unwrap_or_else(|| RegionScore {
                region: r.clone(),
                score: 0.0,
                feasible: false,
                breakdown: None,
            })
        })
        .collect()
}

/// Score all regions and return the feasible ones, best first.
///
/// Equal scores are ordered by region identifier so the result does not
/// depend on catalog iteration order.
pub fn rank_regions<'a>(
    regions: impl IntoIterator<Item = &'a Region>,
    request: &WorkloadRequest,
    policy: &ScoringPolicy,
) -> Vec<RegionScore> {
    let mut scores: Vec<RegionScore> = regions
        .into_iter()
        .filter_map(|r| score_region(r, request, policy))
        .collect();

    scores.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.region.region_id.cmp(&b.region.region_id))
    });
    scores
}
