//! Domain types for the GreenGrid state store.
//!
//! These types represent the region catalog and the workload records
//! written after each scheduling decision. All types are serializable
//! to/from JSON for storage in redb tables.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use greengrid_core::{WorkloadPriority, WorkloadStatus, WorkloadType};
use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};

/// Unique identifier for a region in the catalog.
pub type RegionId = String;

/// Unique identifier for a workload record.
pub type WorkloadId = String;

// ── Region ────────────────────────────────────────────────────────

/// A candidate execution location with energy, cost and capacity data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub region_id: RegionId,
    /// Human-readable name, e.g. "Europe North (Sweden)".
    pub name: String,
    #[serde(default)]
    pub location: Option<GeoLocation>,
    /// Renewable-favourability indicator (0–100).
    pub green_energy_score: f64,
    /// Share of renewable generation (0–100).
    pub renewable_percentage: f64,
    /// Grams of CO2 per kWh.
    pub carbon_intensity: f64,
    /// Currency per kWh.
    pub electricity_cost: f64,
    /// GPU model name → available count.
    #[serde(default)]
    pub gpu_availability: BTreeMap<String, u32>,
    /// Available CPU cores.
    #[serde(default)]
    pub cpu_availability: u32,
    /// Available memory in GB.
    #[serde(default)]
    pub memory_availability_gb: f64,
    /// Renewable source → percentage of the mix.
    #[serde(default)]
    pub renewable_sources: BTreeMap<String, f64>,
    /// Peer region id → round-trip latency in milliseconds.
    #[serde(default)]
    pub network_latency: BTreeMap<String, f64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Unix timestamp (seconds) when this region was created.
    #[serde(default)]
    pub created_at: u64,
    /// Unix timestamp (seconds) when this region was last updated.
    #[serde(default)]
    pub updated_at: u64,
}

/// Geographic coordinates of a region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
}

fn default_active() -> bool {
    true
}

impl Region {
    /// Check the catalog invariants before a region is stored.
    pub fn validate(&self) -> StateResult<()> {
        if self.region_id.trim().is_empty() {
            return Err(StateError::Invalid("region_id must not be empty".to_string()));
        }
        let percent_fields = [
            ("green_energy_score", self.green_energy_score),
            ("renewable_percentage", self.renewable_percentage),
        ];
        for (field, value) in percent_fields {
            if !(0.0..=100.0).contains(&value) {
                return Err(StateError::Invalid(format!(
                    "{}: {field} must be within 0..=100, got {value}",
                    self.region_id
                )));
            }
        }
        let non_negative = [
            ("carbon_intensity", self.carbon_intensity),
            ("electricity_cost", self.electricity_cost),
            ("memory_availability_gb", self.memory_availability_gb),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(StateError::Invalid(format!(
                    "{}: {field} must be a non-negative number, got {value}",
                    self.region_id
                )));
            }
        }
        Ok(())
    }

    /// Available count for a GPU model, zero when the model is not stocked.
    pub fn gpu_count(&self, model: &str) -> u32 {
        self.gpu_availability.get(model).copied().unwrap_or(0)
    }
}

// ── Workload ──────────────────────────────────────────────────────

/// A scheduled workload as persisted after an allocation decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkloadRecord {
    pub workload_id: WorkloadId,
    pub name: String,
    pub workload_type: WorkloadType,
    pub priority: WorkloadPriority,
    pub status: WorkloadStatus,
    pub estimated_duration_hours: f64,
    pub gpu_requirements: BTreeMap<String, u32>,
    pub memory_gb: Option<f64>,
    pub cpu_cores: Option<u32>,
    pub preferred_regions: Option<Vec<RegionId>>,
    pub max_cost_per_hour: Option<f64>,
    pub max_carbon_emissions: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    /// Region chosen by the allocation engine.
    pub region_id: Option<RegionId>,
    pub estimated_start_time: Option<DateTime<Utc>>,
    pub estimated_end_time: Option<DateTime<Utc>>,
    pub estimated_cost: Option<f64>,
    /// Kilograms of CO2.
    pub estimated_emissions: Option<f64>,
    pub reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Optional filters for listing workloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkloadFilter {
    pub status: Option<WorkloadStatus>,
    pub region_id: Option<RegionId>,
}

impl WorkloadFilter {
    pub fn matches(&self, record: &WorkloadRecord) -> bool {
        if self.status.is_some_and(|s| s != record.status) {
            return false;
        }
        match &self.region_id {
            Some(id) => record.region_id.as_deref() == Some(id.as_str()),
            None => true,
        }
    }
}
