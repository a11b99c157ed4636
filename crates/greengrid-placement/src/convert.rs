//! Conversions between state store records and placement views.
//!
//! Bridges `greengrid_state::{Region, WorkloadRecord}` to the listing and
//! detail views served to callers, and turns a [`ScheduleDecision`] into
//! the record that gets persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use greengrid_core::WorkloadStatus;
use greengrid_state::{GeoLocation, Region, RegionId, WorkloadRecord};
use serde::{Deserialize, Serialize};

use crate::engine::ScheduleDecision;
use crate::gpu::{GpuCatalog, GpuProfile};
use crate::request::WorkloadRequest;

/// Energy, cost and capacity attributes of one region, for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region_id: RegionId,
    pub region_name: String,
    pub green_energy_score: f64,
    pub renewable_percentage: f64,
    pub carbon_intensity: f64,
    pub electricity_cost: f64,
    pub gpu_availability: BTreeMap<String, u32>,
    pub cpu_availability: u32,
    pub memory_availability_gb: f64,
    /// Unix timestamp (seconds).
    pub last_updated: u64,
}

/// Full view of a region, with specs for each stocked GPU model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDetails {
    pub region_id: RegionId,
    pub region_name: String,
    pub location: Option<GeoLocation>,
    pub green_energy_score: f64,
    pub renewable_percentage: f64,
    pub renewable_sources: BTreeMap<String, f64>,
    pub carbon_intensity: f64,
    pub electricity_cost: f64,
    pub gpu_types: Vec<GpuInventory>,
    pub cpu_availability: u32,
    pub memory_availability_gb: f64,
    pub network_latency: BTreeMap<String, f64>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuInventory {
    #[serde(rename = "type")]
    pub gpu_type: String,
    pub available_count: u32,
    /// Absent when the model is not in the lookup table.
    pub specifications: Option<GpuProfile>,
}

impl From<&Region> for RegionSummary {
    fn from(region: &Region) -> Self {
        Self {
            region_id: region.region_id.clone(),
            region_name: region.name.clone(),
            green_energy_score: region.green_energy_score,
            renewable_percentage: region.renewable_percentage,
            carbon_intensity: region.carbon_intensity,
            electricity_cost: region.electricity_cost,
            gpu_availability: region.gpu_availability.clone(),
            cpu_availability: region.cpu_availability,
            memory_availability_gb: region.memory_availability_gb,
            last_updated: region.updated_at,
        }
    }
}

/// Expand a region with the GPU lookup table's specs.
pub fn region_details(region: &Region, gpus: &GpuCatalog) -> RegionDetails {
    let gpu_types = region
        .gpu_availability
        .iter()
        .map(|(model, &count)| GpuInventory {
            gpu_type: model.clone(),
            available_count: count,
            specifications: gpus.get(model).cloned(),
        })
        .collect();

    RegionDetails {
        region_id: region.region_id.clone(),
        region_name: region.name.clone(),
        location: region.location,
        green_energy_score: region.green_energy_score,
        renewable_percentage: region.renewable_percentage,
        renewable_sources: region.renewable_sources.clone(),
        carbon_intensity: region.carbon_intensity,
        electricity_cost: region.electricity_cost,
        gpu_types,
        cpu_availability: region.cpu_availability,
        memory_availability_gb: region.memory_availability_gb,
        network_latency: region.network_latency.clone(),
        is_active: region.is_active,
    }
}

/// Build the persisted record for a scheduled request.
pub fn workload_record(
    request: &WorkloadRequest,
    decision: &ScheduleDecision,
    workload_id: &str,
    created_at: DateTime<Utc>,
) -> WorkloadRecord {
    WorkloadRecord {
        workload_id: workload_id.to_string(),
        name: request.name.clone(),
        workload_type: request.workload_type,
        priority: request.priority,
        status: WorkloadStatus::Scheduled,
        estimated_duration_hours: request.estimated_duration_hours,
        gpu_requirements: request.gpu_requirements.clone(),
        memory_gb: request.memory_gb,
        cpu_cores: request.cpu_cores,
        preferred_regions: request.preferred_regions.clone(),
        max_cost_per_hour: request.max_cost_per_hour,
        max_carbon_emissions: request.max_carbon_emissions,
        deadline: request.deadline,
        region_id: Some(decision.region_id.clone()),
        estimated_start_time: Some(decision.estimated_start_time),
        estimated_end_time: Some(decision.estimated_end_time),
        estimated_cost: Some(decision.estimated_cost),
        estimated_emissions: Some(decision.estimated_emissions),
        reasoning: Some(decision.reasoning.clone()),
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use greengrid_core::{WorkloadPriority, WorkloadType};

    fn sample_region() -> Region {
        Region {
            region_id: "us-west-1".to_string(),
            name: "US West (California)".to_string(),
            location: Some(GeoLocation {
                lat: 37.7749,
                lng: -122.4194,
            }),
            green_energy_score: 85.0,
            renewable_percentage: 75.0,
            carbon_intensity: 150.0,
            electricity_cost: 0.15,
            gpu_availability: BTreeMap::from([
                ("A100".to_string(), 50),
                ("MI300".to_string(), 4),
            ]),
            cpu_availability: 1000,
            memory_availability_gb: 5000.0,
            renewable_sources: BTreeMap::from([("solar".to_string(), 45.0)]),
            network_latency: BTreeMap::from([("us-east-1".to_string(), 70.0)]),
            is_active: true,
            created_at: 100,
            updated_at: 200,
        }
    }

    #[test]
    fn summary_copies_listing_fields() {
        let summary = RegionSummary::from(&sample_region());
        assert_eq!(summary.region_id, "us-west-1");
        assert_eq!(summary.region_name, "US West (California)");
        assert_eq!(summary.gpu_availability["A100"], 50);
        assert_eq!(summary.last_updated, 200);
    }

    #[test]
    fn details_attach_known_gpu_specs() {
        let details = region_details(&sample_region(), &GpuCatalog::default());

        assert_eq!(details.gpu_types.len(), 2);
        let a100 = &details.gpu_types[0];
        assert_eq!(a100.gpu_type, "A100");
        assert_eq!(a100.available_count, 50);
        let specs = a100.specifications.as_ref().unwrap();
        assert_eq!(specs.memory_gb, Some(40.0));
        assert_eq!(specs.power_watts, 400.0);

        let unknown = &details.gpu_types[1];
        assert_eq!(unknown.gpu_type, "MI300");
        assert!(unknown.specifications.is_none());
    }

    #[test]
    fn details_serialize_gpu_type_field_as_type() {
        let details = region_details(&sample_region(), &GpuCatalog::default());
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["gpu_types"][0]["type"], "A100");
        assert_eq!(json["location"]["lat"], 37.7749);
    }

    #[test]
    fn record_carries_request_and_decision() {
        let created = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let mut request = WorkloadRequest::new("train", WorkloadType::ModelTraining, 3.0)
            .with_gpu("A100", 2);
        request.priority = WorkloadPriority::High;
        request.cpu_cores = Some(8);

        let decision = ScheduleDecision {
            region_id: "eu-north-1".to_string(),
            region_name: "Europe North".to_string(),
            estimated_start_time: created + Duration::minutes(5),
            estimated_end_time: created + Duration::minutes(185),
            estimated_cost: 2.5,
            estimated_emissions: 0.2,
            green_energy_score: 95.0,
            score: 0.9,
            reasoning: "Selected Europe North.".to_string(),
        };

        let record = workload_record(&request, &decision, "w-123", created);

        assert_eq!(record.workload_id, "w-123");
        assert_eq!(record.status, WorkloadStatus::Scheduled);
        assert_eq!(record.priority, WorkloadPriority::High);
        assert_eq!(record.region_id.as_deref(), Some("eu-north-1"));
        assert_eq!(record.gpu_requirements["A100"], 2);
        assert_eq!(record.cpu_cores, Some(8));
        assert_eq!(record.estimated_cost, Some(2.5));
        assert_eq!(record.created_at, created);
    }
}
