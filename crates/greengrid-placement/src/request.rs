//! Workload requests — the scheduling intent handed to the engine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use greengrid_core::{WorkloadPriority, WorkloadType};
use greengrid_state::RegionId;
use serde::{Deserialize, Serialize};

use crate::error::{PlacementError, PlacementResult};

/// Resource and constraint requirements for one workload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkloadRequest {
    pub name: String,
    pub workload_type: WorkloadType,
    #[serde(default)]
    pub priority: WorkloadPriority,
    pub estimated_duration_hours: f64,
    /// GPU model → required count. Models absent here are unconstrained.
    #[serde(default)]
    pub gpu_requirements: BTreeMap<String, u32>,
    #[serde(default)]
    pub memory_gb: Option<f64>,
    #[serde(default)]
    pub cpu_cores: Option<u32>,
    /// When non-empty, every other region is excluded.
    #[serde(default)]
    pub preferred_regions: Option<Vec<RegionId>>,
    #[serde(default)]
    pub max_cost_per_hour: Option<f64>,
    /// Upper bound on total emissions in kg CO2.
    #[serde(default)]
    pub max_carbon_emissions: Option<f64>,
    /// Advisory only; not enforced by the engine.
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

impl WorkloadRequest {
    /// A request with no resource requirements or constraints.
    pub fn new(name: impl Into<String>, workload_type: WorkloadType, duration_hours: f64) -> Self {
        Self {
            name: name.into(),
            workload_type,
            priority: WorkloadPriority::default(),
            estimated_duration_hours: duration_hours,
            gpu_requirements: BTreeMap::new(),
            memory_gb: None,
            cpu_cores: None,
            preferred_regions: None,
            max_cost_per_hour: None,
            max_carbon_emissions: None,
            deadline: None,
        }
    }

    pub fn with_gpu(mut self, model: impl Into<String>, count: u32) -> Self {
        self.gpu_requirements.insert(model.into(), count);
        self
    }

    pub fn has_gpu_requirements(&self) -> bool {
        !self.gpu_requirements.is_empty()
    }

    /// The acceptable-region list, if it actually restricts anything.
    pub fn region_allowlist(&self) -> Option<&[RegionId]> {
        self.preferred_regions
            .as_deref()
            .filter(|regions| !regions.is_empty())
    }

    /// Check the request invariants: positive duration and positive
    /// optional limits. GPU counts are unsigned, so never negative.
    pub fn validate(&self) -> PlacementResult<()> {
        if !positive(self.estimated_duration_hours) {
            return Err(invalid(format!(
                "estimated_duration_hours must be > 0, got {}",
                self.estimated_duration_hours
            )));
        }
        let optional = [
            ("memory_gb", self.memory_gb),
            ("max_cost_per_hour", self.max_cost_per_hour),
            ("max_carbon_emissions", self.max_carbon_emissions),
        ];
        for (field, value) in optional {
            if let Some(v) = value
                && !positive(v)
            {
                return Err(invalid(format!("{field} must be > 0 when set, got {v}")));
            }
        }
        if self.cpu_cores == Some(0) {
            return Err(invalid("cpu_cores must be > 0 when set".to_string()));
        }
        Ok(())
    }
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn invalid(msg: String) -> PlacementError {
    PlacementError::InvalidRequest(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> WorkloadRequest {
        WorkloadRequest::new("Test", WorkloadType::LlmTraining, 1.0)
    }

    #[test]
    fn minimal_request_is_valid() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_duration() {
        for hours in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut req = base();
            req.estimated_duration_hours = hours;
            assert!(
                matches!(req.validate(), Err(PlacementError::InvalidRequest(_))),
                "duration {hours} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_non_positive_optional_limits() {
        let mut req = base();
        req.memory_gb = Some(0.0);
        assert!(req.validate().is_err());

        let mut req = base();
        req.max_cost_per_hour = Some(-5.0);
        assert!(req.validate().is_err());

        let mut req = base();
        req.cpu_cores = Some(0);
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_preferred_list_restricts_nothing() {
        let mut req = base();
        req.preferred_regions = Some(vec![]);
        assert!(req.region_allowlist().is_none());

        req.preferred_regions = Some(vec!["eu-north-1".to_string()]);
        assert_eq!(req.region_allowlist().unwrap().len(), 1);
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "name": "Nightly fine-tune",
            "workload_type": "fine_tuning",
            "estimated_duration_hours": 3.5,
            "gpu_requirements": {"A100": 2}
        }"#;
        let req: WorkloadRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.priority, WorkloadPriority::Medium);
        assert_eq!(req.gpu_requirements["A100"], 2);
        assert!(req.memory_gb.is_none());
        assert!(req.deadline.is_none());
    }

    #[test]
    fn rejects_negative_gpu_count_at_parse_time() {
        let json = r#"{
            "name": "x",
            "workload_type": "llm_inference",
            "estimated_duration_hours": 1.0,
            "gpu_requirements": {"T4": -1}
        }"#;
        assert!(serde_json::from_str::<WorkloadRequest>(json).is_err());
    }
}
