//! Human-readable justification for a chosen region.

use greengrid_state::Region;

use crate::request::WorkloadRequest;

const EXCELLENT_GREEN_SCORE: f64 = 80.0;
const GOOD_GREEN_SCORE: f64 = 60.0;
const LOW_COST_PER_KWH: f64 = 0.12;
const LOW_CARBON_G_PER_KWH: f64 = 150.0;

/// Compose the reasoning string for `region`. Deterministic: only formats
/// values already present on the region and request.
pub fn generate_reasoning(region: &Region, request: &WorkloadRequest) -> String {
    let mut parts = vec![format!(
        "Selected {} for optimal green energy utilization.",
        region.name
    )];

    let grade = if region.green_energy_score >= EXCELLENT_GREEN_SCORE {
        Some("Excellent")
    } else if region.green_energy_score >= GOOD_GREEN_SCORE {
        Some("Good")
    } else {
        None
    };
    if let Some(grade) = grade {
        parts.push(format!(
            "{grade} green energy score of {:.1}% with {:.1}% renewable energy.",
            region.green_energy_score, region.renewable_percentage
        ));
    }

    if region.electricity_cost <= LOW_COST_PER_KWH {
        parts.push(format!(
            "Low electricity cost of ${:.3}/kWh.",
            region.electricity_cost
        ));
    }

    if region.carbon_intensity <= LOW_CARBON_G_PER_KWH {
        parts.push(format!(
            "Low carbon intensity of {:.0} gCO2/kWh.",
            region.carbon_intensity
        ));
    }

    if request.has_gpu_requirements() {
        let gpu_info: Vec<String> = request
            .gpu_requirements
            .keys()
            .map(|model| format!("{} {model} GPUs available", region.gpu_count(model)))
            .collect();
        parts.push(format!("Sufficient resources: {}.", gpu_info.join(", ")));
    }

    parts.join(" ")
}
