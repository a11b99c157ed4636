//! Cost and emissions estimates for running a request in a region.
//!
//! All functions are pure: the same region, request and GPU table always
//! produce the same numbers. The feasibility filter calls these too, so
//! any change here moves the cost and emissions limits with it.

use greengrid_state::Region;

use crate::gpu::GpuCatalog;
use crate::request::WorkloadRequest;

/// Currency per GB of requested memory per hour.
pub const MEMORY_RATE_PER_GB_HOUR: f64 = 0.001;

/// Currency per requested CPU core per hour.
pub const CPU_RATE_PER_CORE_HOUR: f64 = 0.05;

/// Draw of the host before any GPU is attached.
pub const BASE_POWER_WATTS: f64 = 100.0;

/// Electricity multiplier: 1.0 plus each requested GPU's per-unit multiplier.
pub fn gpu_multiplier(request: &WorkloadRequest, gpus: &GpuCatalog) -> f64 {
    request
        .gpu_requirements
        .iter()
        .fold(1.0, |acc, (model, &count)| {
            acc + gpus.cost_multiplier(model) * f64::from(count)
        })
}

/// Modeled cost of one hour of the request's resource mix in `region`.
pub fn hourly_cost(region: &Region, request: &WorkloadRequest, gpus: &GpuCatalog) -> f64 {
    let memory_cost = request.memory_gb.unwrap_or(0.0) * MEMORY_RATE_PER_GB_HOUR;
    let cpu_cost = f64::from(request.cpu_cores.unwrap_or(0)) * CPU_RATE_PER_CORE_HOUR;
    region.electricity_cost * gpu_multiplier(request, gpus) + memory_cost + cpu_cost
}

/// Hourly cost over the whole estimated duration.
pub fn total_cost(region: &Region, request: &WorkloadRequest, gpus: &GpuCatalog) -> f64 {
    hourly_cost(region, request, gpus) * request.estimated_duration_hours
}

/// Modeled draw in watts: base host power plus every requested GPU.
pub fn power_watts(request: &WorkloadRequest, gpus: &GpuCatalog) -> f64 {
    request
        .gpu_requirements
        .iter()
        .fold(BASE_POWER_WATTS, |acc, (model, &count)| {
            acc + gpus.power_watts(model) * f64::from(count)
        })
}

/// Energy over the estimated duration in kWh.
pub fn total_energy_kwh(request: &WorkloadRequest, gpus: &GpuCatalog) -> f64 {
    power_watts(request, gpus) / 1000.0 * request.estimated_duration_hours
}

/// Emissions over the estimated duration in kg CO2.
///
/// Carbon intensity is stored in grams per kWh and converted to kg here.
pub fn total_emissions_kg(region: &Region, request: &WorkloadRequest, gpus: &GpuCatalog) -> f64 {
    total_energy_kwh(request, gpus) * (region.carbon_intensity / 1000.0)
}
