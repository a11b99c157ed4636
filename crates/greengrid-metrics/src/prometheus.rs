//! Prometheus text exposition format.
//!
//! Renders the collector's counters plus region and workload gauges read
//! from the state store, for scraping by a Prometheus server or agent.

use std::collections::BTreeMap;
use std::fmt::Write;

use greengrid_core::WorkloadType;
use greengrid_state::{Region, WorkloadRecord};

use crate::collector::MetricsSnapshot;

const UNASSIGNED_REGION: &str = "unassigned";

/// Render counters and gauges into Prometheus text format.
///
/// `regions` feeds the per-region gauges; `workloads` is counted by
/// status and assigned region.
pub fn render_prometheus(
    snapshot: &MetricsSnapshot,
    regions: &[Region],
    workloads: &[WorkloadRecord],
) -> String {
    let mut out = String::new();

    header(&mut out, "greengrid_requests_total", "Total HTTP requests served.", "counter");
    for r in &snapshot.requests {
        let _ = writeln!(
            out,
            "greengrid_requests_total{{method=\"{}\",endpoint=\"{}\"}} {}",
            escape(&r.method),
            escape(&r.endpoint),
            r.count
        );
    }

    header(
        &mut out,
        "greengrid_request_duration_seconds",
        "HTTP request latency in seconds.",
        "summary",
    );
    for r in &snapshot.requests {
        let labels = format!(
            "method=\"{}\",endpoint=\"{}\"",
            escape(&r.method),
            escape(&r.endpoint)
        );
        let _ = writeln!(
            out,
            "greengrid_request_duration_seconds_sum{{{labels}}} {:.6}",
            r.duration_seconds_sum
        );
        let _ = writeln!(out, "greengrid_request_duration_seconds_count{{{labels}}} {}", r.count);
    }

    header(
        &mut out,
        "greengrid_workloads_scheduled_total",
        "Workloads placed, by region, workload type and priority.",
        "counter",
    );
    for s in &snapshot.scheduled {
        let _ = writeln!(
            out,
            "greengrid_workloads_scheduled_total{{region=\"{}\",workload_type=\"{}\",priority=\"{}\"}} {}",
            escape(&s.region),
            s.workload_type,
            s.priority,
            s.count
        );
    }

    header(
        &mut out,
        "greengrid_workload_duration_hours_sum",
        "Sum of estimated durations of placed workloads, in hours.",
        "counter",
    );
    let mut hours: BTreeMap<(&str, WorkloadType), f64> = BTreeMap::new();
    for s in &snapshot.scheduled {
        *hours.entry((s.region.as_str(), s.workload_type)).or_default() += s.duration_hours_sum;
    }
    for ((region, workload_type), sum) in hours {
        let _ = writeln!(
            out,
            "greengrid_workload_duration_hours_sum{{region=\"{}\",workload_type=\"{}\"}} {:.2}",
            escape(region),
            workload_type,
            sum
        );
    }

    header(
        &mut out,
        "greengrid_schedule_failures_total",
        "Scheduling requests that produced no placement, by reason.",
        "counter",
    );
    for f in &snapshot.failures {
        let _ = writeln!(
            out,
            "greengrid_schedule_failures_total{{reason=\"{}\"}} {}",
            escape(&f.reason),
            f.count
        );
    }

    region_gauge(
        &mut out,
        regions,
        "greengrid_region_green_energy_score",
        "Green energy score of the region (0-100).",
        |r| r.green_energy_score,
    );
    region_gauge(
        &mut out,
        regions,
        "greengrid_region_carbon_intensity_gco2_kwh",
        "Carbon intensity in grams of CO2 per kWh.",
        |r| r.carbon_intensity,
    );
    region_gauge(
        &mut out,
        regions,
        "greengrid_region_electricity_cost_per_kwh",
        "Electricity cost per kWh.",
        |r| r.electricity_cost,
    );

    header(
        &mut out,
        "greengrid_region_gpu_availability",
        "Available GPUs by region and model.",
        "gauge",
    );
    for r in regions {
        for (gpu_type, count) in &r.gpu_availability {
            let _ = writeln!(
                out,
                "greengrid_region_gpu_availability{{region_id=\"{}\",region_name=\"{}\",gpu_type=\"{}\"}} {}",
                escape(&r.region_id),
                escape(&r.name),
                escape(gpu_type),
                count
            );
        }
    }

    header(
        &mut out,
        "greengrid_workloads",
        "Workload records by status and assigned region.",
        "gauge",
    );
    let mut counts: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for w in workloads {
        let region = w.region_id.as_deref().unwrap_or(UNASSIGNED_REGION);
        *counts.entry((w.status.label(), region)).or_default() += 1;
    }
    for ((status, region), count) in counts {
        let _ = writeln!(
            out,
            "greengrid_workloads{{status=\"{}\",region=\"{}\"}} {}",
            status,
            escape(region),
            count
        );
    }

    out
}

fn header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
}

fn region_gauge(
    out: &mut String,
    regions: &[Region],
    name: &str,
    help: &str,
    value: impl Fn(&Region) -> f64,
) {
    header(out, name, help, "gauge");
    for r in regions {
        let _ = writeln!(
            out,
            "{name}{{region_id=\"{}\",region_name=\"{}\"}} {}",
            escape(&r.region_id),
            escape(&r.name),
            value(r)
        );
    }
}

/// Escape a label value per the exposition format.
fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
