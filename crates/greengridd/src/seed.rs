//! Region catalog seeding.
//!
//! The daemon ships five sample regions; `--file` (or `server.seed_file`)
//! replaces them with a JSON array in the same shape.

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use greengrid_state::{Region, StateStore};
use tracing::info;

const SAMPLE_REGIONS: &str = include_str!("../data/regions.json");

/// The built-in sample catalog.
pub fn sample_regions() -> anyhow::Result<Vec<Region>> {
    parse_regions(SAMPLE_REGIONS).context("built-in sample catalog is malformed")
}

/// Read a JSON array of regions from `path`.
pub fn load_regions(path: &Path) -> anyhow::Result<Vec<Region>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    parse_regions(&content).with_context(|| format!("invalid seed file {}", path.display()))
}

fn parse_regions(json: &str) -> anyhow::Result<Vec<Region>> {
    Ok(serde_json::from_str(json)?)
}

/// Regions from `file`, or the sample catalog when none is given.
pub fn regions_from(file: Option<&Path>) -> anyhow::Result<Vec<Region>> {
    match file {
        Some(path) => load_regions(path),
        None => sample_regions(),
    }
}

/// Seed the catalog from `file` (or the sample catalog) if it is empty.
/// Returns how many regions were written.
pub fn seed_if_empty(store: &StateStore, file: Option<&Path>) -> anyhow::Result<usize> {
    let existing = store.count_regions()?;
    if existing > 0 {
        info!(existing, "region catalog already populated, skipping seed");
        return Ok(0);
    }
    store_regions(store, regions_from(file)?)
}

/// Replace every record with regions from `file` (or the sample catalog).
/// The seed data is loaded and validated before anything is removed.
pub fn reset(store: &StateStore, file: Option<&Path>) -> anyhow::Result<usize> {
    let regions = stamped(regions_from(file)?);
    store
        .replace_regions(&regions)
        .context("failed to reset region catalog")?;
    info!(count = regions.len(), "state store reset");
    Ok(regions.len())
}

fn stamped(mut regions: Vec<Region>) -> Vec<Region> {
    let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    for region in &mut regions {
        region.created_at = now;
        region.updated_at = now;
    }
    regions
}

fn store_regions(store: &StateStore, regions: Vec<Region>) -> anyhow::Result<usize> {
    let regions = stamped(regions);
    store
        .put_regions(&regions)
        .context("failed to seed region catalog")?;
    info!(count = regions.len(), "region catalog seeded");
    Ok(regions.len())
}
