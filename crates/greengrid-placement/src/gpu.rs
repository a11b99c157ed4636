//! GPU lookup table: per-model cost multiplier, power draw and specs.
//!
//! Pricing and power are table lookups rather than per-model branches,
//! so adding a model is a data change.

use std::collections::BTreeMap;

use greengrid_core::config::GpuConfig;
use serde::{Deserialize, Serialize};

use crate::error::{PlacementError, PlacementResult};

/// Pricing, power and spec data for one GPU model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpuProfile {
    /// Added to the electricity multiplier per unit requested.
    pub cost_multiplier: f64,
    /// Draw per unit in watts.
    pub power_watts: f64,
    pub memory_gb: Option<f64>,
    pub compute_capability: Option<String>,
}

/// Model name → profile.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuCatalog {
    profiles: BTreeMap<String, GpuProfile>,
}

impl Default for GpuCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        catalog.insert("A100", GpuProfile::new(3.0, 400.0, 40.0, "8.0"));
        catalog.insert("V100", GpuProfile::new(2.0, 300.0, 16.0, "7.0"));
        catalog.insert("T4", GpuProfile::new(1.0, 70.0, 16.0, "7.5"));
        catalog
    }
}

impl GpuProfile {
    fn new(cost_multiplier: f64, power_watts: f64, memory_gb: f64, compute_capability: &str) -> Self {
        Self {
            cost_multiplier,
            power_watts,
            memory_gb: Some(memory_gb),
            compute_capability: Some(compute_capability.to_string()),
        }
    }
}

impl From<&GpuConfig> for GpuProfile {
    fn from(cfg: &GpuConfig) -> Self {
        Self {
            cost_multiplier: cfg.cost_multiplier,
            power_watts: cfg.power_watts,
            memory_gb: cfg.memory_gb,
            compute_capability: cfg.compute_capability.clone(),
        }
    }
}

impl GpuCatalog {
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    /// Default table with config entries layered on top (overriding or adding models).
    pub fn with_overrides(overrides: &BTreeMap<String, GpuConfig>) -> PlacementResult<Self> {
        let mut catalog = Self::default();
        for (model, cfg) in overrides {
            catalog.insert(model, GpuProfile::from(cfg));
        }
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn insert(&mut self, model: impl Into<String>, profile: GpuProfile) {
        self.profiles.insert(model.into(), profile);
    }

    pub fn get(&self, model: &str) -> Option<&GpuProfile> {
        self.profiles.get(model)
    }

    pub fn is_known(&self, model: &str) -> bool {
        self.profiles.contains_key(model)
    }

    /// Cost multiplier per unit; unknown models contribute nothing.
    pub fn cost_multiplier(&self, model: &str) -> f64 {
        self.get(model).map_or(0.0, |p| p.cost_multiplier)
    }

    /// Power per unit in watts; unknown models contribute nothing.
    pub fn power_watts(&self, model: &str) -> f64 {
        self.get(model).map_or(0.0, |p| p.power_watts)
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn validate(&self) -> PlacementResult<()> {
        for (model, p) in &self.profiles {
            let ok = |v: f64| v.is_finite() && v >= 0.0;
            if !ok(p.cost_multiplier) || !ok(p.power_watts) {
                return Err(PlacementError::InvalidPolicy(format!(
                    "gpu {model}: cost_multiplier and power_watts must be non-negative"
                )));
            }
        }
        Ok(())
    }
}
