//! greengrid.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GreenGridConfig {
    pub server: Option<ServerConfig>,
    pub scoring: Option<ScoringConfig>,
    /// GPU lookup table overrides keyed by model name (e.g. `A100`).
    pub gpus: Option<BTreeMap<String, GpuConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    /// JSON file of regions loaded when the catalog is empty.
    pub seed_file: Option<PathBuf>,
}

/// Composite score weights. Omitted fields keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub green_energy_weight: Option<f64>,
    pub cost_weight: Option<f64>,
    pub availability_weight: Option<f64>,
    pub latency_weight: Option<f64>,
    /// Constant latency sub-score in [0, 1].
    pub latency_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuConfig {
    /// Added to the electricity multiplier per unit requested.
    pub cost_multiplier: f64,
    pub power_watts: f64,
    pub memory_gb: Option<f64>,
    pub compute_capability: Option<String>,
}

impl GreenGridConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a `greengrid.toml` document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn port(&self) -> Option<u16> {
        self.server.as_ref().and_then(|s| s.port)
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.server.as_ref().and_then(|s| s.data_dir.as_deref())
    }

    pub fn seed_file(&self) -> Option<&Path> {
        self.server.as_ref().and_then(|s| s.seed_file.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let config: GreenGridConfig = toml::from_str("").unwrap();
        assert!(config.server.is_none());
        assert!(config.scoring.is_none());
        assert!(config.gpus.is_none());
    }

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
[server]
port = 9000
data_dir = "/tmp/greengrid"

[scoring]
green_energy_weight = 0.5
cost_weight = 0.2
latency_score = 0.6

[gpus.H100]
cost_multiplier = 4.0
power_watts = 700
memory_gb = 80
compute_capability = "9.0"
"#;
        let config = GreenGridConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.port(), Some(9000));
        assert_eq!(config.data_dir(), Some(Path::new("/tmp/greengrid")));

        let scoring = config.scoring.unwrap();
        assert_eq!(scoring.green_energy_weight, Some(0.5));
        assert_eq!(scoring.availability_weight, None);
        assert_eq!(scoring.latency_score, Some(0.6));

        let h100 = &config.gpus.unwrap()["H100"];
        assert_eq!(h100.cost_multiplier, 4.0);
        assert_eq!(h100.power_watts, 700.0);
    }

    #[test]
    fn test_from_toml_rejects_bad_types() {
        assert!(GreenGridConfig::from_toml("[server]\nport = \"eight thousand\"\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greengrid.toml");
        std::fs::write(&path, "[server]\nport = 9100\nseed_file = \"regions.json\"\n").unwrap();

        let config = GreenGridConfig::from_file(&path).unwrap();
        assert_eq!(config.port(), Some(9100));
        assert_eq!(config.seed_file(), Some(Path::new("regions.json")));
        assert!(config.data_dir().is_none());
    }
}
