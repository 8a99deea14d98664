// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub oracle: OracleConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Hard iteration ceiling; exceeding it ends the run as TIMEOUT.
    pub max_iterations: u32,
    /// How many recent history lines the digest carries to the oracle.
    pub history_window: usize,
    /// When true, a schema violation in the oracle's plan ends the run as
    /// FAILED instead of skipping the iteration's parameter change.
    pub strict_schema: bool,
    /// Directory that run records are written under.
    pub log_dir: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            history_window: 3,
            strict_schema: false,
            log_dir: "runs".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/optimize".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Cost-function evaluation budget per solve.
    pub max_evals: u32,
    /// Interval width below which the search is considered converged.
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_evals: 64,
            tolerance: 1e-4,
        }
    }
}

/// Constants of the demo rib/heat-source scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    pub rib_x: f64,
    pub heat_x: f64,
    pub heat_z: f64,
    pub safe_dist: f64,
    pub temp_limit: f64,
    pub start: [f64; 3],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            rib_x: 10.0,
            heat_x: 0.0,
            heat_z: 20.0,
            safe_dist: 3.0,
            temp_limit: 50.0,
            start: [8.0, 0.0, 18.0],
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("apsis.toml");
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
