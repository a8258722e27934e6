//! Engine configuration
//!
//! Tunables for the numerical parts of the engine. Defaults match the
//! on-chain reference behaviour; a TOML file and `CMMM_` environment
//! variables may override them, e.g. `CMMM_SOLVER__MAX_ITERATIONS=300`.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Newton solver limits for proportional withdrawals
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Outer Newton rounds before giving up
    pub max_iterations: usize,

    /// Back-off halvings allowed when a step lands past the singularity
    pub max_backoff_halvings: usize,

    /// Doublings allowed while pre-scaling the requested amounts
    pub max_prescale_doublings: usize,

    /// Converged once `|F(p)| <= relative_tolerance * lp_amount_in` or
    /// `|p - p_prev| <= relative_tolerance * p`
    pub relative_tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 255,
            max_backoff_halvings: 64,
            max_prescale_doublings: 1024,
            relative_tolerance: 1e-10,
        }
    }
}

/// Top-level engine settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    pub solver: SolverSettings,
}

impl EngineSettings {
    /// Load settings: defaults, then an optional TOML file, then `CMMM_` env vars
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading engine settings: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("CMMM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build engine settings")?;

        config
            .try_deserialize()
            .context("Failed to deserialize engine settings")
    }

    /// Parse settings from an in-memory TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse engine settings TOML")
    }
}
