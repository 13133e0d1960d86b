//! Modeling configuration.
//!
//! Every field is optional; the `effective_*` getters fall back to the
//! compiled defaults so an empty TOML document is a valid configuration.
//!
//! ```
//! use u_modelkit::config::ModelingConfig;
//!
//! let cfg = ModelingConfig::from_toml_str(
//!     r#"
//!     [forecast]
//!     arima_p = 3
//!
//!     [simulation]
//!     seed = 7
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(cfg.forecast.effective_arima_order().p, 3);
//! assert_eq!(cfg.simulation.effective_seed(), 7);
//! assert_eq!(cfg.simulation.effective_samples(), 100_000);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::forecast::arima::ArimaOrder;

/// Top-level configuration aggregating all sections.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ModelingConfig {
    pub evaluation: EvaluationConfig,
    pub forecast: ForecastConfig,
    pub simulation: SimulationConfig,
    pub estimation: EstimationConfig,
}

impl ModelingConfig {
    /// Parses a configuration from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ModelError::Config(e.to_string()))
    }

    /// Reads and parses a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Config(format!("{}: {e}", path.display())))?;
        let cfg = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded modeling config");
        Ok(cfg)
    }

    /// Serializes the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ModelError::Config(e.to_string()))
    }
}

/// Settings for the evaluation models (AHP, entropy, grey relational).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Largest acceptable AHP consistency ratio (exclusive). Default: 0.10.
    pub consistency_threshold: Option<f64>,
    /// Grey relational distinguishing coefficient ρ. Default: 0.5.
    pub grey_rho: Option<f64>,
    /// Offset that keeps entropy logarithms finite. Default: 1e-10.
    pub entropy_epsilon: Option<f64>,
}

impl EvaluationConfig {
    pub fn effective_consistency_threshold(&self) -> f64 {
        self.consistency_threshold.unwrap_or(0.10)
    }

    pub fn effective_grey_rho(&self) -> f64 {
        self.grey_rho.unwrap_or(0.5)
    }

    pub fn effective_entropy_epsilon(&self) -> f64 {
        self.entropy_epsilon.unwrap_or(1e-10)
    }
}

/// Settings for the forecasting models.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ForecastConfig {
    /// GM(1,1) forecast horizon. Default: 3.
    pub grey_horizon: Option<usize>,
    /// AR order. Default: 2.
    pub arima_p: Option<usize>,
    /// Differencing order. Default: 1.
    pub arima_d: Option<usize>,
    /// MA order. Default: 2.
    pub arima_q: Option<usize>,
    /// ARIMA out-of-sample horizon. Default: 12.
    pub arima_steps: Option<usize>,
    /// Markov chain forecast steps. Default: 5.
    pub markov_steps: Option<usize>,
    /// Share of the series held out for walk-forward testing. Default: 0.2.
    pub test_fraction: Option<f64>,
}

impl ForecastConfig {
    pub fn effective_grey_horizon(&self) -> usize {
        self.grey_horizon.unwrap_or(3)
    }

    pub fn effective_arima_order(&self) -> ArimaOrder {
        ArimaOrder {
            p: self.arima_p.unwrap_or(2),
            d: self.arima_d.unwrap_or(1),
            q: self.arima_q.unwrap_or(2),
        }
    }

    pub fn effective_arima_steps(&self) -> usize {
        self.arima_steps.unwrap_or(12)
    }

    pub fn effective_markov_steps(&self) -> usize {
        self.markov_steps.unwrap_or(5)
    }

    pub fn effective_test_fraction(&self) -> f64 {
        self.test_fraction.unwrap_or(0.2)
    }
}

/// Settings for Monte-Carlo simulation.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of random trials. Default: 100 000.
    pub samples: Option<usize>,
    /// RNG seed. Default: 42.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn effective_samples(&self) -> usize {
        self.samples.unwrap_or(100_000)
    }

    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or(42)
    }
}

/// Settings for the iterative estimators.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct EstimationConfig {
    /// Gaussian mixture components. Default: 2.
    pub em_components: Option<usize>,
    /// EM iteration cap. Default: 100.
    pub em_max_iter: Option<usize>,
    /// EM log-likelihood tolerance. Default: 1e-4.
    pub em_tol: Option<f64>,
    /// Levenberg–Marquardt iteration cap. Default: 30 000.
    pub lm_max_iter: Option<usize>,
}

impl EstimationConfig {
    pub fn effective_em_components(&self) -> usize {
        self.em_components.unwrap_or(2)
    }

    pub fn effective_em_max_iter(&self) -> usize {
        self.em_max_iter.unwrap_or(100)
    }

    pub fn effective_em_tol(&self) -> f64 {
        self.em_tol.unwrap_or(1e-4)
    }

    pub fn effective_lm_max_iter(&self) -> usize {
        self.lm_max_iter.unwrap_or(30_000)
    }
}
