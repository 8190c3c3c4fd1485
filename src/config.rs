//! Optimization configuration, loadable from JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{GraError, Result};
use crate::optimizer::OptimizerKind;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraConfig {
    /// Weight of the meta foam in J_meta.
    pub lambda_meta: f64,
    pub epochs: usize,
    pub lr: f64,
    /// Seed for the initial random states.
    pub seed: u64,
    pub optimizer: OptimizerKind,
    /// Emit a debug event every `log_every` epochs.
    pub log_every: usize,
    /// Stop once |J_prev - J| falls below this value.
    pub tolerance: Option<f64>,
}

impl Default for GraConfig {
    fn default() -> Self {
        Self {
            lambda_meta: 1.0,
            epochs: 1000,
            lr: 0.01,
            seed: 42,
            optimizer: OptimizerKind::Adam,
            log_every: 100,
            tolerance: None,
        }
    }
}

impl GraConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| GraError::Config(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| GraError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GraError::Config(format!("cannot serialize config: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(GraError::Config(format!("lr must be positive and finite, got {}", self.lr)));
        }
        if !(self.lambda_meta.is_finite() && self.lambda_meta >= 0.0) {
            return Err(GraError::Config(format!(
                "lambda_meta must be non-negative and finite, got {}", self.lambda_meta
            )));
        }
        if self.log_every == 0 {
            return Err(GraError::Config("log_every must be > 0".into()));
        }
        if let Some(tol) = self.tolerance {
            if !(tol.is_finite() && tol >= 0.0) {
                return Err(GraError::Config(format!("tolerance must be non-negative, got {tol}")));
            }
        }
        Ok(())
    }
}
