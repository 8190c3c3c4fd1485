//! Per-epoch record of an optimization run.

use serde::{Deserialize, Serialize};

use crate::errors::{GraError, Result};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationHistory {
    /// J_meta evaluated before each step.
    #[serde(rename = "J")]
    pub j: Vec<f64>,
    /// Local foam of every domain after each step.
    pub local_foams: Vec<Vec<f64>>,
    /// Meta foam after each step.
    pub meta_foam: Vec<f64>,
}

impl OptimizationHistory {
    pub fn with_capacity(epochs: usize) -> Self {
        Self {
            j: Vec::with_capacity(epochs),
            local_foams: Vec::with_capacity(epochs),
            meta_foam: Vec::with_capacity(epochs),
        }
    }

    pub fn record(&mut self, j: f64, local_foams: Vec<f64>, meta_foam: f64) {
        self.j.push(j);
        self.local_foams.push(local_foams);
        self.meta_foam.push(meta_foam);
    }

    pub fn epochs(&self) -> usize {
        self.j.len()
    }

    pub fn is_empty(&self) -> bool {
        self.j.is_empty()
    }

    pub fn final_j(&self) -> Option<f64> {
        self.j.last().copied()
    }

    pub fn best_j(&self) -> Option<f64> {
        self.j.iter().copied().fold(None, |best, x| match best {
            Some(b) if b <= x => Some(b),
            _ => Some(x),
        })
    }

    /// Post-step objective of the last epoch, rebuilt from its components.
    pub fn final_objective(&self, lambda_meta: f64) -> Option<f64> {
        let locals = self.local_foams.last()?;
        let meta = self.meta_foam.last()?;
        Some(locals.iter().sum::<f64>() + lambda_meta * meta)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| GraError::InvalidInput(format!("cannot serialize history: {e}")))
    }
}
