//! Domain goals: a named Hilbert space dimension plus its goal projector.

use crate::errors::{GraError, Result};
use crate::hilbert::HilbertSpace;
use crate::types::*;

#[derive(Clone, Debug)]
pub struct DomainGoal {
    pub name: String,
    /// P_G0^(a), hilbert_dim x hilbert_dim
    pub projector: ComplexMatrix,
    pub hilbert_dim: usize,
}

impl DomainGoal {
    pub fn new(name: &str, projector: ComplexMatrix, hilbert_dim: usize) -> Result<Self> {
        if hilbert_dim == 0 {
            return Err(GraError::InvalidInput(format!(
                "domain '{}' has zero Hilbert dimension", name
            )));
        }
        if projector.rows != hilbert_dim || projector.cols != hilbert_dim {
            return Err(GraError::DimensionMismatch {
                expected: hilbert_dim,
                got: if projector.rows != hilbert_dim { projector.rows } else { projector.cols },
            });
        }
        Ok(Self { name: name.to_string(), projector, hilbert_dim })
    }

    /// Domain whose projector is built from goal states in `space`.
    pub fn from_goal_states(
        name: &str,
        space: &HilbertSpace,
        goal_states: &ComplexMatrix,
    ) -> Result<Self> {
        let projector = space.project_to_goal(goal_states)?;
        Self::new(name, projector, space.dim)
    }

    /// Domain whose goal is the span of the first `rank` basis vectors.
    pub fn coordinate(name: &str, hilbert_dim: usize, rank: usize) -> Result<Self> {
        if rank > hilbert_dim {
            return Err(GraError::InvalidInput(format!(
                "rank {} exceeds dimension {}", rank, hilbert_dim
            )));
        }
        let weights: Vec<f64> = (0..hilbert_dim).map(|i| if i < rank { 1.0 } else { 0.0 }).collect();
        Self::new(name, ComplexMatrix::diag(&weights), hilbert_dim)
    }
}
