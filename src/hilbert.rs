//! Hilbert space of a single domain and goal-projector construction.

use crate::errors::{GraError, Result};
use crate::linalg;
use crate::types::*;

/// Regularizer in the soft projector weights s / (s + eps).
pub const PROJECTOR_EPS: f64 = 1e-8;

/// Finite-dimensional complex Hilbert space with an orthonormal basis.
#[derive(Clone, Debug)]
pub struct HilbertSpace {
    pub dim: usize,
    /// Basis vectors as columns.
    pub basis: ComplexMatrix,
}

impl HilbertSpace {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(GraError::InvalidInput("Hilbert space dimension must be > 0".into()));
        }
        Ok(Self { dim, basis: orthonormal_basis(dim) })
    }

    pub fn basis_vector(&self, k: usize) -> Result<ComplexVec> {
        if k >= self.dim {
            return Err(GraError::InvalidInput(format!(
                "basis index {} out of range for dim {}", k, self.dim
            )));
        }
        Ok(self.basis.column(k))
    }

    /// Goal projector P_G0 from sample goal states (one state per column).
    ///
    /// P = U diag(s / (s + eps)) U†, cropped (or zero-padded) to dim x dim.
    /// Directions with non-vanishing singular values get weight close to 1,
    /// so for well-conditioned input P is the orthogonal projector onto the
    /// column span of `goal_states`. Singular values at round-off level
    /// (below the SVD rank tolerance) get weight 0.
    pub fn project_to_goal(&self, goal_states: &ComplexMatrix) -> Result<ComplexMatrix> {
        let svd = linalg::svd(goal_states)?;
        let rank = svd.rank();
        let weights: Vec<f64> = svd
            .s
            .iter()
            .enumerate()
            .map(|(k, &s)| if k < rank { s / (s + PROJECTOR_EPS) } else { 0.0 })
            .collect();
        let projector = svd
            .u
            .matmul(&ComplexMatrix::diag(&weights))?
            .matmul(&svd.u.adjoint())?;
        Ok(projector.top_left(self.dim))
    }

    /// Goal projector from a list of goal state vectors.
    pub fn project_to_states(&self, states: &[ComplexVec]) -> Result<ComplexMatrix> {
        if states.is_empty() {
            return Err(GraError::InvalidInput("no goal states given".into()));
        }
        let rows = states[0].dim();
        let cols = states.len();
        let mut g = ComplexMatrix::zeros(rows, cols);
        for (j, s) in states.iter().enumerate() {
            if s.dim() != rows {
                return Err(GraError::DimensionMismatch { expected: rows, got: s.dim() });
            }
            for i in 0..rows {
                g.set(i, j, s.data[i]);
            }
        }
        self.project_to_goal(&g)
    }
}

/// Standard basis of C^dim.
fn orthonormal_basis(dim: usize) -> ComplexMatrix {
    ComplexMatrix::identity(dim)
}
