//! Core GRA types: ComplexVec (domain state) and ComplexMatrix (operators).

use num_complex::Complex64;
use std::fmt;

use crate::errors::{GraError, Result};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

// ---------------------------------------------------------------------------
// ComplexVec — complex-valued state vector of one domain
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct ComplexVec {
    pub data: Vec<Complex64>,
}

impl ComplexVec {
    pub fn new(data: Vec<Complex64>) -> Self {
        Self { data }
    }

    pub fn zeros(dim: usize) -> Self {
        Self { data: vec![ZERO; dim] }
    }

    /// Real vector lifted into the complex space.
    pub fn from_real(values: &[f64]) -> Self {
        Self {
            data: values.iter().map(|&x| Complex64::new(x, 0.0)).collect(),
        }
    }

    /// Standard basis vector |k> of dimension `dim`.
    pub fn basis(dim: usize, k: usize) -> Self {
        let mut v = Self::zeros(dim);
        if k < dim {
            v.data[k] = ONE;
        }
        v
    }

    pub fn dim(&self) -> usize {
        self.data.len()
    }

    pub fn norm_sqr(&self) -> f64 {
        self.data.iter().map(|c| c.norm_sqr()).sum()
    }

    pub fn norm(&self) -> f64 {
        self.norm_sqr().sqrt()
    }

    /// Unit-norm copy. A zero vector is returned unchanged.
    pub fn normalized(&self) -> Self {
        let n = self.norm();
        if n > 0.0 {
            Self {
                data: self.data.iter().map(|c| c / n).collect(),
            }
        } else {
            self.clone()
        }
    }

    /// <self|other>, conjugate-linear in `self`.
    pub fn inner(&self, other: &ComplexVec) -> Result<Complex64> {
        if self.dim() != other.dim() {
            return Err(GraError::DimensionMismatch {
                expected: self.dim(),
                got: other.dim(),
            });
        }
        Ok(self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    /// Element-wise conjugate.
    pub fn conj(&self) -> Self {
        Self {
            data: self.data.iter().map(|c| c.conj()).collect(),
        }
    }

    /// self + alpha * other, in place.
    pub fn axpy(&mut self, alpha: Complex64, other: &ComplexVec) -> Result<()> {
        if self.dim() != other.dim() {
            return Err(GraError::DimensionMismatch {
                expected: self.dim(),
                got: other.dim(),
            });
        }
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += alpha * b;
        }
        Ok(())
    }

    pub fn scaled(&self, alpha: Complex64) -> Self {
        Self {
            data: self.data.iter().map(|c| c * alpha).collect(),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|c| c.re.is_finite() && c.im.is_finite())
    }
}

impl fmt::Display for ComplexVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComplexVec(dim={}, norm={:.4})", self.dim(), self.norm())
    }
}

// ---------------------------------------------------------------------------
// ComplexMatrix — dense complex operator (row-major)
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct ComplexMatrix {
    pub data: Vec<Complex64>,
    pub rows: usize,
    pub cols: usize,
}

impl ComplexMatrix {
    pub fn new(data: Vec<Complex64>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(GraError::DimensionMismatch {
                expected: rows * cols,
                got: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    pub fn from_real(values: &[f64], rows: usize, cols: usize) -> Result<Self> {
        Self::new(
            values.iter().map(|&x| Complex64::new(x, 0.0)).collect(),
            rows,
            cols,
        )
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { data: vec![ZERO; rows * cols], rows, cols }
    }

    pub fn identity(dim: usize) -> Self {
        let mut m = Self::zeros(dim, dim);
        for i in 0..dim {
            m.data[i * dim + i] = ONE;
        }
        m
    }

    /// Diagonal matrix from real entries.
    pub fn diag(values: &[f64]) -> Self {
        let dim = values.len();
        let mut m = Self::zeros(dim, dim);
        for (i, &v) in values.iter().enumerate() {
            m.data[i * dim + i] = Complex64::new(v, 0.0);
        }
        m
    }

    /// Outer product |u><v|.
    pub fn outer(u: &ComplexVec, v: &ComplexVec) -> Self {
        let (rows, cols) = (u.dim(), v.dim());
        let mut m = Self::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                m.data[i * cols + j] = u.data[i] * v.data[j].conj();
            }
        }
        m
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: Complex64) {
        self.data[row * self.cols + col] = val;
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> Self {
        let mut m = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                m.data[j * self.rows + i] = self.data[i * self.cols + j].conj();
            }
        }
        m
    }

    /// Matrix multiply: self @ other
    pub fn matmul(&self, other: &ComplexMatrix) -> Result<ComplexMatrix> {
        if self.cols != other.rows {
            return Err(GraError::DimensionMismatch {
                expected: self.cols,
                got: other.rows,
            });
        }
        let mut result = vec![ZERO; self.rows * other.cols];
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                if a.norm_sqr() < 1e-30 { continue; }
                for j in 0..other.cols {
                    result[i * other.cols + j] += a * other.data[k * other.cols + j];
                }
            }
        }
        Ok(ComplexMatrix { data: result, rows: self.rows, cols: other.cols })
    }

    /// Matrix-vector multiply: self @ v (column-vector convention)
    pub fn mul_vec(&self, v: &ComplexVec) -> Result<ComplexVec> {
        if self.cols != v.dim() {
            return Err(GraError::DimensionMismatch {
                expected: self.cols,
                got: v.dim(),
            });
        }
        let mut result = vec![ZERO; self.rows];
        for (i, out) in result.iter_mut().enumerate() {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            *out = row.iter().zip(v.data.iter()).map(|(a, b)| a * b).sum();
        }
        Ok(ComplexVec::new(result))
    }

    /// <u| self |v>
    pub fn sandwich(&self, u: &ComplexVec, v: &ComplexVec) -> Result<Complex64> {
        let mv = self.mul_vec(v)?;
        u.inner(&mv)
    }

    pub fn add(&self, other: &ComplexMatrix) -> Result<ComplexMatrix> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(GraError::DimensionMismatch {
                expected: self.rows * self.cols,
                got: other.rows * other.cols,
            });
        }
        let data = self.data.iter().zip(other.data.iter()).map(|(a, b)| a + b).collect();
        Ok(ComplexMatrix { data, rows: self.rows, cols: self.cols })
    }

    pub fn scale(&self, alpha: f64) -> ComplexMatrix {
        ComplexMatrix {
            data: self.data.iter().map(|c| c * alpha).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Hermitian part (A + A†) / 2. Only defined for square matrices.
    pub fn hermitian_part(&self) -> Result<ComplexMatrix> {
        if !self.is_square() {
            return Err(GraError::DimensionMismatch { expected: self.rows, got: self.cols });
        }
        Ok(self.add(&self.adjoint())?.scale(0.5))
    }

    /// Top-left n x n block, zero-padded when the matrix is smaller.
    pub fn top_left(&self, n: usize) -> ComplexMatrix {
        let mut m = ComplexMatrix::zeros(n, n);
        for i in 0..n.min(self.rows) {
            for j in 0..n.min(self.cols) {
                m.data[i * n + j] = self.get(i, j);
            }
        }
        m
    }

    /// Column `j` as a vector.
    pub fn column(&self, j: usize) -> ComplexVec {
        ComplexVec::new((0..self.rows).map(|i| self.get(i, j)).collect())
    }

    /// Frobenius distance to another matrix of the same shape.
    pub fn distance(&self, other: &ComplexMatrix) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).norm_sqr())
            .sum::<f64>()
            .sqrt()
    }

    pub fn trace(&self) -> Complex64 {
        (0..self.rows.min(self.cols)).map(|i| self.get(i, i)).sum()
    }
}

impl fmt::Display for ComplexMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComplexMatrix({}x{})", self.rows, self.cols)
    }
}
