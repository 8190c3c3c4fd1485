//! Linear algebra helpers (pure Rust — no external BLAS/LAPACK).
//!
//! Thin SVD by one-sided (Hestenes) Jacobi rotations applied directly to the
//! columns of G, so vanishing singular values stay at round-off level of |G|
//! instead of its square root.

use num_complex::Complex64;

use crate::errors::{GraError, Result};
use crate::types::*;

const MAX_SWEEPS: usize = 100;
/// Columns p, q count as orthogonal once |<a_p|a_q>| <= rows * ORTHO_TOL * |a_p| |a_q|.
const ORTHO_TOL: f64 = 1e-15;
/// Singular values below `s_max * RANK_TOL` count as zero.
const RANK_TOL: f64 = 1e-12;

/// Thin SVD: `G = U diag(S) Vh` with `k = min(rows, cols)` singular values,
/// sorted descending. `U` has orthonormal columns; columns belonging to
/// vanishing singular values are completed from the standard basis.
#[derive(Clone, Debug)]
pub struct Svd {
    pub u: ComplexMatrix,
    pub s: Vec<f64>,
    pub vh: ComplexMatrix,
}

impl Svd {
    /// U diag(S) Vh
    pub fn reconstruct(&self) -> Result<ComplexMatrix> {
        self.u.matmul(&ComplexMatrix::diag(&self.s))?.matmul(&self.vh)
    }

    /// Number of singular values above the rank tolerance.
    pub fn rank(&self) -> usize {
        let s_max = self.s.first().copied().unwrap_or(0.0);
        self.s.iter().filter(|&&s| s > s_max * RANK_TOL && s > 0.0).count()
    }
}

/// Unitary 2x2 rotation [[vpp, vpq], [vqp, vqq]] that diagonalizes the
/// Hermitian block [[app, apq], [conj(apq), aqq]] as V† A V.
///
/// V = D R: D removes the phase of apq, R is a real plane rotation.
fn jacobi_rotation(app: f64, aqq: f64, apq: Complex64) -> [Complex64; 4] {
    let r = apq.norm();
    let theta = 0.5 * (2.0 * r).atan2(app - aqq);
    let (s, c) = theta.sin_cos();
    let phase = (apq / r).conj(); // e^{-i phi}
    [Complex64::new(c, 0.0), Complex64::new(-s, 0.0), phase * s, phase * c]
}

fn column_inner(a: &ComplexMatrix, p: usize, q: usize) -> Complex64 {
    (0..a.rows).map(|i| a.get(i, p).conj() * a.get(i, q)).sum()
}

fn rotate_columns(a: &mut ComplexMatrix, p: usize, q: usize, rot: &[Complex64; 4]) {
    let [vpp, vpq, vqp, vqq] = *rot;
    for i in 0..a.rows {
        let aip = a.get(i, p);
        let aiq = a.get(i, q);
        a.set(i, p, aip * vpp + aiq * vqp);
        a.set(i, q, aip * vpq + aiq * vqq);
    }
}

/// One-sided Jacobi on a tall matrix (rows >= cols).
/// Returns (U, S, V) with G = U diag(S) V†, S sorted descending.
fn hestenes(g: &ComplexMatrix) -> Result<(ComplexMatrix, Vec<f64>, ComplexMatrix)> {
    let (m, n) = (g.rows, g.cols);
    let mut a = g.clone();
    let mut v = ComplexMatrix::identity(n);

    let tol = ORTHO_TOL * m as f64;
    let mut converged = false;
    for _ in 0..MAX_SWEEPS {
        let mut rotated = false;
        for p in 0..n {
            for q in (p + 1)..n {
                let alpha = column_inner(&a, p, p).re;
                let beta = column_inner(&a, q, q).re;
                let gamma = column_inner(&a, p, q);
                if gamma.norm() == 0.0 || gamma.norm() <= tol * (alpha * beta).sqrt() {
                    continue;
                }
                let rot = jacobi_rotation(alpha, beta, gamma);
                rotate_columns(&mut a, p, q, &rot);
                rotate_columns(&mut v, p, q, &rot);
                rotated = true;
            }
        }
        if !rotated {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(GraError::Linalg("one-sided Jacobi did not converge".into()));
    }

    let norms: Vec<f64> = (0..n).map(|j| column_inner(&a, j, j).re.max(0.0).sqrt()).collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| norms[j].partial_cmp(&norms[i]).unwrap_or(std::cmp::Ordering::Equal));

    let s: Vec<f64> = order.iter().map(|&j| norms[j]).collect();
    let s_max = s.first().copied().unwrap_or(0.0);

    let mut u = ComplexMatrix::zeros(m, n);
    let mut v_sorted = ComplexMatrix::zeros(n, n);
    let mut filled = vec![false; n];
    for (new_col, &old_col) in order.iter().enumerate() {
        for i in 0..n {
            v_sorted.set(i, new_col, v.get(i, old_col));
        }
        let sj = norms[old_col];
        if sj > s_max * RANK_TOL && sj > 0.0 {
            for i in 0..m {
                u.set(i, new_col, a.get(i, old_col) / sj);
            }
            filled[new_col] = true;
        }
    }
    complete_orthonormal_columns(&mut u, &mut filled);
    Ok((u, s, v_sorted))
}

/// Fill the columns of `u` not marked in `filled` with unit vectors
/// orthogonal to every filled column (Gram-Schmidt on the standard basis).
fn complete_orthonormal_columns(u: &mut ComplexMatrix, filled: &mut [bool]) {
    let m = u.rows;
    for j in 0..u.cols {
        if filled[j] { continue; }
        for t in 0..m {
            let mut r = ComplexVec::basis(m, t);
            for i in 0..u.cols {
                if !filled[i] { continue; }
                let col = u.column(i);
                // r <- r - u_i <u_i|r>
                let proj: Complex64 = col.data.iter().zip(r.data.iter()).map(|(a, b)| a.conj() * b).sum();
                for (rk, ck) in r.data.iter_mut().zip(col.data.iter()) {
                    *rk -= ck * proj;
                }
            }
            let norm = r.norm();
            if norm > 0.5 {
                for i in 0..m {
                    u.set(i, j, r.data[i] / norm);
                }
                filled[j] = true;
                break;
            }
        }
    }
}

/// Thin SVD of an arbitrary complex matrix.
///
/// Wide matrices are handled through G† = U' S V'†, i.e. G = V' S U'†.
pub fn svd(g: &ComplexMatrix) -> Result<Svd> {
    let (m, n) = (g.rows, g.cols);
    if m == 0 || n == 0 {
        return Err(GraError::InvalidInput("SVD of an empty matrix".into()));
    }
    if g.data.iter().any(|c| !c.re.is_finite() || !c.im.is_finite()) {
        return Err(GraError::Linalg("matrix contains non-finite entries".into()));
    }

    if m >= n {
        let (u, s, v) = hestenes(g)?;
        Ok(Svd { u, s, vh: v.adjoint() })
    } else {
        let (u_t, s, v_t) = hestenes(&g.adjoint())?;
        Ok(Svd { u: v_t, s, vh: u_t.adjoint() })
    }
}
