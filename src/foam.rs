//! Foam functionals: the local penalty of one domain, the cross-domain meta
//! penalty, and their analytic gradients.
//!
//! Gradients of a real functional L(psi) are returned as
//! dL/dRe(psi) + i dL/dIm(psi), i.e. the real-pair gradient packed back into
//! a complex vector. Descending along it decreases L.

use num_complex::Complex64;

use crate::errors::{GraError, Result};
use crate::types::*;

// ---------------------------------------------------------------------------
// Local foam Phi^(a)(psi, G0)
// ---------------------------------------------------------------------------

/// | Re(<psi|P|psi>) - |<psi|psi>| |^2
pub fn local_foam(psi: &ComplexVec, projector: &ComplexMatrix) -> Result<f64> {
    let a = projector.sandwich(psi, psi)?.re;
    let b = psi.norm_sqr();
    Ok((a - b).powi(2))
}

/// Gradient of `local_foam`: 4 (a - b) (H psi - psi), with H = (P + P†)/2.
pub fn local_foam_gradient(psi: &ComplexVec, projector: &ComplexMatrix) -> Result<ComplexVec> {
    let h = projector.hermitian_part()?;
    let h_psi = h.mul_vec(psi)?;
    let a = psi.inner(&h_psi)?.re;
    let b = psi.norm_sqr();
    let coeff = 4.0 * (a - b);
    Ok(ComplexVec::new(
        h_psi
            .data
            .iter()
            .zip(psi.data.iter())
            .map(|(hp, p)| (hp - p) * coeff)
            .collect(),
    ))
}

// ---------------------------------------------------------------------------
// Meta foam Phi_meta(Psi_ens, G_tot)
// ---------------------------------------------------------------------------

/// P_tot = mean of all domain projectors.
pub fn averaged_projector(projectors: &[&ComplexMatrix]) -> Result<ComplexMatrix> {
    let first = projectors
        .first()
        .ok_or_else(|| GraError::InvalidInput("no projectors to average".into()))?;
    let mut total = ComplexMatrix::zeros(first.rows, first.cols);
    for p in projectors {
        total = total.add(p)?;
    }
    Ok(total.scale(1.0 / projectors.len() as f64))
}

/// <psi_i| P_tot |psi_j>
fn cross_amplitude(psi_i: &ComplexVec, psi_j: &ComplexVec, p_tot: &ComplexMatrix) -> Result<Complex64> {
    p_tot.sandwich(psi_i, psi_j)
}

/// Sum over unordered pairs i < j of |<psi_i| P_tot |psi_j>|^2.
pub fn meta_foam_with(states: &[ComplexVec], p_tot: &ComplexMatrix) -> Result<f64> {
    let m = states.len();
    let mut total = 0.0;
    for i in 0..m {
        for j in (i + 1)..m {
            total += cross_amplitude(&states[i], &states[j], p_tot)?.norm_sqr();
        }
    }
    Ok(total)
}

/// Meta foam with P_tot averaged from `projectors`.
pub fn compute_meta_foam(states: &[ComplexVec], projectors: &[&ComplexMatrix]) -> Result<f64> {
    if states.len() < 2 {
        return Ok(0.0);
    }
    let p_tot = averaged_projector(projectors)?;
    meta_foam_with(states, &p_tot)
}

/// Gradient of `meta_foam_with` with respect to `states[target]`.
///
/// For a pair with c = <psi_i|P|psi_j>:
///   d|c|^2 / d psi_j = 2 c P† psi_i
///   d|c|^2 / d psi_i = 2 conj(c) P psi_j
pub fn meta_foam_gradient_with(
    states: &[ComplexVec],
    p_tot: &ComplexMatrix,
    target: usize,
) -> Result<ComplexVec> {
    if target >= states.len() {
        return Err(GraError::InvalidInput(format!(
            "target domain {} out of range ({} domains)", target, states.len()
        )));
    }
    let psi_t = &states[target];
    let p_adj = p_tot.adjoint();
    let mut grad = ComplexVec::zeros(psi_t.dim());

    for (k, psi_k) in states.iter().enumerate() {
        if k == target { continue; }
        if k < target {
            // pair (k, target): target is the ket
            let c = cross_amplitude(psi_k, psi_t, p_tot)?;
            grad.axpy(c * 2.0, &p_adj.mul_vec(psi_k)?)?;
        } else {
            // pair (target, k): target is the bra
            let c = cross_amplitude(psi_t, psi_k, p_tot)?;
            grad.axpy(c.conj() * 2.0, &p_tot.mul_vec(psi_k)?)?;
        }
    }
    Ok(grad)
}

/// Gradient of `compute_meta_foam` with respect to `states[target]`.
pub fn meta_foam_gradient(
    states: &[ComplexVec],
    projectors: &[&ComplexMatrix],
    target: usize,
) -> Result<ComplexVec> {
    let p_tot = averaged_projector(projectors)?;
    meta_foam_gradient_with(states, &p_tot, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_foam_vanishes_inside_goal() {
        let p = ComplexMatrix::diag(&[1.0, 0.0]);
        let psi = ComplexVec::basis(2, 0);
        assert!(local_foam(&psi, &p).unwrap().abs() < 1e-15);
    }

    #[test]
    fn local_foam_is_one_outside_goal() {
        let p = ComplexMatrix::diag(&[1.0, 0.0]);
        let psi = ComplexVec::basis(2, 1);
        assert!((local_foam(&psi, &p).unwrap() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn averaged_projector_rejects_empty() {
        assert!(averaged_projector(&[]).is_err());
    }

    #[test]
    fn meta_gradient_rejects_bad_target() {
        let p = ComplexMatrix::identity(2);
        let states = vec![ComplexVec::basis(2, 0)];
        assert!(meta_foam_gradient_with(&states, &p, 3).is_err());
    }
}
