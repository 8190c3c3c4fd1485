//! GRA meta-nulling: the full functional and its gradient-descent loop.
//!
//!   J_meta(Psi) = sum_a Phi^(a)(Psi^(a), G0^(a)) + lambda_meta * Phi_meta(Psi_ens, G_tot)
//!
//! The flow dPsi/dt = -grad J_meta is discretized by an optimizer step,
//! followed by renormalization of every domain state.

use num_complex::Complex64;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use tracing::{debug, info, warn};

use crate::config::GraConfig;
use crate::domain::DomainGoal;
use crate::errors::{GraError, Result};
use crate::foam;
use crate::history::OptimizationHistory;
use crate::optimizer::Optimizer;
use crate::types::*;

#[derive(Clone, Debug)]
pub struct GraMetaNulling {
    pub domains: Vec<DomainGoal>,
    pub lambda_meta: f64,
    /// Psi^(a) for each domain, unit norm between steps.
    pub psi_states: Vec<ComplexVec>,
}

/// Standard complex normal vector (Re, Im ~ N(0, 1/2)), normalized.
fn random_state(dim: usize, rng: &mut ChaCha8Rng) -> ComplexVec {
    let scale = 0.5f64.sqrt();
    let data = (0..dim)
        .map(|_| {
            let re: f64 = rng.sample(StandardNormal);
            let im: f64 = rng.sample(StandardNormal);
            Complex64::new(re * scale, im * scale)
        })
        .collect();
    ComplexVec::new(data).normalized()
}

impl GraMetaNulling {
    /// Random normalized initial states drawn from a seeded RNG.
    pub fn new(domains: Vec<DomainGoal>, lambda_meta: f64, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let states = domains.iter().map(|d| random_state(d.hilbert_dim, &mut rng)).collect();
        Self::from_states(domains, lambda_meta, states)
    }

    /// Explicit initial states; each is normalized on entry.
    pub fn from_states(
        domains: Vec<DomainGoal>,
        lambda_meta: f64,
        states: Vec<ComplexVec>,
    ) -> Result<Self> {
        if domains.is_empty() {
            return Err(GraError::InvalidInput("at least one domain is required".into()));
        }
        if !(lambda_meta.is_finite() && lambda_meta >= 0.0) {
            return Err(GraError::InvalidInput(format!(
                "lambda_meta must be non-negative, got {lambda_meta}"
            )));
        }
        if states.len() != domains.len() {
            return Err(GraError::DimensionMismatch { expected: domains.len(), got: states.len() });
        }
        for (d, s) in domains.iter().zip(states.iter()) {
            if s.dim() != d.hilbert_dim {
                return Err(GraError::DimensionMismatch { expected: d.hilbert_dim, got: s.dim() });
            }
        }
        // The cross term couples every pair through one averaged projector.
        if domains.len() > 1 {
            let dim = domains[0].hilbert_dim;
            if let Some(d) = domains.iter().find(|d| d.hilbert_dim != dim) {
                return Err(GraError::DimensionMismatch { expected: dim, got: d.hilbert_dim });
            }
        }
        Ok(Self {
            domains,
            lambda_meta,
            psi_states: states.iter().map(|s| s.normalized()).collect(),
        })
    }

    /// Number of domains M.
    pub fn m(&self) -> usize {
        self.domains.len()
    }

    /// Phi^(a)(Psi^(a), G0^(a)) for an arbitrary candidate state of domain `a`.
    pub fn local_foam(&self, a: usize, psi_a: &ComplexVec) -> Result<f64> {
        let domain = self.domains.get(a).ok_or_else(|| {
            GraError::InvalidInput(format!("domain index {} out of range ({})", a, self.m()))
        })?;
        foam::local_foam(psi_a, &domain.projector)
    }

    /// Local foam of every domain at its current state.
    pub fn local_foams(&self) -> Result<Vec<f64>> {
        (0..self.m()).map(|a| self.local_foam(a, &self.psi_states[a])).collect()
    }

    pub fn total_projector(&self) -> Result<ComplexMatrix> {
        let projectors: Vec<&ComplexMatrix> = self.domains.iter().map(|d| &d.projector).collect();
        foam::averaged_projector(&projectors)
    }

    /// Phi_meta(Psi_ens, G_tot)
    pub fn meta_foam(&self) -> Result<f64> {
        if self.m() < 2 {
            return Ok(0.0);
        }
        foam::meta_foam_with(&self.psi_states, &self.total_projector()?)
    }

    /// J_meta(Psi)
    pub fn j_meta(&self) -> Result<f64> {
        let local_sum: f64 = self.local_foams()?.iter().sum();
        Ok(local_sum + self.lambda_meta * self.meta_foam()?)
    }

    /// grad_{Psi^(a)} J_meta for every domain a.
    pub fn gradient(&self) -> Result<Vec<ComplexVec>> {
        let p_tot = if self.m() > 1 { Some(self.total_projector()?) } else { None };
        let mut grads = Vec::with_capacity(self.m());
        for (a, domain) in self.domains.iter().enumerate() {
            let mut g = foam::local_foam_gradient(&self.psi_states[a], &domain.projector)?;
            if let Some(p_tot) = &p_tot {
                let meta = foam::meta_foam_gradient_with(&self.psi_states, p_tot, a)?;
                g.axpy(Complex64::new(self.lambda_meta, 0.0), &meta)?;
            }
            grads.push(g);
        }
        Ok(grads)
    }

    /// Rescale every non-zero state to unit norm. Returns the indices of
    /// states that could not be normalized.
    pub fn renormalize(&mut self) -> Vec<usize> {
        let mut degenerate = Vec::new();
        for (i, psi) in self.psi_states.iter_mut().enumerate() {
            let norm = psi.norm();
            if norm > 0.0 && norm.is_finite() {
                *psi = psi.normalized();
            } else {
                degenerate.push(i);
            }
        }
        degenerate
    }

    /// One optimizer step on all states followed by renormalization.
    /// Returns J_meta evaluated before the step.
    pub fn step(&mut self, optimizer: &mut dyn Optimizer) -> Result<f64> {
        let j = self.j_meta()?;
        let grads = self.gradient()?;
        optimizer.step(&mut self.psi_states, &grads)?;
        for i in self.renormalize() {
            let norm = self.psi_states[i].norm();
            if norm == 0.0 {
                warn!(domain = %self.domains[i].name, "state has zero norm, skipping renormalization");
            } else {
                warn!(domain = %self.domains[i].name, norm, "state norm is not finite, skipping renormalization");
            }
        }
        Ok(j)
    }

    /// dPsi/dt = -grad J_meta with Adam, `epochs` steps at learning rate `lr`.
    pub fn optimize(&mut self, epochs: usize, lr: f64) -> Result<OptimizationHistory> {
        let config = GraConfig {
            lambda_meta: self.lambda_meta,
            epochs,
            lr,
            ..GraConfig::default()
        };
        self.optimize_with(&config)
    }

    /// Optimization loop driven by a configuration. `config.seed` is not
    /// used here.
    pub fn optimize_with(&mut self, config: &GraConfig) -> Result<OptimizationHistory> {
        config.validate()?;
        let mut optimizer = config.optimizer.build(config.lr);
        self.run(optimizer.as_mut(), config)
    }

    /// Optimization loop with a caller-supplied optimizer. `config.lambda_meta`
    /// replaces the current weight; `config.lr` is ignored in favour of the
    /// optimizer's own learning rate.
    pub fn run(&mut self, optimizer: &mut dyn Optimizer, config: &GraConfig) -> Result<OptimizationHistory> {
        config.validate()?;
        self.lambda_meta = config.lambda_meta;
        info!(
            domains = self.m(),
            epochs = config.epochs,
            lr = optimizer.learning_rate(),
            lambda_meta = self.lambda_meta,
            "starting meta-nulling optimization"
        );

        let mut history = OptimizationHistory::with_capacity(config.epochs);
        let mut prev_j: Option<f64> = None;

        for epoch in 0..config.epochs {
            let j = self.step(optimizer)?;
            if !j.is_finite() {
                return Err(GraError::Linalg(format!("J_meta became non-finite at epoch {epoch}")));
            }
            history.record(j, self.local_foams()?, self.meta_foam()?);

            if epoch % config.log_every == 0 {
                debug!(epoch, j, meta_foam = history.meta_foam[epoch], "epoch");
            }

            if let (Some(tol), Some(prev)) = (config.tolerance, prev_j) {
                if (prev - j).abs() < tol {
                    info!(epoch, j, "converged");
                    break;
                }
            }
            prev_j = Some(j);
        }

        info!(
            epochs_run = history.epochs(),
            final_j = history.final_j().unwrap_or(f64::NAN),
            "meta-nulling optimization finished"
        );
        Ok(history)
    }

    /// Build from configuration: random states seeded by `config.seed`.
    pub fn from_config(domains: Vec<DomainGoal>, config: &GraConfig) -> Result<Self> {
        config.validate()?;
        Self::new(domains, config.lambda_meta, config.seed)
    }
}
