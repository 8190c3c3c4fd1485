//! First-order optimizers over complex state vectors.
//!
//! Complex parameters are treated as pairs of independent real parameters
//! (Re, Im); gradients use the same convention as `foam`.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::errors::{GraError, Result};
use crate::types::*;

pub trait Optimizer {
    /// One update of every parameter vector from its gradient.
    fn step(&mut self, params: &mut [ComplexVec], grads: &[ComplexVec]) -> Result<()>;

    fn learning_rate(&self) -> f64;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Sgd,
    Adam,
}

impl OptimizerKind {
    pub fn build(self, lr: f64) -> Box<dyn Optimizer> {
        match self {
            Self::Sgd => Box::new(Sgd::new(lr)),
            Self::Adam => Box::new(Adam::new(lr)),
        }
    }
}

fn check_shapes(params: &[ComplexVec], grads: &[ComplexVec]) -> Result<()> {
    if params.len() != grads.len() {
        return Err(GraError::DimensionMismatch { expected: params.len(), got: grads.len() });
    }
    for (p, g) in params.iter().zip(grads.iter()) {
        if p.dim() != g.dim() {
            return Err(GraError::DimensionMismatch { expected: p.dim(), got: g.dim() });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Plain gradient descent
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Sgd {
    pub lr: f64,
}

impl Sgd {
    pub fn new(lr: f64) -> Self {
        Self { lr }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut [ComplexVec], grads: &[ComplexVec]) -> Result<()> {
        check_shapes(params, grads)?;
        for (p, g) in params.iter_mut().zip(grads.iter()) {
            p.axpy(Complex64::new(-self.lr, 0.0), g)?;
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }
}

// ---------------------------------------------------------------------------
// Adam
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct Moments {
    m: Vec<Complex64>,
    v_re: Vec<f64>,
    v_im: Vec<f64>,
}

impl Moments {
    fn zeros(dim: usize) -> Self {
        Self {
            m: vec![Complex64::new(0.0, 0.0); dim],
            v_re: vec![0.0; dim],
            v_im: vec![0.0; dim],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Adam {
    pub lr: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    t: u32,
    moments: Vec<Moments>,
}

impl Adam {
    pub fn new(lr: f64) -> Self {
        Self { lr, beta1: 0.9, beta2: 0.999, eps: 1e-8, t: 0, moments: Vec::new() }
    }

    /// Number of steps taken so far.
    pub fn steps(&self) -> u32 {
        self.t
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [ComplexVec], grads: &[ComplexVec]) -> Result<()> {
        check_shapes(params, grads)?;
        if self.moments.len() != params.len() {
            self.moments = params.iter().map(|p| Moments::zeros(p.dim())).collect();
            self.t = 0;
        }
        self.t += 1;
        let bc1 = 1.0 - self.beta1.powi(self.t as i32);
        let bc2 = 1.0 - self.beta2.powi(self.t as i32);

        for ((p, g), mo) in params.iter_mut().zip(grads.iter()).zip(self.moments.iter_mut()) {
            for k in 0..p.dim() {
                let gk = g.data[k];
                mo.m[k] = mo.m[k] * self.beta1 + gk * (1.0 - self.beta1);
                mo.v_re[k] = mo.v_re[k] * self.beta2 + gk.re * gk.re * (1.0 - self.beta2);
                mo.v_im[k] = mo.v_im[k] * self.beta2 + gk.im * gk.im * (1.0 - self.beta2);

                let m_hat = mo.m[k] / bc1;
                let step_re = m_hat.re / ((mo.v_re[k] / bc2).sqrt() + self.eps);
                let step_im = m_hat.im / ((mo.v_im[k] / bc2).sqrt() + self.eps);
                p.data[k] -= Complex64::new(step_re, step_im) * self.lr;
            }
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }
}
