//! GRA meta-nulling — coupled complex domain states driven to their goals.
//!
//! Core mapping:
//!   - Domain = Hilbert space C^n + goal projector P_G0
//!   - Local foam  Phi^(a) = |Re<psi|P|psi> - |<psi|psi>||^2
//!   - Meta foam   Phi_meta = sum_{i<j} |<psi_i|P_tot|psi_j>|^2, P_tot = mean P
//!   - J_meta = sum_a Phi^(a) + lambda_meta * Phi_meta, minimized by gradient
//!     descent with renormalization after every step

pub mod errors;
pub mod types;
pub mod linalg;
pub mod hilbert;
pub mod domain;
pub mod foam;
pub mod optimizer;
pub mod history;
pub mod config;
pub mod nulling;

pub use config::GraConfig;
pub use domain::DomainGoal;
pub use errors::{GraError, Result};
pub use history::OptimizationHistory;
pub use hilbert::HilbertSpace;
pub use nulling::GraMetaNulling;
pub use optimizer::{Adam, Optimizer, OptimizerKind, Sgd};
pub use types::{ComplexMatrix, ComplexVec};
