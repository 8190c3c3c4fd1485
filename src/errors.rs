//! GRA error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraError {
    #[error("DimensionMismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("InvalidInput: {0}")]
    InvalidInput(String),
    #[error("LinalgError: {0}")]
    Linalg(String),
    #[error("ConfigError: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GraError>;
