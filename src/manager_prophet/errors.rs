use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProphetError {
    #[error("ProphetError::InvalidParameter: {0}")]
    InvalidParameter(String),
    #[error("ProphetError::InsufficientData: need at least {needed} observed rows, got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("ProphetError::Fit: {0}")]
    Fit(String),
    #[error("ProphetError::Sampling: {0}")]
    Sampling(String),
    #[error("ProphetError::NotFitted: model must be fitted before use")]
    NotFitted,
}
