use thiserror::Error;

/// Failure of a transcript procedure
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input shape was rejected before touching the store
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
