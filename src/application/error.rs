//! Application-level errors (wraps domain and store errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::traits::StoreError;

/// Resolution errors wrap domain and store errors and add
/// application-level context.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for resolver operations.
pub type ResolveResult<T> = Result<T, ResolveError>;
