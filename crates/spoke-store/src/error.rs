//! Store errors

use thiserror::Error;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLx error
    #[error("store error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Stored payload could not be decoded
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Convenience result alias
pub type StoreResult<T> = Result<T, StoreError>;
