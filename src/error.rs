use thiserror::Error;

use crate::db::StoreError;

/// Errors surfaced by the budget ledger and the services built on it.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed month key, negative amount, oversize text and the like.
    /// The caller fixes the input; never retried.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Persistence layer unreachable or the write conflicted. Safe to retry
    /// as a whole read-modify-write.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    /// HTTP-equivalent status for the API layer.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Storage(_) => 500,
        }
    }

    /// Process exit code used by the command line.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::NotFound(_) => 3,
            Self::Storage(_) => 1,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
