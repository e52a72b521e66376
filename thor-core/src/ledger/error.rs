//! Ledger error types

use thiserror::Error;

/// Errors for cost and conversation bookkeeping
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid cost: {0} (must be finite and non-negative)")]
    InvalidCost(f64),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
