//! Error types for the store module.

use fedchain_core::CoreError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored bytes failed to decode.
    #[error("decoding error: {0}")]
    Decode(#[from] CoreError),

    /// A different record already occupies the slot.
    #[error("conflict on {what}: existing {existing}")]
    Conflict { what: String, existing: String },

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
