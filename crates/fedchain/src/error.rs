//! Error types for the chain facade.

use fedchain_core::{BlockHash, CoreError, ValidationError};
use fedchain_store::StoreError;
use thiserror::Error;

/// Errors that can occur during chain-state operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Decode or construction error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Consensus rejection.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The store was initialised with a different genesis block.
    #[error("genesis mismatch: store has {stored}, expected {expected}")]
    GenesisMismatch { stored: BlockHash, expected: BlockHash },

    /// Invalid operation.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl ChainError {
    /// Reject reason for consensus failures, if this is one.
    pub fn reject_reason(&self) -> Option<&'static str> {
        match self {
            ChainError::Validation(e) => Some(e.reject_reason()),
            _ => None,
        }
    }
}

/// Result type for chain operations.
pub type Result<T> = std::result::Result<T, ChainError>;
