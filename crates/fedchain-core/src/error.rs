//! Error types for the federated chain core.

use thiserror::Error;

/// Core errors raised while decoding or constructing consensus values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(
        "Upgrade node. Unknown xfield found in block. \
         Node cannot sync to the blockchain with xfieldType={0}"
    )]
    UnknownXFieldType(u8),

    #[error("Type and data mismatch in XField. xfieldType={declared} xfieldValue={actual}")]
    XFieldTypeValueMismatch { declared: u8, actual: u8 },

    #[error("stream underrun: needed {needed} bytes, {remaining} remaining")]
    StreamUnderrun { needed: usize, remaining: usize },

    #[error("non-canonical compact size")]
    NonCanonicalCompactSize,

    #[error("compact size too large: {0}")]
    CompactSizeTooLarge(u64),

    #[error("trailing bytes after value: {0}")]
    TrailingBytes(usize),

    #[error("Aggregate Public Key for Signed Block is empty")]
    EmptyAggregatePublicKey,

    #[error("Uncompressed public key format are not acceptable: {0}")]
    UncompressedAggregatePublicKey(String),

    #[error("Aggregate Public Key for Signed Block is invalid: {0}")]
    InvalidAggregatePublicKey(String),

    #[error("invalid secret key")]
    InvalidSecretKey,

    #[error("unknown token type: 0x{0:02x}")]
    UnknownTokenType(u8),

    #[error("token type {0} cannot be derived from {1}")]
    TokenTypeMismatch(String, &'static str),

    #[error("xfield type {0} is not tracked by history")]
    UntrackedXFieldType(u8),

    #[error("xfield change at height {height} precedes latest change at height {latest}")]
    OutOfOrderXFieldChange { height: u32, latest: u32 },

    #[error("block proof verification failed")]
    ProofVerificationFailed,

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Consensus rejections for headers and blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid xfield in block header: {0}")]
    BadXField(String),

    #[error("unknown xfield type {0}")]
    UnknownXField(u8),

    #[error("block proof verification failed")]
    ProofVerificationFailed,

    #[error("block size {size} exceeds maximum {max}")]
    BlockTooLarge { size: usize, max: u32 },

    #[error("ReadGenesisBlock: {0}")]
    InvalidGenesis(String),

    #[error("structural error: {0}")]
    StructuralError(String),
}

impl ValidationError {
    /// Stable reject reason reported to peers.
    pub fn reject_reason(&self) -> &'static str {
        match self {
            ValidationError::BadXField(_) => "bad-xfieldType-xfield",
            ValidationError::UnknownXField(_) => "unknown-xfieldType",
            ValidationError::ProofVerificationFailed => "bad-proof",
            ValidationError::BlockTooLarge { .. } => "bad-blk-length",
            ValidationError::InvalidGenesis(_) => "bad-genesis",
            ValidationError::StructuralError(_) => "bad-header",
        }
    }
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::UnknownXFieldType(t) => ValidationError::UnknownXField(t),
            CoreError::XFieldTypeValueMismatch { .. }
            | CoreError::EmptyAggregatePublicKey
            | CoreError::UncompressedAggregatePublicKey(_)
            | CoreError::InvalidAggregatePublicKey(_) => ValidationError::BadXField(e.to_string()),
            CoreError::ProofVerificationFailed => ValidationError::ProofVerificationFailed,
            other => ValidationError::StructuralError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_xfield_message() {
        let msg = CoreError::UnknownXFieldType(0xf).to_string();
        assert!(msg.starts_with("Upgrade node."));
        assert!(msg.ends_with("xfieldType=15"));
    }

    #[test]
    fn test_reject_reasons() {
        let bad: ValidationError = CoreError::EmptyAggregatePublicKey.into();
        assert_eq!(bad.reject_reason(), "bad-xfieldType-xfield");

        let proof: ValidationError = CoreError::ProofVerificationFailed.into();
        assert_eq!(proof, ValidationError::ProofVerificationFailed);

        let underrun: ValidationError = CoreError::StreamUnderrun {
            needed: 4,
            remaining: 1,
        }
        .into();
        assert_eq!(underrun.reject_reason(), "bad-header");
    }
}
