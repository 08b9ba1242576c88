//! Header validation: genesis rules, xfield checks and proof verification.

use crate::block::BlockHeader;
use crate::crypto::{AggregatePublicKey, SCHNORR_SIGNATURE_SIZE};
use crate::error::ValidationError;
use crate::xfield::XField;

/// Validate a genesis header and return the federation's first key.
///
/// This performs:
/// - Xfield type check (must carry an aggregate public key)
/// - Key check
/// - Proof length check
/// - Proof verification under the genesis key
pub fn validate_genesis(genesis: &BlockHeader) -> Result<AggregatePublicKey, ValidationError> {
    // 1. Xfield must be an aggregate key
    let XField::AggPubKey(raw) = genesis.xfield() else {
        return Err(ValidationError::InvalidGenesis(
            "invalid xfieldType in genesis block".into(),
        ));
    };

    // 2. Key must be a valid compressed point
    let key = raw.key()?;

    // 3. Proof must be a full signature
    if genesis.proof().len() != SCHNORR_SIGNATURE_SIZE {
        return Err(ValidationError::InvalidGenesis("invalid genesis block".into()));
    }

    // 4. Genesis signs itself
    genesis
        .verify_proof(&key)
        .map_err(|_| ValidationError::InvalidGenesis("Proof verification failed".into()))?;

    Ok(key)
}

/// Reject headers whose xfield payload is invalid.
pub fn validate_xfield(xfield: &XField) -> Result<(), ValidationError> {
    match xfield {
        XField::AggPubKey(raw) => raw.key().map(|_| ()).map_err(ValidationError::from),
        other if !other.is_valid() => Err(ValidationError::BadXField(format!(
            "invalid xfield value {}",
            other
        ))),
        _ => Ok(()),
    }
}

/// Validate a non-genesis header against the key active at its height.
pub fn validate_header(header: &BlockHeader, key: &AggregatePublicKey) -> Result<(), ValidationError> {
    validate_xfield(header.xfield())?;
    header
        .verify_proof(key)
        .map_err(|_| ValidationError::ProofVerificationFailed)
}

/// Check a serialized block size against the active maximum.
pub fn check_block_size(size: usize, max: u32) -> Result<(), ValidationError> {
    if size == 0 || size > max as usize {
        return Err(ValidationError::BlockTooLarge { size, max });
    }
    Ok(())
}
