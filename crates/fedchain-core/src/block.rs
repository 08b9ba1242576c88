//! Block header with a detachable proof.
//!
//! A header is split into two values:
//!
//! - [`BlockHeaderWithoutProof`]: every field the federation signs. Its
//!   [`signing_hash`](BlockHeaderWithoutProof::signing_hash) cannot depend
//!   on the proof because the proof is not part of the type.
//! - [`BlockHeader`]: a thin wrapper pairing the signable header with the
//!   proof bytes. After construction the proof only changes through
//!   [`BlockHeader::absorb_proof`], which verifies before storing.
//!
//! ## Wire Format
//!
//! ```text
//! [features i32][prev 32][merkle 32][im_merkle 32][time u32][xfield][proof var_bytes]
//! ```

use bytes::Bytes;
use std::fmt;

use crate::crypto::{double_sha256, AggregatePublicKey, Keypair, SchnorrSignature};
use crate::error::CoreError;
use crate::types::{BlockHash, Hash256};
use crate::wire::{write_var_bytes, Decode, Encode, Reader};
use crate::xfield::XField;

/// Feature flags carried by every block on this chain.
pub const TAPYRUS_BLOCK_FEATURES: i32 = 1;

/// The signed portion of a block header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BlockHeaderWithoutProof {
    pub features: i32,
    pub prev_block: BlockHash,
    pub merkle_root: Hash256,
    /// Merkle root over the non-malleable parts of each transaction.
    pub im_merkle_root: Hash256,
    pub time: u32,
    pub xfield: XField,
}

impl BlockHeaderWithoutProof {
    /// Double SHA-256 over the header without proof.
    pub fn signing_hash(&self) -> Hash256 {
        double_sha256(&self.encode())
    }

    pub fn is_null(&self) -> bool {
        self.time == 0
    }
}

impl Encode for BlockHeaderWithoutProof {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.features.to_le_bytes());
        self.prev_block.encode_to(out);
        self.merkle_root.encode_to(out);
        self.im_merkle_root.encode_to(out);
        out.extend_from_slice(&self.time.to_le_bytes());
        self.xfield.encode_to(out);
    }
}

impl Decode for BlockHeaderWithoutProof {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CoreError> {
        Ok(Self {
            features: r.read_i32_le()?,
            prev_block: Hash256::decode(r)?,
            merkle_root: Hash256::decode(r)?,
            im_merkle_root: Hash256::decode(r)?,
            time: r.read_u32_le()?,
            xfield: XField::decode(r)?,
        })
    }
}

/// A full block header: signable fields plus proof.
///
/// `Default` is the null header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BlockHeader {
    header: BlockHeaderWithoutProof,
    proof: Bytes,
}

impl BlockHeader {
    /// Wrap a signable header with an empty proof.
    pub fn new(header: BlockHeaderWithoutProof) -> Self {
        Self {
            header,
            proof: Bytes::new(),
        }
    }

    pub fn header(&self) -> &BlockHeaderWithoutProof {
        &self.header
    }

    pub fn proof(&self) -> &[u8] {
        &self.proof
    }

    pub fn xfield(&self) -> &XField {
        &self.header.xfield
    }

    pub fn into_parts(self) -> (BlockHeaderWithoutProof, Bytes) {
        (self.header, self.proof)
    }

    pub fn signing_hash(&self) -> Hash256 {
        self.header.signing_hash()
    }

    /// Double SHA-256 over the full header including the proof.
    pub fn block_hash(&self) -> BlockHash {
        double_sha256(&self.encode())
    }

    /// Verify `proof` over the signing hash and store it.
    ///
    /// Returns false and leaves the header untouched when the proof is not
    /// a valid 64-byte signature under `key`.
    pub fn absorb_proof(&mut self, proof: &[u8], key: &AggregatePublicKey) -> bool {
        self.try_absorb_proof(proof, key).is_ok()
    }

    /// Like [`absorb_proof`](Self::absorb_proof) but reports the failure.
    pub fn try_absorb_proof(&mut self, proof: &[u8], key: &AggregatePublicKey) -> Result<(), CoreError> {
        let sig = SchnorrSignature::from_slice(proof).ok_or(CoreError::ProofVerificationFailed)?;
        key.verify(&self.signing_hash(), &sig)?;
        self.proof = Bytes::copy_from_slice(proof);
        Ok(())
    }

    /// Check the current proof without changing anything.
    pub fn verify_proof(&self, key: &AggregatePublicKey) -> Result<(), CoreError> {
        let sig = SchnorrSignature::from_slice(&self.proof).ok_or(CoreError::ProofVerificationFailed)?;
        key.verify(&self.signing_hash(), &sig)
    }

    pub fn is_null(&self) -> bool {
        self.header.is_null()
    }

    pub fn set_null(&mut self) {
        self.header = BlockHeaderWithoutProof::default();
        self.proof = Bytes::new();
    }
}

impl From<BlockHeaderWithoutProof> for BlockHeader {
    fn from(header: BlockHeaderWithoutProof) -> Self {
        Self::new(header)
    }
}

impl Encode for BlockHeader {
    fn encode_to(&self, out: &mut Vec<u8>) {
        self.header.encode_to(out);
        write_var_bytes(&self.proof, out);
    }
}

impl Decode for BlockHeader {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CoreError> {
        let header = BlockHeaderWithoutProof::decode(r)?;
        let proof = Bytes::copy_from_slice(r.read_var_bytes()?);
        Ok(Self { header, proof })
    }
}

impl fmt::Display for BlockHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BlockHeader(hash={}, features=0x{:08x}, prev_block={}, merkle_root={}, \
             im_merkle_root={}, time={}, xfield={}, proof={})",
            self.block_hash(),
            self.header.features,
            self.header.prev_block,
            self.header.merkle_root,
            self.header.im_merkle_root,
            self.header.time,
            self.header.xfield,
            hex::encode(&self.proof),
        )
    }
}

/// Builder for block headers.
pub struct BlockHeaderBuilder {
    header: BlockHeaderWithoutProof,
}

impl BlockHeaderBuilder {
    /// Start a header on top of `prev_block`.
    pub fn new(prev_block: BlockHash) -> Self {
        Self {
            header: BlockHeaderWithoutProof {
                features: TAPYRUS_BLOCK_FEATURES,
                prev_block,
                ..Default::default()
            },
        }
    }

    pub fn features(mut self, features: i32) -> Self {
        self.header.features = features;
        self
    }

    pub fn merkle_root(mut self, root: Hash256) -> Self {
        self.header.merkle_root = root;
        self
    }

    pub fn im_merkle_root(mut self, root: Hash256) -> Self {
        self.header.im_merkle_root = root;
        self
    }

    pub fn time(mut self, time: u32) -> Self {
        self.header.time = time;
        self
    }

    pub fn xfield(mut self, xfield: XField) -> Self {
        self.header.xfield = xfield;
        self
    }

    /// Build without a proof.
    pub fn build(self) -> BlockHeader {
        BlockHeader::new(self.header)
    }

    /// Build and sign with a federation key.
    pub fn sign(self, keypair: &Keypair) -> BlockHeader {
        let sig = keypair.sign_schnorr(&self.header.signing_hash());
        BlockHeader {
            header: self.header,
            proof: Bytes::copy_from_slice(sig.as_bytes()),
        }
    }
}
