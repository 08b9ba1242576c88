//! # Fedchain Core
//!
//! Consensus primitives for a federated, signature-governed chain: the
//! header extension field, the block header with its detachable proof,
//! and color identifiers for tokens.
//!
//! This crate contains no I/O, no storage, no networking. Verification
//! never looks up the federation key itself; callers pass the key that
//! was active at the height they are checking.
//!
//! ## Key Types
//!
//! - [`XField`] - Typed header slot carrying a federation parameter change
//! - [`BlockHeader`] - Signable header plus proof, see [`BlockHeaderWithoutProof`]
//! - [`ColorIdentifier`] - Native coin or token identifier
//! - [`XFieldHistory`] - Which parameter value is active at each height
//! - [`AggregatePublicKey`] - The federation's block signing key
//!
//! ## Encoding
//!
//! All consensus values are byte-exact. See the [`wire`] module.

pub mod block;
pub mod color;
pub mod crypto;
pub mod error;
pub mod history;
pub mod script;
pub mod types;
pub mod validation;
pub mod wire;
pub mod xfield;

pub use block::{BlockHeader, BlockHeaderBuilder, BlockHeaderWithoutProof, TAPYRUS_BLOCK_FEATURES};
pub use color::{ColorIdentifier, TokenType, NATIVE_ASSET_ALIAS};
pub use crypto::{double_sha256, sha256, AggregatePublicKey, Keypair, SchnorrSignature};
pub use error::{CoreError, ValidationError};
pub use history::{XFieldChange, XFieldChangeList, XFieldHistory};
pub use script::{color_id_from_script, colored_p2pkh, colored_p2sh, ColoredScriptKind};
pub use types::{BlockHash, Hash256, OutPoint};
pub use validation::{check_block_size, validate_genesis, validate_header, validate_xfield};
pub use wire::{Decode, Encode, TagPolicy};
pub use xfield::{XField, XFieldAggPubKey, XFieldType, DEFAULT_BLOCK_MAX_SIZE, MAX_BLOCK_SIZE};
