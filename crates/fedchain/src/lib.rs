//! # Fedchain
//!
//! Chain state for a federated, signature-governed blockchain: the genesis
//! block, and which aggregate public key and max block size govern every
//! height.
//!
//! ## Overview
//!
//! - **Genesis**: Loaded from `genesis.<network_id>`, must sign itself
//! - **Headers**: Connected at a height, proof checked against the key active there
//! - **XFields**: A header may carry a new key or block size, effective one block later
//! - **Reorgs**: Disconnecting a block drops the changes it introduced
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fedchain::{load_genesis, FederationChain, FederationConfig};
//! use fedchain::store::SqliteStore;
//!
//! async fn example() {
//!     let config = FederationConfig::default();
//!     let genesis = load_genesis("/var/lib/fedchain".as_ref(), config.network_id).unwrap();
//!
//!     // Open storage
//!     let store = SqliteStore::open("fedchain.db").unwrap();
//!
//!     // Open the chain
//!     let chain = FederationChain::open(store, genesis, config).await.unwrap();
//!
//!     // Connect a header received from a peer
//!     // let outcome = chain.connect_header(&header, height).await.unwrap();
//!
//!     let key = chain.aggregate_pubkey_at(1).await;
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `fedchain::core` - Consensus primitives (XField, BlockHeader, ColorIdentifier)
//! - `fedchain::store` - Storage abstraction and SQLite

pub mod chain;
pub mod error;
pub mod params;
pub mod rpc;

// Re-export component crates
pub use fedchain_core as core;
pub use fedchain_store as store;

// Re-export main types for convenience
pub use chain::{ConnectOutcome, FederationChain, FederationConfig};
pub use error::{ChainError, Result};
pub use params::{load_genesis, network_magic, parse_genesis_hex};
pub use rpc::{xfield_changes_json, BlockHeaderView};

// Re-export commonly used core types
pub use fedchain_core::{
    AggregatePublicKey, BlockHash, BlockHeader, BlockHeaderBuilder, ColorIdentifier, Keypair, TokenType,
    XField, XFieldChange, XFieldHistory, XFieldType,
};
