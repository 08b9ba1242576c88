//! The federation chain state: which aggregate key and block size limit
//! govern each height.
//!
//! [`FederationChain`] owns the live [`XFieldHistory`] and keeps it in
//! step with the store as headers are connected and disconnected.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use fedchain_core::{
    check_block_size, validate_genesis, validate_xfield, AggregatePublicKey, BlockHash, BlockHeader,
    ValidationError, XFieldChange, XFieldHistory, XFieldType, MAX_BLOCK_SIZE,
};
use fedchain_store::{AppendResult, StoreExt, XFieldStore};

use crate::error::{ChainError, Result};
use crate::params::{network_magic, MAINNET_NETWORK_ID};

/// Configuration for a federation chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FederationConfig {
    /// Network id; selects the genesis file and the message start bytes.
    pub network_id: u32,
    /// Whether connected headers must carry a valid proof.
    pub verify_proofs: bool,
    /// Max block size in effect from genesis.
    pub initial_max_block_size: u32,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            network_id: MAINNET_NETWORK_ID,
            verify_proofs: true,
            initial_max_block_size: MAX_BLOCK_SIZE,
        }
    }
}

impl FederationConfig {
    pub fn network_magic(&self) -> [u8; 4] {
        network_magic(self.network_id)
    }
}

/// Result of connecting a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Header accepted; federation parameters unchanged.
    Connected(BlockHash),
    /// Header accepted and its xfield takes effect from the next height.
    ParameterChanged(XFieldChange),
}

/// Chain-state manager for a federation.
///
/// Provides:
/// - Genesis validation and store initialisation
/// - Header connection with proof checks against the key active at a height
/// - Disconnection of blocks during a reorg
/// - Aggregate key and block size queries per height
pub struct FederationChain<S: XFieldStore> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: FederationConfig,
    /// Validated genesis header.
    genesis: BlockHeader,
    /// Live history, mirrored in the store.
    history: RwLock<XFieldHistory>,
}

impl<S: XFieldStore> FederationChain<S> {
    /// Open the chain over `store`.
    ///
    /// An empty store is initialised from `genesis`. A store that already
    /// holds a different genesis is refused.
    pub async fn open(store: S, genesis: BlockHeader, config: FederationConfig) -> Result<Self> {
        // 1. Genesis must be self-consistent
        let genesis_key = validate_genesis(&genesis)?;
        let genesis_hash = genesis.block_hash();

        // 2. Store must agree on genesis
        if let Some(stored) = store.get_genesis().await? {
            if stored != genesis {
                return Err(ChainError::GenesisMismatch {
                    stored: stored.block_hash(),
                    expected: genesis_hash,
                });
            }
        } else {
            store.put_genesis(&genesis).await?;
        }

        // 3. Load history, seeding it on first open
        let mut history = store.load_history().await?;
        if history.latest(XFieldType::AggPubKey).is_none() {
            history = XFieldHistory::seeded(&genesis_key, genesis_hash, config.initial_max_block_size);
            store.save_history(&history).await?;
            info!(genesis = %genesis_hash, key = %genesis_key, "initialised federation chain");
        } else {
            debug!(
                genesis = %genesis_hash,
                key_changes = history.changes(XFieldType::AggPubKey).len(),
                size_changes = history.changes(XFieldType::MaxBlockSize).len(),
                "loaded federation chain"
            );
        }

        Ok(Self {
            store: Arc::new(store),
            config,
            genesis,
            history: RwLock::new(history),
        })
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &FederationConfig {
        &self.config
    }

    pub fn genesis(&self) -> &BlockHeader {
        &self.genesis
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Header Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Connect `header` at `height`.
    ///
    /// The proof must verify under the aggregate key active at `height`.
    /// A new xfield value is recorded as effective from `height + 1`.
    #[instrument(skip(self, header), fields(hash = %header.block_hash()))]
    pub async fn connect_header(&self, header: &BlockHeader, height: u32) -> Result<ConnectOutcome> {
        if height == 0 {
            return Err(ChainError::InvalidOperation("genesis cannot be connected".into()));
        }
        let next_height = height
            .checked_add(1)
            .ok_or_else(|| ChainError::InvalidOperation(format!("height {} out of range", height)))?;

        // 1. Xfield payload must be valid
        if let Err(e) = validate_xfield(header.xfield()) {
            warn!(reason = e.reject_reason(), "rejected header: {}", e);
            return Err(e.into());
        }

        let mut history = self.history.write().await;

        // 2. Proof must verify under the key active at this height
        if self.config.verify_proofs {
            let key = history.aggregate_pubkey_at(height).ok_or_else(|| {
                ChainError::InvalidOperation(format!("no aggregate key at height {}", height))
            })?;

            let (unsigned, proof) = header.clone().into_parts();
            let mut candidate = BlockHeader::new(unsigned);
            if !candidate.absorb_proof(&proof, &key) {
                warn!(reason = "bad-proof", key = %key, "rejected header: proof verification failed");
                return Err(ValidationError::ProofVerificationFailed.into());
            }
        }

        let block_hash = header.block_hash();

        // 3. Record a parameter change
        if !history.is_new(header.xfield()) {
            debug!("connected header");
            return Ok(ConnectOutcome::Connected(block_hash));
        }

        let change = XFieldChange::new(header.xfield().clone(), next_height, block_hash);
        let mut updated = history.clone();
        updated.add(change.clone())?;

        if self.store.append_change(&change).await? == AppendResult::AlreadyExists {
            debug!("xfield change already recorded");
        }
        *history = updated;

        info!(
            xfield_type = %change.xfield_type(),
            value = %change.value.value_string(),
            effective_height = next_height,
            "recorded xfield change"
        );
        Ok(ConnectOutcome::ParameterChanged(change))
    }

    /// Disconnect the block `block_hash`, dropping the changes it introduced.
    pub async fn disconnect_block(&self, block_hash: &BlockHash) -> Result<Vec<XFieldChange>> {
        if *block_hash == self.genesis.block_hash() {
            return Err(ChainError::InvalidOperation("genesis cannot be disconnected".into()));
        }

        let mut history = self.history.write().await;
        let removed = self.store.remove_changes_for_block(block_hash).await?;
        history.remove_by_block_hash(block_hash);

        if !removed.is_empty() {
            info!(block = %block_hash, count = removed.len(), "disconnected xfield changes");
        }
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Aggregate key that signs the block at `height`.
    pub async fn aggregate_pubkey_at(&self, height: u32) -> Option<AggregatePublicKey> {
        self.history.read().await.aggregate_pubkey_at(height)
    }

    /// Max block size in effect at `height`.
    pub async fn max_block_size_at(&self, height: u32) -> u32 {
        self.history
            .read()
            .await
            .max_block_size_at(height)
            .unwrap_or(self.config.initial_max_block_size)
    }

    /// Check the serialized size of the block at `height`.
    pub async fn check_block_size(&self, size: usize, height: u32) -> Result<()> {
        let max = self.max_block_size_at(height).await;
        check_block_size(size, max)?;
        Ok(())
    }

    /// Independent copy of the live history.
    pub async fn history_snapshot(&self) -> XFieldHistory {
        self.history.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedchain_core::{BlockHeaderBuilder, Hash256, Keypair, XField};
    use fedchain_store::MemoryStore;

    fn keypair(seed: u8) -> Keypair {
        Keypair::from_secret_bytes(&[seed; 32]).unwrap()
    }

    fn genesis() -> BlockHeader {
        BlockHeaderBuilder::new(Hash256::ZERO)
            .time(1_600_000_000)
            .xfield(XField::agg_pubkey(keypair(1).public_key()))
            .sign(&keypair(1))
    }

    fn child(prev: BlockHash, xfield: XField, signer: &Keypair) -> BlockHeader {
        BlockHeaderBuilder::new(prev)
            .time(1_600_000_600)
            .xfield(xfield)
            .sign(signer)
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = FederationConfig {
            network_id: 1905960821,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<FederationConfig>(&json).unwrap(), config);

        let partial: FederationConfig = serde_json::from_str(r#"{"verify_proofs":false}"#).unwrap();
        assert_eq!(partial.network_id, 1);
        assert_eq!(partial.initial_max_block_size, MAX_BLOCK_SIZE);
        assert!(!partial.verify_proofs);
    }

    #[tokio::test]
    async fn test_open_seeds_history() {
        let chain = FederationChain::open(MemoryStore::new(), genesis(), FederationConfig::default())
            .await
            .unwrap();

        assert_eq!(chain.aggregate_pubkey_at(0).await, Some(keypair(1).public_key()));
        assert_eq!(chain.aggregate_pubkey_at(100).await, Some(keypair(1).public_key()));
        assert_eq!(chain.max_block_size_at(0).await, MAX_BLOCK_SIZE);
    }

    #[tokio::test]
    async fn test_connect_plain_header() {
        let chain = FederationChain::open(MemoryStore::new(), genesis(), FederationConfig::default())
            .await
            .unwrap();

        let header = child(genesis().block_hash(), XField::None, &keypair(1));
        let outcome = chain.connect_header(&header, 1).await.unwrap();
        assert_eq!(outcome, ConnectOutcome::Connected(header.block_hash()));
    }

    #[tokio::test]
    async fn test_connect_rejects_wrong_signer() {
        let chain = FederationChain::open(MemoryStore::new(), genesis(), FederationConfig::default())
            .await
            .unwrap();

        let header = child(genesis().block_hash(), XField::None, &keypair(2));
        let err = chain.connect_header(&header, 1).await.unwrap_err();
        assert_eq!(err.reject_reason(), Some("bad-proof"));
    }

    #[tokio::test]
    async fn test_connect_without_proof_checks() {
        let config = FederationConfig {
            verify_proofs: false,
            ..Default::default()
        };
        let chain = FederationChain::open(MemoryStore::new(), genesis(), config)
            .await
            .unwrap();

        let header = child(genesis().block_hash(), XField::None, &keypair(2));
        assert!(chain.connect_header(&header, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_xfield() {
        let chain = FederationChain::open(MemoryStore::new(), genesis(), FederationConfig::default())
            .await
            .unwrap();

        let header = child(genesis().block_hash(), XField::MaxBlockSize(0), &keypair(1));
        let err = chain.connect_header(&header, 1).await.unwrap_err();
        assert_eq!(err.reject_reason(), Some("bad-xfieldType-xfield"));
    }

    #[tokio::test]
    async fn test_block_size_change_takes_effect_next_height() {
        let chain = FederationChain::open(MemoryStore::new(), genesis(), FederationConfig::default())
            .await
            .unwrap();

        let header = child(genesis().block_hash(), XField::MaxBlockSize(2_000_000), &keypair(1));
        let outcome = chain.connect_header(&header, 5).await.unwrap();
        assert!(matches!(outcome, ConnectOutcome::ParameterChanged(ref c) if c.height == 6));

        assert_eq!(chain.max_block_size_at(5).await, MAX_BLOCK_SIZE);
        assert_eq!(chain.max_block_size_at(6).await, 2_000_000);
        assert!(chain.check_block_size(1_500_000, 6).await.is_ok());

        let err = chain.check_block_size(1_500_000, 5).await.unwrap_err();
        assert_eq!(err.reject_reason(), Some("bad-blk-length"));
    }

    #[tokio::test]
    async fn test_genesis_cannot_be_connected_or_disconnected() {
        let chain = FederationChain::open(MemoryStore::new(), genesis(), FederationConfig::default())
            .await
            .unwrap();

        assert!(matches!(
            chain.connect_header(&genesis(), 0).await,
            Err(ChainError::InvalidOperation(_))
        ));
        assert!(matches!(
            chain.disconnect_block(&genesis().block_hash()).await,
            Err(ChainError::InvalidOperation(_))
        ));
    }
}
