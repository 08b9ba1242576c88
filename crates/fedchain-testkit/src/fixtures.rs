//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a federation with seeded keys,
//! its signed genesis, and child headers that chain on top of it.

use fedchain::{FederationChain, FederationConfig};
use fedchain_core::{BlockHash, BlockHeader, BlockHeaderBuilder, Hash256, Keypair, XField};
use fedchain_store::MemoryStore;

/// Genesis time used by every fixture.
pub const GENESIS_TIME: u32 = 1_562_925_929;

/// Block interval between fixture headers, in seconds.
pub const BLOCK_INTERVAL: u32 = 15;

/// A federation with a set of signing keys and a signed genesis.
///
/// `keys[0]` is the genesis key. Later keys are available for rotation.
pub struct FederationFixture {
    pub keys: Vec<Keypair>,
    pub genesis: BlockHeader,
}

impl FederationFixture {
    /// Create a fixture with `key_count` keys derived from `seed`.
    pub fn with_seed(seed: u8, key_count: usize) -> Self {
        let keys: Vec<Keypair> = (0..key_count.max(1))
            .map(|i| seeded_keypair(seed, i as u8))
            .collect();
        let genesis = BlockHeaderBuilder::new(Hash256::ZERO)
            .time(GENESIS_TIME)
            .merkle_root(Hash256::from_bytes([seed; 32]))
            .im_merkle_root(Hash256::from_bytes([seed; 32]))
            .xfield(XField::agg_pubkey(keys[0].public_key()))
            .sign(&keys[0]);
        Self { keys, genesis }
    }

    /// Create a fixture with three keys.
    pub fn new() -> Self {
        Self::with_seed(0x01, 3)
    }

    pub fn genesis_hash(&self) -> BlockHash {
        self.genesis.block_hash()
    }

    /// Key by index.
    pub fn key(&self, index: usize) -> &Keypair {
        &self.keys[index]
    }

    /// A header at `height` on top of `prev`, signed by key `signer`.
    pub fn make_header(&self, prev: BlockHash, height: u32, xfield: XField, signer: usize) -> BlockHeader {
        BlockHeaderBuilder::new(prev)
            .time(GENESIS_TIME + height * BLOCK_INTERVAL)
            .merkle_root(Hash256::from_bytes(height_bytes(height)))
            .im_merkle_root(Hash256::from_bytes(height_bytes(height)))
            .xfield(xfield)
            .sign(self.key(signer))
    }

    /// Headers 1..=count chaining from genesis, all signed by key `signer`
    /// and carrying no xfield.
    pub fn make_chain(&self, count: u32, signer: usize) -> Vec<BlockHeader> {
        let mut prev = self.genesis_hash();
        (1..=count)
            .map(|height| {
                let header = self.make_header(prev, height, XField::None, signer);
                prev = header.block_hash();
                header
            })
            .collect()
    }

    /// Open a chain over a fresh in-memory store.
    pub async fn open_chain(&self) -> fedchain::Result<FederationChain<MemoryStore>> {
        self.open_chain_with(FederationConfig::default()).await
    }

    pub async fn open_chain_with(&self, config: FederationConfig) -> fedchain::Result<FederationChain<MemoryStore>> {
        FederationChain::open(MemoryStore::new(), self.genesis.clone(), config).await
    }
}

impl Default for FederationFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic keypair for `(seed, index)`.
pub fn seeded_keypair(seed: u8, index: u8) -> Keypair {
    let mut secret = [seed; 32];
    secret[0] = 0x01;
    secret[31] = index.wrapping_add(1);
    Keypair::from_secret_bytes(&secret).expect("seeded secret is below the curve order")
}

fn height_bytes(height: u32) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes[..4].copy_from_slice(&height.to_le_bytes());
    bytes
}
