//! Federation chain integration tests: key rotation, reorgs and persistence.

use fedchain::store::{MemoryStore, SqliteStore, XFieldStore};
use fedchain::{
    xfield_changes_json, BlockHash, BlockHeader, BlockHeaderBuilder, ChainError, ConnectOutcome,
    FederationChain, FederationConfig, Keypair, XField,
};
use fedchain_core::{Hash256, MAX_BLOCK_SIZE};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn keypair(seed: u8) -> Keypair {
    Keypair::from_secret_bytes(&[seed; 32]).unwrap()
}

fn genesis() -> BlockHeader {
    BlockHeaderBuilder::new(Hash256::ZERO)
        .time(1_700_000_000)
        .xfield(XField::agg_pubkey(keypair(1).public_key()))
        .sign(&keypair(1))
}

fn header(prev: BlockHash, time: u32, xfield: XField, signer: &Keypair) -> BlockHeader {
    BlockHeaderBuilder::new(prev)
        .time(time)
        .xfield(xfield)
        .sign(signer)
}

async fn open_memory() -> FederationChain<MemoryStore> {
    FederationChain::open(MemoryStore::new(), genesis(), FederationConfig::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_key_rotation() {
    init_tracing();
    let chain = open_memory().await;

    // Block 1, signed by the genesis key, hands over to key 2.
    let h1 = header(
        genesis().block_hash(),
        1_700_000_060,
        XField::agg_pubkey(keypair(2).public_key()),
        &keypair(1),
    );
    let outcome = chain.connect_header(&h1, 1).await.unwrap();
    assert!(matches!(outcome, ConnectOutcome::ParameterChanged(ref c) if c.height == 2));

    assert_eq!(chain.aggregate_pubkey_at(1).await, Some(keypair(1).public_key()));
    assert_eq!(chain.aggregate_pubkey_at(2).await, Some(keypair(2).public_key()));

    // Block 2 must be signed by the new key.
    let by_old = header(h1.block_hash(), 1_700_000_120, XField::None, &keypair(1));
    let err = chain.connect_header(&by_old, 2).await.unwrap_err();
    assert_eq!(err.reject_reason(), Some("bad-proof"));

    let by_new = header(h1.block_hash(), 1_700_000_120, XField::None, &keypair(2));
    assert_eq!(
        chain.connect_header(&by_new, 2).await.unwrap(),
        ConnectOutcome::Connected(by_new.block_hash())
    );
}

#[tokio::test]
async fn test_repeated_value_is_not_a_change() {
    let chain = open_memory().await;

    let same_key = header(
        genesis().block_hash(),
        1_700_000_060,
        XField::agg_pubkey(keypair(1).public_key()),
        &keypair(1),
    );
    assert!(matches!(
        chain.connect_header(&same_key, 1).await.unwrap(),
        ConnectOutcome::Connected(_)
    ));

    let same_size = header(
        same_key.block_hash(),
        1_700_000_120,
        XField::MaxBlockSize(MAX_BLOCK_SIZE),
        &keypair(1),
    );
    assert!(matches!(
        chain.connect_header(&same_size, 2).await.unwrap(),
        ConnectOutcome::Connected(_)
    ));
    assert_eq!(chain.history_snapshot().await.changes(fedchain::XFieldType::MaxBlockSize).len(), 1);
}

#[tokio::test]
async fn test_disconnect_restores_previous_key() {
    init_tracing();
    let chain = open_memory().await;

    let h1 = header(
        genesis().block_hash(),
        1_700_000_060,
        XField::agg_pubkey(keypair(2).public_key()),
        &keypair(1),
    );
    chain.connect_header(&h1, 1).await.unwrap();

    let removed = chain.disconnect_block(&h1.block_hash()).await.unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(chain.aggregate_pubkey_at(2).await, Some(keypair(1).public_key()));

    let stored = chain
        .store()
        .read_change_list(fedchain::XFieldType::AggPubKey)
        .await
        .unwrap();
    assert_eq!(stored.changes.len(), 1);

    // A competing block 1 now rotates to key 3 instead.
    let alt = header(
        genesis().block_hash(),
        1_700_000_061,
        XField::agg_pubkey(keypair(3).public_key()),
        &keypair(1),
    );
    chain.connect_header(&alt, 1).await.unwrap();
    assert_eq!(chain.aggregate_pubkey_at(2).await, Some(keypair(3).public_key()));
}

#[tokio::test]
async fn test_summary_json() {
    let chain = open_memory().await;
    let h1 = header(genesis().block_hash(), 1_700_000_060, XField::MaxBlockSize(4_000_000), &keypair(1));
    chain.connect_header(&h1, 9).await.unwrap();

    let summary = xfield_changes_json(&chain.history_snapshot().await);
    assert_eq!(
        summary["blockSizeChanges"],
        serde_json::json!([{ "1000000": 0 }, { "4000000": 10 }])
    );
    assert_eq!(
        summary["aggregatePubkeys"],
        serde_json::json!([{ keypair(1).public_key().to_hex(): 0 }])
    );
}

#[tokio::test]
async fn test_sqlite_reopen_keeps_history() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.db");

    let h1 = header(
        genesis().block_hash(),
        1_700_000_060,
        XField::agg_pubkey(keypair(2).public_key()),
        &keypair(1),
    );

    {
        let store = SqliteStore::open(&path).unwrap();
        let chain = FederationChain::open(store, genesis(), FederationConfig::default())
            .await
            .unwrap();
        chain.connect_header(&h1, 1).await.unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let chain = FederationChain::open(store, genesis(), FederationConfig::default())
        .await
        .unwrap();
    assert_eq!(chain.aggregate_pubkey_at(1).await, Some(keypair(1).public_key()));
    assert_eq!(chain.aggregate_pubkey_at(2).await, Some(keypair(2).public_key()));
}

#[tokio::test]
async fn test_reopen_with_other_genesis_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.db");

    {
        let store = SqliteStore::open(&path).unwrap();
        FederationChain::open(store, genesis(), FederationConfig::default())
            .await
            .unwrap();
    }

    let other = BlockHeaderBuilder::new(Hash256::ZERO)
        .time(1_700_000_001)
        .xfield(XField::agg_pubkey(keypair(5).public_key()))
        .sign(&keypair(5));

    let store = SqliteStore::open(&path).unwrap();
    let result = FederationChain::open(store, other.clone(), FederationConfig::default()).await;
    match result {
        Err(ChainError::GenesisMismatch { stored, expected }) => {
            assert_eq!(stored, genesis().block_hash());
            assert_eq!(expected, other.block_hash());
        }
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("opened with a different genesis"),
    }
}
