//! Store trait: the abstract interface for chain-state persistence.
//!
//! Holds the genesis header and, per tracked xfield type, the ordered list
//! of recorded changes. Implementations include SQLite (primary) and
//! in-memory (for tests).

use async_trait::async_trait;
use fedchain_core::{BlockHash, BlockHeader, XFieldChange, XFieldChangeList, XFieldHistory, XFieldType};

use crate::error::Result;

/// Result of appending an xfield change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendResult {
    /// Change was recorded.
    Appended,
    /// The same change from the same block is already recorded.
    AlreadyExists,
}

/// The store trait: async interface for chain-state persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Keyed by type**: change lists are indexed by [`XFieldType::db_key`].
/// - **Idempotent appends**: re-recording a change returns `AlreadyExists`.
/// - **One change per block and type**: a different change from the same
///   block is a `Conflict` error.
#[async_trait]
pub trait XFieldStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Genesis
    // ─────────────────────────────────────────────────────────────────────────

    /// Record the genesis header.
    ///
    /// # Returns
    /// - `Ok(())` if stored, or if the same header is already stored.
    /// - `Conflict` if a different genesis is already stored.
    async fn put_genesis(&self, genesis: &BlockHeader) -> Result<()>;

    /// Get the recorded genesis header.
    async fn get_genesis(&self) -> Result<Option<BlockHeader>>;

    // ─────────────────────────────────────────────────────────────────────────
    // XField Changes
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a change to the list of its type.
    async fn append_change(&self, change: &XFieldChange) -> Result<AppendResult>;

    /// Read all changes of a type, ordered by height.
    ///
    /// # Returns
    /// An empty list if nothing was recorded for the type.
    async fn read_change_list(&self, xfield_type: XFieldType) -> Result<XFieldChangeList>;

    /// Replace the whole list of a type.
    async fn write_change_list(&self, list: &XFieldChangeList) -> Result<()>;

    /// Remove every change introduced by `block_hash`.
    ///
    /// # Returns
    /// The removed changes.
    async fn remove_changes_for_block(&self, block_hash: &BlockHash) -> Result<Vec<XFieldChange>>;
}

/// Extension helpers built on the store.
pub trait StoreExt: XFieldStore {
    /// Rebuild the history of every tracked type.
    fn load_history(&self) -> impl std::future::Future<Output = Result<XFieldHistory>> + Send;

    /// Persist every tracked list of `history`.
    fn save_history(&self, history: &XFieldHistory) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl<S: XFieldStore + ?Sized> StoreExt for S {
    async fn load_history(&self) -> Result<XFieldHistory> {
        let mut lists = Vec::with_capacity(XFieldType::TRACKED.len());
        for ty in XFieldType::TRACKED {
            lists.push(self.read_change_list(ty).await?);
        }
        Ok(XFieldHistory::from_change_lists(lists)?)
    }

    async fn save_history(&self, history: &XFieldHistory) -> Result<()> {
        for ty in XFieldType::TRACKED {
            self.write_change_list(&history.change_list(ty)).await?;
        }
        Ok(())
    }
}
