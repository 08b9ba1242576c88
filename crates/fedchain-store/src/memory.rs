//! In-memory implementation of the store trait.
//!
//! This is primarily for testing. Lists are kept in their persisted byte
//! encoding, so the in-memory store exercises the same codec as the
//! block-tree database format.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use fedchain_core::{
    BlockHash, BlockHeader, Decode, Encode, XFieldChange, XFieldChangeList, XFieldType,
};

use crate::error::{Result, StoreError};
use crate::traits::{AppendResult, XFieldStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Encoded genesis header.
    genesis: Option<Vec<u8>>,

    /// Encoded change lists keyed by db key.
    lists: BTreeMap<u8, Vec<u8>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                genesis: None,
                lists: BTreeMap::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn list(&self, ty: XFieldType) -> Result<XFieldChangeList> {
        match self.lists.get(&ty.db_key()) {
            Some(bytes) => Ok(XFieldChangeList::from_bytes_as(ty, bytes)?),
            None => Ok(XFieldChangeList::new(ty)),
        }
    }

    fn put_list(&mut self, list: &XFieldChangeList) {
        self.lists.insert(list.xfield_type.db_key(), list.encode());
    }
}

fn check_same_block(existing: &XFieldChange, change: &XFieldChange) -> Result<AppendResult> {
    if existing == change {
        return Ok(AppendResult::AlreadyExists);
    }
    Err(StoreError::Conflict {
        what: format!("xfield {} in block {}", change.xfield_type(), change.block_hash),
        existing: existing.value.to_string(),
    })
}

#[async_trait]
impl XFieldStore for MemoryStore {
    async fn put_genesis(&self, genesis: &BlockHeader) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let bytes = genesis.encode();
        if let Some(existing) = &inner.genesis {
            if existing == &bytes {
                return Ok(());
            }
            let existing = BlockHeader::from_bytes(existing)?;
            return Err(StoreError::Conflict {
                what: "genesis".into(),
                existing: existing.block_hash().to_string(),
            });
        }
        inner.genesis = Some(bytes);
        Ok(())
    }

    async fn get_genesis(&self) -> Result<Option<BlockHeader>> {
        let inner = self.inner.read().unwrap();
        match &inner.genesis {
            Some(bytes) => Ok(Some(BlockHeader::from_bytes(bytes)?)),
            None => Ok(None),
        }
    }

    async fn append_change(&self, change: &XFieldChange) -> Result<AppendResult> {
        let mut inner = self.inner.write().unwrap();
        let mut list = inner.list(change.xfield_type())?;

        if let Some(existing) = list.changes.iter().find(|c| c.block_hash == change.block_hash) {
            return check_same_block(existing, change);
        }

        list.changes.push(change.clone());
        list.changes.sort_by_key(|c| c.height);
        inner.put_list(&list);
        Ok(AppendResult::Appended)
    }

    async fn read_change_list(&self, xfield_type: XFieldType) -> Result<XFieldChangeList> {
        let inner = self.inner.read().unwrap();
        inner.list(xfield_type)
    }

    async fn write_change_list(&self, list: &XFieldChangeList) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.put_list(list);
        Ok(())
    }

    async fn remove_changes_for_block(&self, block_hash: &BlockHash) -> Result<Vec<XFieldChange>> {
        let mut inner = self.inner.write().unwrap();
        let mut removed = Vec::new();

        for ty in XFieldType::TRACKED {
            let mut list = inner.list(ty)?;
            let before = list.changes.len();
            list.changes.retain(|c| {
                if &c.block_hash == block_hash {
                    removed.push(c.clone());
                    false
                } else {
                    true
                }
            });
            if list.changes.len() != before {
                inner.put_list(&list);
            }
        }

        Ok(removed)
    }
}
