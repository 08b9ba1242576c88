//! History of federation parameter changes.
//!
//! Every block whose xfield carries a new value records an
//! [`XFieldChange`]. The change takes effect at the height after the
//! block that carried it, so the block itself is still signed by the
//! previous key. [`XFieldHistory`] answers "which value was active at
//! height h" for each tracked xfield type.
//!
//! ## Persisted Format
//!
//! ```text
//! XFieldChange     : <payload without type tag><height u32 LE><block hash 32>
//! XFieldChangeList : <compact size count><XFieldChange>*
//! ```

use std::collections::BTreeMap;

use crate::crypto::AggregatePublicKey;
use crate::error::CoreError;
use crate::types::{BlockHash, Hash256};
use crate::wire::{write_compact_size, Decode, Encode, Reader};
use crate::xfield::{XField, XFieldType};

/// A value that became active at `height`, introduced by `block_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XFieldChange {
    pub value: XField,
    pub height: u32,
    pub block_hash: BlockHash,
}

impl XFieldChange {
    pub fn new(value: XField, height: u32, block_hash: BlockHash) -> Self {
        Self {
            value,
            height,
            block_hash,
        }
    }

    pub fn xfield_type(&self) -> XFieldType {
        self.value.xfield_type()
    }

    /// Decode a change whose type is known from context.
    pub fn decode_as(ty: XFieldType, r: &mut Reader<'_>) -> Result<Self, CoreError> {
        let value = XField::decode_payload(ty, r)?;
        let height = r.read_u32_le()?;
        let block_hash = Hash256::decode(r)?;
        Ok(Self {
            value,
            height,
            block_hash,
        })
    }

    pub fn from_bytes_as(ty: XFieldType, bytes: &[u8]) -> Result<Self, CoreError> {
        let mut r = Reader::new(bytes);
        let change = Self::decode_as(ty, &mut r)?;
        if !r.is_empty() {
            return Err(CoreError::TrailingBytes(r.remaining()));
        }
        Ok(change)
    }
}

impl Encode for XFieldChange {
    fn encode_to(&self, out: &mut Vec<u8>) {
        self.value.encode_payload_to(out);
        out.extend_from_slice(&self.height.to_le_bytes());
        self.block_hash.encode_to(out);
    }
}

/// All changes of one xfield type, as persisted under its db key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XFieldChangeList {
    pub xfield_type: XFieldType,
    pub changes: Vec<XFieldChange>,
}

impl XFieldChangeList {
    pub fn new(xfield_type: XFieldType) -> Self {
        Self {
            xfield_type,
            changes: Vec::new(),
        }
    }

    pub fn decode_as(ty: XFieldType, r: &mut Reader<'_>) -> Result<Self, CoreError> {
        let count = r.read_compact_size()?;
        let mut changes = Vec::new();
        for _ in 0..count {
            changes.push(XFieldChange::decode_as(ty, r)?);
        }
        Ok(Self {
            xfield_type: ty,
            changes,
        })
    }

    pub fn from_bytes_as(ty: XFieldType, bytes: &[u8]) -> Result<Self, CoreError> {
        let mut r = Reader::new(bytes);
        let list = Self::decode_as(ty, &mut r)?;
        if !r.is_empty() {
            return Err(CoreError::TrailingBytes(r.remaining()));
        }
        Ok(list)
    }
}

impl Encode for XFieldChangeList {
    fn encode_to(&self, out: &mut Vec<u8>) {
        write_compact_size(self.changes.len() as u64, out);
        for change in &self.changes {
            change.encode_to(out);
        }
    }
}

/// Ordered changes per tracked xfield type.
///
/// Cloning gives an independent copy, used to evaluate a candidate chain
/// without touching the live history.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XFieldHistory {
    changes: BTreeMap<XFieldType, Vec<XFieldChange>>,
}

impl XFieldHistory {
    /// History seeded by the genesis block: its key and the initial max
    /// block size, both active from height 0.
    pub fn seeded(genesis_key: &AggregatePublicKey, genesis_hash: BlockHash, initial_max_block_size: u32) -> Self {
        let mut changes = BTreeMap::new();
        changes.insert(
            XFieldType::AggPubKey,
            vec![XFieldChange::new(XField::agg_pubkey(*genesis_key), 0, genesis_hash)],
        );
        changes.insert(
            XFieldType::MaxBlockSize,
            vec![XFieldChange::new(XField::MaxBlockSize(initial_max_block_size), 0, genesis_hash)],
        );
        Self { changes }
    }

    /// Rebuild from persisted lists.
    pub fn from_change_lists(lists: impl IntoIterator<Item = XFieldChangeList>) -> Result<Self, CoreError> {
        let mut history = Self::default();
        for list in lists {
            for change in list.changes {
                if change.xfield_type() != list.xfield_type {
                    return Err(CoreError::XFieldTypeValueMismatch {
                        declared: list.xfield_type.as_u8(),
                        actual: change.xfield_type().as_u8(),
                    });
                }
                history.add(change)?;
            }
        }
        Ok(history)
    }

    pub fn changes(&self, ty: XFieldType) -> &[XFieldChange] {
        self.changes.get(&ty).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn change_list(&self, ty: XFieldType) -> XFieldChangeList {
        XFieldChangeList {
            xfield_type: ty,
            changes: self.changes(ty).to_vec(),
        }
    }

    /// The change active at `height`: the latest one recorded at or below
    /// it, or the first change if none is.
    pub fn get(&self, ty: XFieldType, height: u32) -> Option<&XFieldChange> {
        let list = self.changes(ty);
        let idx = list.partition_point(|c| c.height <= height);
        list.get(idx.saturating_sub(1))
    }

    pub fn get_by_block_hash(&self, ty: XFieldType, block_hash: &BlockHash) -> Option<&XFieldChange> {
        self.changes(ty).iter().rev().find(|c| &c.block_hash == block_hash)
    }

    pub fn latest(&self, ty: XFieldType) -> Option<&XFieldChange> {
        self.changes(ty).last()
    }

    /// Append a change. Heights must not go backwards within a type.
    pub fn add(&mut self, change: XFieldChange) -> Result<(), CoreError> {
        let ty = change.xfield_type();
        if !ty.is_tracked() {
            return Err(CoreError::UntrackedXFieldType(ty.as_u8()));
        }
        let list = self.changes.entry(ty).or_default();
        if let Some(latest) = list.last() {
            if change.height < latest.height {
                return Err(CoreError::OutOfOrderXFieldChange {
                    height: change.height,
                    latest: latest.height,
                });
            }
        }
        list.push(change);
        Ok(())
    }

    /// Drop every change introduced by `block_hash` (block disconnect).
    pub fn remove_by_block_hash(&mut self, block_hash: &BlockHash) -> Vec<XFieldChange> {
        let mut removed = Vec::new();
        for list in self.changes.values_mut() {
            let (gone, kept): (Vec<_>, Vec<_>) =
                list.drain(..).partition(|c| &c.block_hash == block_hash);
            *list = kept;
            removed.extend(gone);
        }
        self.changes.retain(|_, list| !list.is_empty());
        removed
    }

    /// Whether `xfield` is a valid, tracked value that differs from the
    /// latest recorded one.
    pub fn is_new(&self, xfield: &XField) -> bool {
        if !xfield.is_valid() || !xfield.xfield_type().is_tracked() {
            return false;
        }
        match self.latest(xfield.xfield_type()) {
            Some(latest) => &latest.value != xfield,
            None => true,
        }
    }

    /// Aggregate key that signs the block at `height`.
    pub fn aggregate_pubkey_at(&self, height: u32) -> Option<AggregatePublicKey> {
        match &self.get(XFieldType::AggPubKey, height)?.value {
            XField::AggPubKey(k) => k.key().ok(),
            _ => None,
        }
    }

    pub fn max_block_size_at(&self, height: u32) -> Option<u32> {
        match self.get(XFieldType::MaxBlockSize, height)?.value {
            XField::MaxBlockSize(size) => Some(size),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::xfield::MAX_BLOCK_SIZE;

    const GENESIS_KEY: &str = "025700236c2890233592fcef262f4520d22af9160e3d9705855140eb2aa06c35d3";

    fn key(seed: u8) -> AggregatePublicKey {
        Keypair::from_secret_bytes(&[seed; 32]).unwrap().public_key()
    }

    fn hash(fill: u8) -> BlockHash {
        Hash256::from_bytes([fill; 32])
    }

    fn history() -> XFieldHistory {
        let mut h = XFieldHistory::seeded(&key(1), hash(0xee), MAX_BLOCK_SIZE);
        h.add(XFieldChange::new(XField::agg_pubkey(key(2)), 20, hash(0x13))).unwrap();
        h.add(XFieldChange::new(XField::agg_pubkey(key(3)), 40, hash(0x27))).unwrap();
        h.add(XFieldChange::new(XField::MaxBlockSize(2_000_000), 30, hash(0x1d))).unwrap();
        h
    }

    #[test]
    fn test_change_serialization() {
        let genesis_key = AggregatePublicKey::from_hex(GENESIS_KEY).unwrap();
        let change = XFieldChange::new(XField::agg_pubkey(genesis_key), 0, hash(0xab));
        assert_eq!(
            hex::encode(change.encode()),
            format!("21{}00000000{}", GENESIS_KEY, "ab".repeat(32))
        );

        let size = XFieldChange::new(XField::MaxBlockSize(MAX_BLOCK_SIZE), 0, hash(0xab));
        assert_eq!(
            hex::encode(size.encode()),
            format!("40420f0000000000{}", "ab".repeat(32))
        );
        assert_eq!(
            XFieldChange::from_bytes_as(XFieldType::MaxBlockSize, &size.encode()).unwrap(),
            size
        );
    }

    #[test]
    fn test_change_list_deserialize() {
        let bytes = hex::decode(format!(
            "012102473757a955a23f75379820f3071abf5b3343b78eb54e52373d06259ffa6c550b00000000{}",
            "00".repeat(32)
        ))
        .unwrap();
        let list = XFieldChangeList::from_bytes_as(XFieldType::AggPubKey, &bytes).unwrap();
        assert_eq!(list.changes.len(), 1);
        assert_eq!(
            list.changes[0].value.value_string(),
            "02473757a955a23f75379820f3071abf5b3343b78eb54e52373d06259ffa6c550b"
        );
        assert_eq!(list.changes[0].height, 0);
        assert!(list.changes[0].block_hash.is_zero());
        assert_eq!(list.encode(), bytes);

        let bytes = hex::decode(format!("01ffffffff00000000{}", "11".repeat(32))).unwrap();
        let list = XFieldChangeList::from_bytes_as(XFieldType::MaxBlockSize, &bytes).unwrap();
        assert_eq!(list.changes[0].value, XField::MaxBlockSize(0xffff_ffff));
        assert_eq!(list.changes[0].block_hash, hash(0x11));
    }

    #[test]
    fn test_get_by_height() {
        let h = history();
        let at = |height| h.get(XFieldType::AggPubKey, height).unwrap().height;
        assert_eq!(at(0), 0);
        assert_eq!(at(1), 0);
        assert_eq!(at(19), 0);
        assert_eq!(at(20), 20);
        assert_eq!(at(39), 20);
        assert_eq!(at(40), 40);
        assert_eq!(at(u32::MAX), 40);

        assert_eq!(h.aggregate_pubkey_at(25), Some(key(2)));
        assert_eq!(h.max_block_size_at(29), Some(MAX_BLOCK_SIZE));
        assert_eq!(h.max_block_size_at(30), Some(2_000_000));
    }

    #[test]
    fn test_get_before_first_change_returns_first() {
        let mut h = XFieldHistory::default();
        h.add(XFieldChange::new(XField::MaxBlockSize(5), 10, hash(1))).unwrap();
        assert_eq!(h.get(XFieldType::MaxBlockSize, 3).unwrap().height, 10);
        assert!(h.get(XFieldType::AggPubKey, 3).is_none());
    }

    #[test]
    fn test_get_by_block_hash_and_latest() {
        let h = history();
        assert_eq!(
            h.get_by_block_hash(XFieldType::AggPubKey, &hash(0x13)).unwrap().height,
            20
        );
        assert!(h.get_by_block_hash(XFieldType::MaxBlockSize, &hash(0x13)).is_none());
        assert_eq!(h.latest(XFieldType::AggPubKey).unwrap().height, 40);
    }

    #[test]
    fn test_add_rejects_out_of_order_and_untracked() {
        let mut h = history();
        assert_eq!(
            h.add(XFieldChange::new(XField::agg_pubkey(key(4)), 10, hash(9))),
            Err(CoreError::OutOfOrderXFieldChange {
                height: 10,
                latest: 40
            })
        );
        assert_eq!(
            h.add(XFieldChange::new(XField::None, 50, hash(9))),
            Err(CoreError::UntrackedXFieldType(0))
        );
    }

    #[test]
    fn test_remove_by_block_hash() {
        let mut h = history();
        let removed = h.remove_by_block_hash(&hash(0x27));
        assert_eq!(removed.len(), 1);
        assert_eq!(h.latest(XFieldType::AggPubKey).unwrap().height, 20);
        assert!(h.remove_by_block_hash(&hash(0x27)).is_empty());
    }

    #[test]
    fn test_is_new() {
        let h = history();
        assert!(!h.is_new(&XField::None));
        assert!(!h.is_new(&XField::agg_pubkey(key(3))));
        assert!(h.is_new(&XField::agg_pubkey(key(1))));
        assert!(!h.is_new(&XField::MaxBlockSize(2_000_000)));
        assert!(h.is_new(&XField::MaxBlockSize(3_000_000)));
        assert!(!h.is_new(&XField::MaxBlockSize(0)));
    }

    #[test]
    fn test_clone_is_independent() {
        let live = history();
        let mut temp = live.clone();
        temp.add(XFieldChange::new(XField::agg_pubkey(key(5)), 90, hash(0x5a))).unwrap();

        assert_eq!(temp.changes(XFieldType::AggPubKey).len(), 4);
        assert_eq!(live.changes(XFieldType::AggPubKey).len(), 3);
        assert_ne!(
            temp.get(XFieldType::AggPubKey, 91).unwrap().height,
            live.get(XFieldType::AggPubKey, 91).unwrap().height
        );
    }

    #[test]
    fn test_rebuild_from_lists() {
        let h = history();
        let lists = XFieldType::TRACKED.map(|ty| h.change_list(ty));
        let rebuilt = XFieldHistory::from_change_lists(lists).unwrap();
        assert_eq!(rebuilt, h);
    }

    #[test]
    fn test_rebuild_rejects_mixed_list() {
        let mut list = XFieldChangeList::new(XFieldType::MaxBlockSize);
        list.changes.push(XFieldChange::new(XField::agg_pubkey(key(1)), 0, hash(0)));
        assert!(matches!(
            XFieldHistory::from_change_lists([list]),
            Err(CoreError::XFieldTypeValueMismatch { .. })
        ));
    }
}
