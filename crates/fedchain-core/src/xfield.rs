//! Block header extension field ("xfield").
//!
//! An xfield is a self-describing slot in the header that carries a
//! federation parameter change: a new aggregate public key or a new
//! maximum block size. The type tag is intrinsic to the [`XField`]
//! variant, so a constructed value can never disagree with its tag. The
//! only way to pair an arbitrary tag with a value is [`XField::from_parts`],
//! which rejects the mismatch.
//!
//! ## Wire Format
//!
//! ```text
//! None          : 00
//! AggPubKey     : 01 <compact size = 0x21> <33 key bytes>
//! MaxBlockSize  : 02 <u32 LE>
//! ```
//!
//! Decoding is always strict: a tag this node does not know fails with
//! [`CoreError::UnknownXFieldType`], meaning the node must be upgraded.

use std::fmt;

use crate::crypto::AggregatePublicKey;
use crate::error::CoreError;
use crate::wire::{write_var_bytes, Decode, Encode, Reader};

/// Protocol ceiling on block size and the initial max block size.
pub const MAX_BLOCK_SIZE: u32 = 1_000_000;

/// Default size target for block assembly.
pub const DEFAULT_BLOCK_MAX_SIZE: u32 = MAX_BLOCK_SIZE - 1000;

/// Known xfield type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum XFieldType {
    None = 0,
    AggPubKey = 1,
    MaxBlockSize = 2,
}

impl XFieldType {
    /// Types whose changes are tracked in history, in canonical order.
    pub const TRACKED: [XFieldType; 2] = [XFieldType::AggPubKey, XFieldType::MaxBlockSize];

    pub const fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(XFieldType::None),
            1 => Some(XFieldType::AggPubKey),
            2 => Some(XFieldType::MaxBlockSize),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Single-byte key under which the store indexes this type.
    pub const fn db_key(self) -> u8 {
        match self {
            XFieldType::None => b'0',
            XFieldType::AggPubKey => b'1',
            XFieldType::MaxBlockSize => b'2',
        }
    }

    pub const fn from_db_key(key: u8) -> Option<Self> {
        match key {
            b'0' => Some(XFieldType::None),
            b'1' => Some(XFieldType::AggPubKey),
            b'2' => Some(XFieldType::MaxBlockSize),
            _ => None,
        }
    }

    /// Name used by the RPC layer when listing changes of this type.
    pub const fn rpc_name(self) -> &'static str {
        match self {
            XFieldType::None => "none",
            XFieldType::AggPubKey => "aggregatePubkeys",
            XFieldType::MaxBlockSize => "blockSizeChanges",
        }
    }

    pub fn is_tracked(self) -> bool {
        Self::TRACKED.contains(&self)
    }
}

impl fmt::Display for XFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Aggregate public key payload as carried on the wire.
///
/// Decoding does not check the key; [`XFieldAggPubKey::is_valid`] does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XFieldAggPubKey(pub Vec<u8>);

impl XFieldAggPubKey {
    pub fn is_valid(&self) -> bool {
        self.key().is_ok()
    }

    /// The checked key.
    pub fn key(&self) -> Result<AggregatePublicKey, CoreError> {
        AggregatePublicKey::from_slice(&self.0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl From<AggregatePublicKey> for XFieldAggPubKey {
    fn from(key: AggregatePublicKey) -> Self {
        Self(key.as_bytes().to_vec())
    }
}

/// A header extension field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum XField {
    #[default]
    None,
    AggPubKey(XFieldAggPubKey),
    MaxBlockSize(u32),
}

impl XField {
    pub fn agg_pubkey(key: AggregatePublicKey) -> Self {
        XField::AggPubKey(key.into())
    }

    pub fn xfield_type(&self) -> XFieldType {
        match self {
            XField::None => XFieldType::None,
            XField::AggPubKey(_) => XFieldType::AggPubKey,
            XField::MaxBlockSize(_) => XFieldType::MaxBlockSize,
        }
    }

    /// Pair an externally supplied tag with a value.
    ///
    /// Fails with `UnknownXFieldType` for an unknown tag and with
    /// `XFieldTypeValueMismatch` when the tag names a different variant.
    pub fn from_parts(declared: u8, value: XField) -> Result<Self, CoreError> {
        let ty = XFieldType::from_u8(declared).ok_or(CoreError::UnknownXFieldType(declared))?;
        if ty != value.xfield_type() {
            return Err(CoreError::XFieldTypeValueMismatch {
                declared,
                actual: value.xfield_type().as_u8(),
            });
        }
        Ok(value)
    }

    /// Payload validity: a key must be a valid compressed point, a size
    /// must be nonzero. `None` carries nothing and is valid.
    pub fn is_valid(&self) -> bool {
        match self {
            XField::None => true,
            XField::AggPubKey(k) => k.is_valid(),
            XField::MaxBlockSize(size) => *size > 0,
        }
    }

    pub fn db_key(&self) -> u8 {
        self.xfield_type().db_key()
    }

    /// Payload rendering: hex for keys, decimal for sizes.
    pub fn value_string(&self) -> String {
        match self {
            XField::None => String::new(),
            XField::AggPubKey(k) => k.to_hex(),
            XField::MaxBlockSize(size) => size.to_string(),
        }
    }

    /// Append the payload without the type tag.
    pub fn encode_payload_to(&self, out: &mut Vec<u8>) {
        match self {
            XField::None => {}
            XField::AggPubKey(k) => write_var_bytes(&k.0, out),
            XField::MaxBlockSize(size) => out.extend_from_slice(&size.to_le_bytes()),
        }
    }

    /// Read the payload shape implied by `ty`.
    pub fn decode_payload(ty: XFieldType, r: &mut Reader<'_>) -> Result<Self, CoreError> {
        Ok(match ty {
            XFieldType::None => XField::None,
            XFieldType::AggPubKey => XField::AggPubKey(XFieldAggPubKey(r.read_var_bytes()?.to_vec())),
            XFieldType::MaxBlockSize => XField::MaxBlockSize(r.read_u32_le()?),
        })
    }
}

impl Encode for XField {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.push(self.xfield_type().as_u8());
        self.encode_payload_to(out);
    }
}

impl Decode for XField {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CoreError> {
        let tag = r.read_u8()?;
        let ty = XFieldType::from_u8(tag).ok_or(CoreError::UnknownXFieldType(tag))?;
        Self::decode_payload(ty, r)
    }
}

impl fmt::Display for XField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "XField(type={}, value={{{}}})",
            self.xfield_type(),
            self.value_string()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "025700236c2890233592fcef262f4520d22af9160e3d9705855140eb2aa06c35d3";

    fn key_field() -> XField {
        XField::agg_pubkey(AggregatePublicKey::from_hex(KEY).unwrap())
    }

    #[test]
    fn test_encode_agg_pubkey() {
        let bytes = key_field().encode();
        assert_eq!(hex::encode(&bytes), format!("0121{}", KEY));
        assert_eq!(XField::from_bytes(&bytes).unwrap(), key_field());
    }

    #[test]
    fn test_encode_max_block_size() {
        let field = XField::MaxBlockSize(500_000);
        assert_eq!(hex::encode(field.encode()), "0220a10700");
        assert_eq!(XField::from_bytes(&field.encode()).unwrap(), field);
    }

    #[test]
    fn test_encode_none() {
        assert_eq!(XField::None.encode(), vec![0x00]);
        assert_eq!(XField::from_bytes(&[0x00]).unwrap(), XField::None);
    }

    #[test]
    fn test_decode_unknown_type() {
        for tag in [3u8, 0x0f, 0xff] {
            assert_eq!(
                XField::from_bytes(&[tag, 1, 2, 3, 4]),
                Err(CoreError::UnknownXFieldType(tag))
            );
        }
    }

    #[test]
    fn test_decode_underrun() {
        assert!(matches!(
            XField::from_bytes(&[0x02, 0x01, 0x02]),
            Err(CoreError::StreamUnderrun { needed: 4, remaining: 2 })
        ));
        assert!(matches!(
            XField::from_bytes(&[0x01, 0x21, 0x02]),
            Err(CoreError::StreamUnderrun { .. })
        ));
    }

    #[test]
    fn test_max_block_size_reads_key_bytes_as_integer() {
        // a key payload under the wrong tag decodes as a size
        let bytes = hex::decode(format!("0221{}", KEY)).unwrap();
        let mut r = Reader::new(&bytes);
        let field = XField::decode(&mut r).unwrap();
        assert_eq!(field, XField::MaxBlockSize(0x0057_0221));
        assert_eq!(r.remaining(), 30);
    }

    #[test]
    fn test_validity() {
        assert!(XField::None.is_valid());
        assert!(key_field().is_valid());
        assert!(XField::MaxBlockSize(1).is_valid());
        assert!(!XField::MaxBlockSize(0).is_valid());
        assert!(!XField::AggPubKey(XFieldAggPubKey(vec![])).is_valid());
        assert!(!XField::AggPubKey(XFieldAggPubKey(vec![0x04; 65])).is_valid());
        let mut off_curve = vec![0x02];
        off_curve.extend_from_slice(&[0x11; 32]);
        assert!(!XField::AggPubKey(XFieldAggPubKey(off_curve)).is_valid());
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(XField::from_parts(1, key_field()).unwrap(), key_field());
        assert_eq!(
            XField::from_parts(2, key_field()),
            Err(CoreError::XFieldTypeValueMismatch {
                declared: 2,
                actual: 1
            })
        );
        assert_eq!(
            XField::from_parts(9, XField::None),
            Err(CoreError::UnknownXFieldType(9))
        );
    }

    #[test]
    fn test_db_keys() {
        assert_eq!(XField::None.db_key(), b'0');
        assert_eq!(key_field().db_key(), b'1');
        assert_eq!(XField::MaxBlockSize(7).db_key(), b'2');
        for ty in XFieldType::TRACKED {
            assert_eq!(XFieldType::from_db_key(ty.db_key()), Some(ty));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            XField::MaxBlockSize(2_000_000).to_string(),
            "XField(type=2, value={2000000})"
        );
        assert_eq!(key_field().to_string(), format!("XField(type=1, value={{{}}})", KEY));
        assert_eq!(XField::None.to_string(), "XField(type=0, value={})");
    }

    #[test]
    fn test_rpc_names() {
        assert_eq!(XFieldType::AggPubKey.rpc_name(), "aggregatePubkeys");
        assert_eq!(XFieldType::MaxBlockSize.rpc_name(), "blockSizeChanges");
    }
}
