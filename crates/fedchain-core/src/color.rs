//! Color identifiers for native coins and tokens.
//!
//! A [`ColorIdentifier`] tags an output with the asset it carries. The
//! native coin has token type `None` and an all-zero payload. Tokens carry
//! a 32-byte SHA-256 payload:
//!
//! - Reissuable: hash of the issuing locking script, so the same script
//!   can mint again
//! - NonReissuable: hash of the spent outpoint, so minting happens once
//! - NFT: like NonReissuable, bound to one outpoint or unique script
//!
//! Identifiers order by token type first, then payload bytes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::crypto::sha256;
use crate::error::CoreError;
use crate::types::OutPoint;
use crate::wire::{Decode, Encode, Reader, TagPolicy};

/// Display alias of the native asset.
pub const NATIVE_ASSET_ALIAS: &str = "TPC";

/// Length of an encoded non-native color identifier.
pub const COLOR_IDENTIFIER_SIZE: usize = 33;

/// Token categories.
///
/// Declaration order matches byte order, which the derived `Ord` relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum TokenType {
    #[default]
    None = 0x00,
    Reissuable = 0xc1,
    NonReissuable = 0xc2,
    Nft = 0xc3,
}

impl TokenType {
    pub const fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(TokenType::None),
            0xc1 => Some(TokenType::Reissuable),
            0xc2 => Some(TokenType::NonReissuable),
            0xc3 => Some(TokenType::Nft),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::None => "none",
            TokenType::Reissuable => "reissuable",
            TokenType::NonReissuable => "non_reissuable",
            TokenType::Nft => "nft",
        };
        f.write_str(name)
    }
}

/// Asset identifier attached to an output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ColorIdentifier {
    token_type: TokenType,
    payload: [u8; 32],
}

impl ColorIdentifier {
    /// The native asset.
    pub const NATIVE: Self = Self {
        token_type: TokenType::None,
        payload: [0u8; 32],
    };

    /// Reissuable token issued by `script` (raw serialized script bytes).
    pub fn from_script(script: &[u8]) -> Self {
        Self {
            token_type: TokenType::Reissuable,
            payload: sha256(script),
        }
    }

    /// Script-derived identifier of the given type (Reissuable or NFT).
    pub fn from_script_with_type(token_type: TokenType, script: &[u8]) -> Result<Self, CoreError> {
        match token_type {
            TokenType::Reissuable | TokenType::Nft => Ok(Self {
                token_type,
                payload: sha256(script),
            }),
            other => Err(CoreError::TokenTypeMismatch(other.to_string(), "script")),
        }
    }

    /// Non-reissuable token minted by spending `outpoint`.
    pub fn from_outpoint(outpoint: &OutPoint) -> Self {
        Self {
            token_type: TokenType::NonReissuable,
            payload: sha256(&outpoint.encode()),
        }
    }

    /// Outpoint-derived identifier of the given type (NonReissuable or NFT).
    pub fn from_outpoint_with_type(token_type: TokenType, outpoint: &OutPoint) -> Result<Self, CoreError> {
        match token_type {
            TokenType::NonReissuable | TokenType::Nft => Ok(Self {
                token_type,
                payload: sha256(&outpoint.encode()),
            }),
            other => Err(CoreError::TokenTypeMismatch(other.to_string(), "outpoint")),
        }
    }

    /// Build from parts. A `None` type always gets the zero payload.
    pub fn from_parts(token_type: TokenType, payload: [u8; 32]) -> Self {
        match token_type {
            TokenType::None => Self::NATIVE,
            _ => Self { token_type, payload },
        }
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn payload(&self) -> &[u8; 32] {
        &self.payload
    }

    pub fn is_native(&self) -> bool {
        self.token_type == TokenType::None
    }

    /// Decode with an explicit policy for unassigned type bytes.
    ///
    /// Under [`TagPolicy::Lenient`] an unassigned byte yields the native
    /// identifier and consumes only that byte. Under
    /// [`TagPolicy::Strict`] it fails with `UnknownTokenType`. A known
    /// token type followed by fewer than 32 bytes always fails.
    pub fn decode_with(r: &mut Reader<'_>, policy: TagPolicy) -> Result<Self, CoreError> {
        let tag = r.read_u8()?;
        match TokenType::from_u8(tag) {
            Some(TokenType::None) => Ok(Self::NATIVE),
            Some(token_type) => Ok(Self {
                token_type,
                payload: r.read_array()?,
            }),
            None => match policy {
                TagPolicy::Lenient => Ok(Self::NATIVE),
                TagPolicy::Strict => Err(CoreError::UnknownTokenType(tag)),
            },
        }
    }

    /// Lowercase hex of the encoding, or the native alias.
    pub fn to_hex_string(&self) -> String {
        if self.is_native() {
            NATIVE_ASSET_ALIAS.to_string()
        } else {
            hex::encode(self.encode())
        }
    }

    /// Inverse of [`to_hex_string`](Self::to_hex_string); strict on type.
    pub fn from_hex_string(s: &str) -> Result<Self, CoreError> {
        if s == NATIVE_ASSET_ALIAS {
            return Ok(Self::NATIVE);
        }
        let bytes = hex::decode(s).map_err(|e| CoreError::DecodingError(e.to_string()))?;
        let mut r = Reader::new(&bytes);
        let color = Self::decode_with(&mut r, TagPolicy::Strict)?;
        if !r.is_empty() {
            return Err(CoreError::TrailingBytes(r.remaining()));
        }
        Ok(color)
    }
}

impl Encode for ColorIdentifier {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.push(self.token_type.as_u8());
        if !self.is_native() {
            out.extend_from_slice(&self.payload);
        }
    }
}

impl Decode for ColorIdentifier {
    /// Lenient decode: unassigned type bytes become the native identifier.
    fn decode(r: &mut Reader<'_>) -> Result<Self, CoreError> {
        Self::decode_with(r, TagPolicy::Lenient)
    }
}

impl fmt::Debug for ColorIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColorIdentifier({})", self.to_hex_string())
    }
}

impl fmt::Display for ColorIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

impl std::str::FromStr for ColorIdentifier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex_string(s)
    }
}

impl Serialize for ColorIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for ColorIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex_string(&s).map_err(serde::de::Error::custom)
    }
}
