//! Colored locking scripts.
//!
//! A colored output script starts with a 33-byte push of the encoded
//! [`ColorIdentifier`] followed by `OP_COLOR`, then an ordinary script:
//!
//! ```text
//! CP2PKH : 21 <color 33> bc 76 a9 14 <pubkey hash 20> 88 ac
//! CP2SH  : 21 <color 33> bc a9 14 <script hash 20> 87
//! custom : 21 <color 33> bc <rest>
//! ```

use crate::color::{ColorIdentifier, COLOR_IDENTIFIER_SIZE};
use crate::wire::{Encode, Reader, TagPolicy};

pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_COLOR: u8 = 0xbc;

const PUSH_20: u8 = 0x14;
const PUSH_33: u8 = 0x21;

/// Length of a colored pay-to-pubkey-hash script.
pub const CP2PKH_SIZE: usize = 60;

/// Length of a colored pay-to-script-hash script.
pub const CP2SH_SIZE: usize = 58;

/// Shape of a colored script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColoredScriptKind {
    PayToPubkeyHash,
    PayToScriptHash,
    Custom,
}

fn color_prefix(color: &ColorIdentifier, out: &mut Vec<u8>) {
    out.push(PUSH_33);
    color.encode_to(out);
    out.push(OP_COLOR);
}

/// Build `21 <color> bc 76 a9 14 <hash> 88 ac`.
pub fn colored_p2pkh(color: &ColorIdentifier, pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut out = Vec::with_capacity(CP2PKH_SIZE);
    color_prefix(color, &mut out);
    out.extend_from_slice(&[OP_DUP, OP_HASH160, PUSH_20]);
    out.extend_from_slice(pubkey_hash);
    out.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    out
}

/// Build `21 <color> bc a9 14 <hash> 87`.
pub fn colored_p2sh(color: &ColorIdentifier, script_hash: &[u8; 20]) -> Vec<u8> {
    let mut out = Vec::with_capacity(CP2SH_SIZE);
    color_prefix(color, &mut out);
    out.extend_from_slice(&[OP_HASH160, PUSH_20]);
    out.extend_from_slice(script_hash);
    out.push(OP_EQUAL);
    out
}

/// Classify a colored script. Returns `None` for uncolored scripts.
pub fn colored_script_kind(script: &[u8]) -> Option<ColoredScriptKind> {
    if script.len() < 2 + COLOR_IDENTIFIER_SIZE
        || script[0] != PUSH_33
        || script[1 + COLOR_IDENTIFIER_SIZE] != OP_COLOR
    {
        return None;
    }
    let rest = &script[2 + COLOR_IDENTIFIER_SIZE..];
    let kind = match rest {
        [OP_DUP, OP_HASH160, PUSH_20, .., OP_EQUALVERIFY, OP_CHECKSIG] if script.len() == CP2PKH_SIZE => {
            ColoredScriptKind::PayToPubkeyHash
        }
        [OP_HASH160, PUSH_20, .., OP_EQUAL] if script.len() == CP2SH_SIZE => {
            ColoredScriptKind::PayToScriptHash
        }
        _ => ColoredScriptKind::Custom,
    };
    Some(kind)
}

/// Extract the color of a colored script.
///
/// Uncolored scripts, unassigned token bytes and an explicit native
/// identifier all yield `None`.
pub fn color_id_from_script(script: &[u8]) -> Option<ColorIdentifier> {
    colored_script_kind(script)?;
    let mut r = Reader::new(&script[1..1 + COLOR_IDENTIFIER_SIZE]);
    let color = ColorIdentifier::decode_with(&mut r, TagPolicy::Strict).ok()?;
    if color.is_native() {
        return None;
    }
    Some(color)
}

/// The uncolored remainder of a colored script.
pub fn strip_color(script: &[u8]) -> Option<&[u8]> {
    colored_script_kind(script)?;
    Some(&script[2 + COLOR_IDENTIFIER_SIZE..])
}
