//! Byte-exact consensus encoding.
//!
//! Every consensus value has exactly one encoding. Integers are
//! little-endian, hashes are raw 32-byte arrays in internal order, and
//! variable-length data carries a Bitcoin-style compact size prefix that
//! must be minimally encoded.
//!
//! ## Usage
//!
//! ```
//! use fedchain_core::wire::{Decode, Encode};
//! use fedchain_core::XField;
//!
//! let field = XField::MaxBlockSize(500_000);
//! let bytes = field.encode();
//! assert_eq!(XField::from_bytes(&bytes).unwrap(), field);
//! ```

use crate::error::CoreError;

/// Largest length a compact size may announce.
pub const MAX_COMPACT_SIZE: u64 = 0x0200_0000;

/// How a decoder treats a type tag it does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagPolicy {
    /// Unknown tags are a decode failure.
    #[default]
    Strict,
    /// Unknown tags are coerced to the type's neutral value.
    Lenient,
}

/// Cursor over an input buffer.
pub struct Reader<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, off: 0 }
    }

    pub fn offset(&self) -> usize {
        self.off
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.off
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CoreError> {
        if n > self.remaining() {
            return Err(CoreError::StreamUnderrun {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let v = &self.buf[self.off..self.off + n];
        self.off += n;
        Ok(v)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CoreError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CoreError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, CoreError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, CoreError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32_le(&mut self) -> Result<i32, CoreError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, CoreError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a compact size, rejecting non-minimal forms and oversized values.
    pub fn read_compact_size(&mut self) -> Result<u64, CoreError> {
        let tag = self.read_u8()?;
        let (v, minimal) = match tag {
            0x00..=0xfc => (tag as u64, true),
            0xfd => {
                let v = self.read_u16_le()? as u64;
                (v, v >= 0xfd)
            }
            0xfe => {
                let v = self.read_u32_le()? as u64;
                (v, v > 0xffff)
            }
            0xff => {
                let v = self.read_u64_le()?;
                (v, v > 0xffff_ffff)
            }
        };
        if !minimal {
            return Err(CoreError::NonCanonicalCompactSize);
        }
        if v > MAX_COMPACT_SIZE {
            return Err(CoreError::CompactSizeTooLarge(v));
        }
        Ok(v)
    }

    /// Read a compact-size-prefixed byte vector.
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], CoreError> {
        let len = self.read_compact_size()? as usize;
        self.read_bytes(len)
    }
}

pub fn write_compact_size(n: u64, out: &mut Vec<u8>) {
    match n {
        0x00..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

pub fn write_var_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    write_compact_size(bytes.len() as u64, out);
    out.extend_from_slice(bytes);
}

/// A value with a single consensus encoding.
pub trait Encode {
    /// Append the encoding to `out`.
    fn encode_to(&self, out: &mut Vec<u8>);

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_to(&mut out);
        out
    }
}

/// A value that can be read back from its consensus encoding.
pub trait Decode: Sized {
    /// Decode one value from the reader, leaving any following bytes.
    fn decode(r: &mut Reader<'_>) -> Result<Self, CoreError>;

    /// Decode a buffer holding exactly one value.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut r = Reader::new(bytes);
        let v = Self::decode(&mut r)?;
        if !r.is_empty() {
            return Err(CoreError::TrailingBytes(r.remaining()));
        }
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_size_boundaries() {
        for (n, len) in [
            (0u64, 1usize),
            (0xfc, 1),
            (0xfd, 3),
            (0xffff, 3),
            (0x1_0000, 5),
            (MAX_COMPACT_SIZE, 5),
        ] {
            let mut out = Vec::new();
            write_compact_size(n, &mut out);
            assert_eq!(out.len(), len, "length for {}", n);
            let mut r = Reader::new(&out);
            assert_eq!(r.read_compact_size().unwrap(), n);
            assert!(r.is_empty());
        }
    }

    #[test]
    fn test_compact_size_rejects_non_minimal() {
        let mut r = Reader::new(&[0xfd, 0x10, 0x00]);
        assert_eq!(
            r.read_compact_size(),
            Err(CoreError::NonCanonicalCompactSize)
        );
    }

    #[test]
    fn test_compact_size_rejects_oversized() {
        let mut r = Reader::new(&[0xfe, 0x01, 0x00, 0x00, 0x02]);
        assert_eq!(
            r.read_compact_size(),
            Err(CoreError::CompactSizeTooLarge(0x0200_0001))
        );
    }

    #[test]
    fn test_underrun_reports_sizes() {
        let mut r = Reader::new(&[1, 2]);
        assert_eq!(
            r.read_u32_le(),
            Err(CoreError::StreamUnderrun {
                needed: 4,
                remaining: 2
            })
        );
        // failed reads consume nothing
        assert_eq!(r.offset(), 0);
    }

    #[test]
    fn test_var_bytes() {
        let mut out = Vec::new();
        write_var_bytes(&[0xaa; 3], &mut out);
        assert_eq!(out, vec![3, 0xaa, 0xaa, 0xaa]);
        let mut r = Reader::new(&out);
        assert_eq!(r.read_var_bytes().unwrap(), &[0xaa; 3]);
    }
}
