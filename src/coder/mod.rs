//! Factor coder & block map (C6).
//!
//! A [`FactorCoder`] encodes/decodes one factorization block's `(offset,
//! len)` arrays at a time, with no cross-block state, so blocks produced by
//! independent parallel workers can be concatenated (and randomly accessed)
//! freely. A [`BlockMap`] then records, per block, the bit offset it starts
//! at and how many factors it contains, giving O(1) random access into the
//! factor stream.

pub mod bits;
pub mod block_map;

use bits::{BitReader, BitWriter};
use crate::error::CoderError;

pub use block_map::BlockMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoderKind {
    U32Raw,
    VarByte,
}

impl CoderKind {
    pub fn coder(self) -> Box<dyn FactorCoder> {
        match self {
            CoderKind::U32Raw => Box::new(U32RawCoder),
            CoderKind::VarByte => Box::new(VarByteCoder),
        }
    }
}

/// Encodes/decodes one factorization block's offset/length arrays. Every
/// method is a pure function of its arguments: no coder implementation may
/// retain state between blocks.
pub trait FactorCoder: Send + Sync {
    fn encode_block(&self, out: &mut BitWriter, offsets: &[u32], lens: &[u32]) -> Result<(), CoderError>;
    fn decode_block(&self, input: &mut BitReader, count: usize) -> Result<(Vec<u32>, Vec<u32>), CoderError>;
}

/// Fixed-width 32-bit little-endian encoding: simplest, byte-aligned,
/// serves as the interoperability baseline.
pub struct U32RawCoder;

impl FactorCoder for U32RawCoder {
    fn encode_block(&self, out: &mut BitWriter, offsets: &[u32], lens: &[u32]) -> Result<(), CoderError> {
        debug_assert_eq!(offsets.len(), lens.len());
        for (&off, &len) in offsets.iter().zip(lens.iter()) {
            out.write_u32_le(off);
            out.write_u32_le(len);
        }
        Ok(())
    }

    fn decode_block(&self, input: &mut BitReader, count: usize) -> Result<(Vec<u32>, Vec<u32>), CoderError> {
        let mut offsets = Vec::with_capacity(count);
        let mut lens = Vec::with_capacity(count);
        for _ in 0..count {
            offsets.push(input.read_u32_le().ok_or(CoderError::UnexpectedEndOfStream)?);
            lens.push(input.read_u32_le().ok_or(CoderError::UnexpectedEndOfStream)?);
        }
        Ok((offsets, lens))
    }
}

/// LEB128-style variable-length encoding: smaller on typical corpora where
/// most offsets/lengths fit in one or two bytes.
pub struct VarByteCoder;

impl FactorCoder for VarByteCoder {
    fn encode_block(&self, out: &mut BitWriter, offsets: &[u32], lens: &[u32]) -> Result<(), CoderError> {
        debug_assert_eq!(offsets.len(), lens.len());
        for (&off, &len) in offsets.iter().zip(lens.iter()) {
            out.write_varint(off as u64);
            out.write_varint(len as u64);
        }
        Ok(())
    }

    fn decode_block(&self, input: &mut BitReader, count: usize) -> Result<(Vec<u32>, Vec<u32>), CoderError> {
        let mut offsets = Vec::with_capacity(count);
        let mut lens = Vec::with_capacity(count);
        for _ in 0..count {
            let off = input.read_varint().ok_or(CoderError::UnexpectedEndOfStream)?;
            let len = input.read_varint().ok_or(CoderError::UnexpectedEndOfStream)?;
            offsets.push(off as u32);
            lens.push(len as u32);
        }
        Ok((offsets, lens))
    }
}
