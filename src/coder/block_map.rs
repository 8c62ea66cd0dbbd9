//! Per-block offsets into the factor stream, giving O(1) random access to
//! any factorization block without scanning from the start.

use crate::coder::bits::BitReader;
use crate::coder::FactorCoder;
use crate::error::CorruptionError;

#[derive(Debug, Clone)]
pub struct BlockMap {
    /// `offsets[i]` is the bit offset the i-th block starts at;
    /// `offsets[len]` is the total bit length of the factor stream.
    offsets: Vec<u64>,
    factor_counts: Vec<u32>,
}

impl BlockMap {
    pub fn new() -> Self {
        BlockMap { offsets: vec![0], factor_counts: Vec::new() }
    }

    /// Records that the next block, starting at the stream's current end,
    /// contains `factor_count` factors and occupies `bit_len` bits.
    pub fn push_block(&mut self, factor_count: u32, bit_len: u64) {
        let start = *self.offsets.last().unwrap();
        self.offsets.push(start + bit_len);
        self.factor_counts.push(factor_count);
    }

    pub fn num_blocks(&self) -> usize {
        self.factor_counts.len()
    }

    pub fn validate(&self) -> Result<(), CorruptionError> {
        for i in 1..self.offsets.len() {
            if self.offsets[i] <= self.offsets[i - 1] && self.factor_counts[i - 1] > 0 {
                return Err(CorruptionError::NonMonotoneBlockMap { index: i });
            }
        }
        Ok(())
    }

    /// Decodes the `i`-th block's factors from `stream` using `coder`.
    pub fn access(
        &self,
        i: usize,
        stream: &[u8],
        coder: &dyn FactorCoder,
    ) -> Result<(Vec<u32>, Vec<u32>), crate::error::RlzError> {
        let bit_start = *self.offsets.get(i).ok_or(CorruptionError::NonMonotoneBlockMap { index: i })?;
        let count = *self.factor_counts.get(i).ok_or(CorruptionError::NonMonotoneBlockMap { index: i })?;
        let mut reader = BitReader::at_bit_offset(stream, bit_start);
        Ok(coder.decode_block(&mut reader, count as usize)?)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + self.offsets.len() * 8 + self.factor_counts.len() * 4);
        out.extend_from_slice(&(self.factor_counts.len() as u64).to_le_bytes());
        for &off in &self.offsets {
            out.extend_from_slice(&off.to_le_bytes());
        }
        for &c in &self.factor_counts {
            out.extend_from_slice(&c.to_le_bytes());
        }
        out
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < 8 {
            return None;
        }
        let num_blocks = u64::from_le_bytes(buf[0..8].try_into().ok()?) as usize;
        let mut cursor = 8;
        let mut offsets = Vec::with_capacity(num_blocks + 1);
        for _ in 0..=num_blocks {
            offsets.push(u64::from_le_bytes(buf.get(cursor..cursor + 8)?.try_into().ok()?));
            cursor += 8;
        }
        let mut factor_counts = Vec::with_capacity(num_blocks);
        for _ in 0..num_blocks {
            factor_counts.push(u32::from_le_bytes(buf.get(cursor..cursor + 4)?.try_into().ok()?));
            cursor += 4;
        }
        Some(BlockMap { offsets, factor_counts })
    }
}

impl Default for BlockMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coder::VarByteCoder;
    use crate::coder::bits::BitWriter;

    #[test]
    fn push_and_access_round_trip() {
        let coder = VarByteCoder;
        let mut stream = BitWriter::new();
        let mut map = BlockMap::new();

        let before = stream.bit_len();
        coder.encode_block(&mut stream, &[1, 2], &[3, 4]).unwrap();
        map.push_block(2, stream.bit_len() - before);

        let before = stream.bit_len();
        coder.encode_block(&mut stream, &[9], &[10]).unwrap();
        map.push_block(1, stream.bit_len() - before);

        let bytes = stream.into_bytes();
        let (offs, lens) = map.access(0, &bytes, &coder).unwrap();
        assert_eq!(offs, vec![1, 2]);
        assert_eq!(lens, vec![3, 4]);
        let (offs, lens) = map.access(1, &bytes, &coder).unwrap();
        assert_eq!(offs, vec![9]);
        assert_eq!(lens, vec![10]);
    }

    #[test]
    fn serde_round_trip() {
        let mut map = BlockMap::new();
        map.push_block(3, 80);
        map.push_block(5, 160);
        let bytes = map.to_bytes();
        let loaded = BlockMap::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.num_blocks(), 2);
        loaded.validate().unwrap();
    }
}
