//! Parallel block factorizer (C5).
//!
//! Partitions the text into fixed-size factorization blocks, hands
//! contiguous groups of blocks to independent worker threads in a scoped
//! pool sized to `num_threads` (no worker touches another's range), and
//! merges the per-block encoded output back into global block order via
//! [`BlockRegister`] — a `BTreeMap<u64, _>` behind a `Mutex` that
//! reassembles out-of-order worker output.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use rayon::prelude::*;

use crate::coder::bits::BitWriter;
use crate::coder::{BlockMap, FactorCoder};
use crate::error::{BuildError, RlzError};
use crate::factor::FactorSelectionPolicy;
use crate::selfindex::SelfIndex;

#[derive(Debug, Clone)]
pub struct FactorizeConfig {
    pub factorization_block_size: u32,
    pub num_threads: usize,
    pub selection_policy: FactorSelectionPolicy,
}

/// Holds per-block encoded bytes until every block up to the current
/// drain point has arrived, then hands them to the caller in order.
struct BlockRegister {
    pending: Mutex<BTreeMap<u64, (u32, Vec<u8>)>>,
}

impl BlockRegister {
    fn new() -> Self {
        BlockRegister { pending: Mutex::new(BTreeMap::new()) }
    }

    fn insert(&self, block_id: u64, factor_count: u32, bytes: Vec<u8>) {
        self.pending.lock().unwrap().insert(block_id, (factor_count, bytes));
    }

    fn drain_in_order(self) -> (Vec<u8>, BlockMap) {
        let pending = self.pending.into_inner().unwrap();
        let mut stream = Vec::new();
        let mut map = BlockMap::new();
        for (_, (count, bytes)) in pending {
            map.push_block(count, bytes.len() as u64 * 8);
            stream.extend_from_slice(&bytes);
        }
        (stream, map)
    }
}

/// Factorizes `text` against `dict`/`index` in parallel, encoding each
/// factorization block with `coder` as soon as it is produced. Returns the
/// concatenated factor stream and its block map.
pub fn factorize_parallel(
    text: &[u8],
    index: &Arc<SelfIndex>,
    dict: &Arc<Vec<u8>>,
    coder: &dyn FactorCoder,
    cfg: &FactorizeConfig,
) -> Result<(Vec<u8>, BlockMap), RlzError> {
    if cfg.num_threads == 0 {
        return Err(BuildError::NoWorkerThreads.into());
    }
    let bf = cfg.factorization_block_size.max(1) as usize;
    let num_blocks = (text.len() + bf - 1) / bf.max(1);
    if num_blocks == 0 {
        return Ok((Vec::new(), BlockMap::new()));
    }

    let blocks_per_thread = (num_blocks + cfg.num_threads - 1) / cfg.num_threads;
    let worker_ranges: Vec<(usize, usize)> = (0..cfg.num_threads)
        .map(|t| {
            let start = t * blocks_per_thread;
            let end = (start + blocks_per_thread).min(num_blocks);
            (start, end)
        })
        .filter(|(s, e)| s < e)
        .collect();

    let register = BlockRegister::new();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.num_threads)
        .build()
        .map_err(|e| BuildError::ThreadPoolInit(e.to_string()))?;

    pool.install(|| {
        worker_ranges
            .into_par_iter()
            .try_for_each(|(start_block, end_block)| -> Result<(), RlzError> {
                for block_id in start_block..end_block {
                    let text_start = block_id * bf;
                    let text_end = (text_start + bf).min(text.len());
                    let block_text = &text[text_start..text_end];

                    let factors = index.factorize(block_text, dict, cfg.selection_policy);
                    let offsets: Vec<u32> = factors.iter().map(|f| f.offset).collect();
                    let lens: Vec<u32> = factors.iter().map(|f| f.len).collect();

                    let mut writer = BitWriter::new();
                    coder.encode_block(&mut writer, &offsets, &lens)?;
                    register.insert(block_id as u64, factors.len() as u32, writer.into_bytes());
                }
                Ok(())
            })
    })?;

    Ok(register.drain_in_order())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coder::VarByteCoder;

    #[test]
    fn parallel_factorization_is_independent_of_thread_count() {
        let dict = Arc::new(b"the quick brown fox jumps over the lazy dog\0".to_vec());
        let index = Arc::new(SelfIndex::build(&dict));
        let text = b"the quick fox jumps the lazy dog the quick brown fox";
        let coder = VarByteCoder;

        let cfg1 = FactorizeConfig {
            factorization_block_size: 8,
            num_threads: 1,
            selection_policy: FactorSelectionPolicy::First,
        };
        let cfg4 = FactorizeConfig { num_threads: 4, ..cfg1.clone() };

        let (stream1, map1) = factorize_parallel(text, &index, &dict, &coder, &cfg1).unwrap();
        let (stream4, map4) = factorize_parallel(text, &index, &dict, &coder, &cfg4).unwrap();

        assert_eq!(stream1, stream4);
        assert_eq!(map1.num_blocks(), map4.num_blocks());
    }

    #[test]
    fn block_map_allows_random_access_reconstruction() {
        let dict = Arc::new(b"abcdefghijklmnopqrstuvwxyz\0".to_vec());
        let index = Arc::new(SelfIndex::build(&dict));
        let text = b"abcdefghij klmnopqrst uvwxyzabcd";
        let coder = VarByteCoder;
        let cfg = FactorizeConfig {
            factorization_block_size: 6,
            num_threads: 3,
            selection_policy: FactorSelectionPolicy::First,
        };

        let (stream, map) = factorize_parallel(text, &index, &dict, &coder, &cfg).unwrap();
        map.validate().unwrap();

        let mut reconstructed = Vec::new();
        for i in 0..map.num_blocks() {
            let (offsets, lens) = map.access(i, &stream, &coder).unwrap();
            for (off, len) in offsets.iter().zip(lens.iter()) {
                if *len == 0 {
                    reconstructed.push(*off as u8);
                } else {
                    reconstructed.extend_from_slice(&dict[*off as usize..*off as usize + *len as usize]);
                }
            }
        }
        assert_eq!(reconstructed, text);
    }
}
