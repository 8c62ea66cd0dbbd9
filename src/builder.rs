//! Orchestrator (C7): wires C1-C6 into `build_or_load` / the read-ready
//! `RlzStore` handle, with content-addressed artifact caching.
//!
//! Artifacts already on disk and hashed against the current dictionary are
//! reused; anything missing or stale is rebuilt from scratch.

use std::sync::Arc;

use crate::coder::{BlockMap, CoderKind, FactorCoder};
use crate::collection::{atomic_write, ArtifactKey, CollectionStore};
use crate::config::Config;
use crate::dict::{DictConfig, DictionaryBuilder};
use crate::displaylevel;
use crate::error::{CorruptionError, RlzError};
use crate::factorize::{factorize_parallel, FactorizeConfig};
use crate::selfindex::SelfIndex;
use crate::sketch::CountMinSketch;

pub struct RlzBuilder {
    cfg: Config,
}

impl RlzBuilder {
    pub fn new(cfg: Config) -> Result<Self, RlzError> {
        cfg.validate()?;
        Ok(RlzBuilder { cfg })
    }

    /// Builds (or loads, if up to date and `!cfg.rebuild`) every artifact
    /// for `collection`, returning a ready-to-serve [`RlzStore`].
    pub fn build_or_load(&self, collection: &mut CollectionStore) -> Result<RlzStore, RlzError> {
        let text_map = collection.map_text()?;
        let text: &[u8] = &text_map;

        let need_dict = self.cfg.rebuild || !collection.file_exists(ArtifactKey::Dictionary);

        let (dict, sketch) = if need_dict {
            displaylevel!(2, "rlzstore: building dictionary ({} byte budget)...", self.cfg.budget_bytes);
            let dict_cfg = DictConfig::from(&self.cfg);
            let (dict, sketch) = DictionaryBuilder::build(text, &dict_cfg)?;
            atomic_write(&collection.path_for(ArtifactKey::Dictionary), &dict)?;
            atomic_write(&collection.path_for(ArtifactKey::Sketch), &sketch.to_bytes())?;
            let hash = collection.compute_dict_hash(&dict);
            collection.set_param("dict_hash", hash);
            (dict, sketch)
        } else {
            displaylevel!(2, "rlzstore: reusing existing dictionary");
            let dict = std::fs::read(collection.path_for(ArtifactKey::Dictionary))?;
            let sketch_bytes = std::fs::read(collection.path_for(ArtifactKey::Sketch))?;
            let sketch = CountMinSketch::from_bytes(&sketch_bytes).ok_or(CorruptionError::BadMagic {
                path: collection.path_for(ArtifactKey::Sketch),
            })?;
            let hash = collection.compute_dict_hash(&dict);
            collection.set_param("dict_hash", hash);
            (dict, sketch)
        };
        let _ = &sketch; // kept for callers that want estimator access via RlzStore in the future

        let dict_hash = collection.param("dict_hash").unwrap_or_default().to_string();

        let need_factors = self.cfg.rebuild
            || !collection.file_exists(ArtifactKey::FactorStream)
            || !collection.file_exists(ArtifactKey::BlockMap)
            || !Self::cached_hash_matches(collection, &dict_hash)?;

        let dict = Arc::new(dict);
        let index = Arc::new(SelfIndex::build(&dict));
        let coder = self.cfg.coder.coder();

        let (factor_stream, block_map) = if need_factors {
            displaylevel!(2, "rlzstore: factorizing corpus ({} worker threads)...", self.cfg.num_threads);
            let fcfg = FactorizeConfig {
                factorization_block_size: self.cfg.factorization_block_size,
                num_threads: self.cfg.num_threads,
                selection_policy: self.cfg.selection_policy.into_policy(),
            };
            let (stream, map) = factorize_parallel(text, &index, &dict, coder.as_ref(), &fcfg)?;
            atomic_write(&collection.path_for(ArtifactKey::FactorStream), &stream)?;
            atomic_write(&collection.path_for(ArtifactKey::BlockMap), &map.to_bytes())?;
            atomic_write(
                &collection.path_for(ArtifactKey::Manifest),
                format!("dict_hash={dict_hash}\n").as_bytes(),
            )?;
            (stream, map)
        } else {
            displaylevel!(2, "rlzstore: reusing existing factor stream");
            let stream = std::fs::read(collection.path_for(ArtifactKey::FactorStream))?;
            let map_bytes = std::fs::read(collection.path_for(ArtifactKey::BlockMap))?;
            let map = BlockMap::from_bytes(&map_bytes).ok_or(CorruptionError::BadMagic {
                path: collection.path_for(ArtifactKey::BlockMap),
            })?;
            (stream, map)
        };
        block_map.validate()?;

        Ok(RlzStore {
            dict,
            factor_stream,
            block_map,
            coder,
            text_len: text.len() as u64,
            dict_hash,
            factorization_block_size: self.cfg.factorization_block_size,
        })
    }

    fn cached_hash_matches(collection: &CollectionStore, current_hash: &str) -> Result<bool, RlzError> {
        let manifest_path = collection.path_for(ArtifactKey::Manifest);
        if !manifest_path.is_file() {
            return Ok(false);
        }
        let contents = std::fs::read_to_string(&manifest_path)?;
        let cached = contents
            .lines()
            .find_map(|l| l.strip_prefix("dict_hash="))
            .unwrap_or("");
        Ok(cached == current_hash)
    }
}

/// A ready-to-serve RLZ index: dictionary, factor stream, and block map,
/// plus the decode-time hooks needed for random-access extraction.
pub struct RlzStore {
    dict: Arc<Vec<u8>>,
    factor_stream: Vec<u8>,
    block_map: BlockMap,
    coder: Box<dyn FactorCoder>,
    text_len: u64,
    dict_hash: String,
    factorization_block_size: u32,
}

impl RlzStore {
    pub fn len(&self) -> u64 {
        self.text_len
    }

    pub fn is_empty(&self) -> bool {
        self.text_len == 0
    }

    pub fn dict_hash(&self) -> &str {
        &self.dict_hash
    }

    pub fn num_blocks(&self) -> usize {
        self.block_map.num_blocks()
    }

    /// Decodes and expands the `i`-th factorization block back to raw bytes.
    pub fn extract_block(&self, i: usize) -> Result<Vec<u8>, RlzError> {
        let (offsets, lens) = self.block_map.access(i, &self.factor_stream, self.coder.as_ref())?;
        let mut out = Vec::new();
        for (off, len) in offsets.iter().zip(lens.iter()) {
            if *len == 0 {
                out.push(*off as u8);
            } else {
                let start = *off as usize;
                let end = start + *len as usize;
                if end > self.dict.len() {
                    return Err(crate::error::CoderError::OffsetOutOfRange(*off as u64).into());
                }
                out.extend_from_slice(&self.dict[start..end]);
            }
        }
        Ok(out)
    }

    /// Extracts `[start, end)` of the original text, spanning as many
    /// factorization blocks as needed.
    pub fn extract_range(&self, start: u64, end: u64) -> Result<Vec<u8>, RlzError> {
        if end < start || end > self.text_len {
            return Err(crate::error::CorruptionError::TruncatedFile {
                path: Default::default(),
                expected_at_least: end,
                found: self.text_len,
            }
            .into());
        }
        let bf = self.factorization_block_size as u64;
        let first_block = (start / bf) as usize;
        let last_block = if end == start { first_block } else { ((end - 1) / bf) as usize };

        let mut out = Vec::new();
        for i in first_block..=last_block.min(self.num_blocks().saturating_sub(1)) {
            out.extend(self.extract_block(i)?);
        }

        let block_start = first_block as u64 * bf;
        let lo = (start - block_start) as usize;
        let hi = lo + (end - start) as usize;
        Ok(out[lo..hi.min(out.len())].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_collection(dir: &std::path::Path, text: &[u8]) -> CollectionStore {
        fs::write(dir.join("text"), text).unwrap();
        CollectionStore::open(dir).unwrap()
    }

    fn small_cfg() -> Config {
        Config {
            sample_block_size: 8,
            estimator_window: 4,
            budget_bytes: 64,
            heavy_threshold: 2,
            num_threads: 2,
            ..Config::default()
        }
    }

    #[test]
    fn build_then_extract_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let text = b"the quick brown fox the quick brown fox jumps over the lazy dog".to_vec();
        let mut collection = make_collection(dir.path(), &text);

        let builder = RlzBuilder::new(small_cfg()).unwrap();
        let store = builder.build_or_load(&mut collection).unwrap();

        assert_eq!(store.len(), text.len() as u64);
        let extracted = store.extract_range(0, text.len() as u64).unwrap();
        assert_eq!(extracted, text);
    }

    #[test]
    fn rebuild_is_skipped_when_artifacts_are_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let text = b"the quick brown fox the quick brown fox jumps over the lazy dog".to_vec();
        let mut collection = make_collection(dir.path(), &text);

        let builder = RlzBuilder::new(small_cfg()).unwrap();
        let _ = builder.build_or_load(&mut collection).unwrap();
        let dict_mtime_1 = fs::metadata(collection.path_for(ArtifactKey::Dictionary)).unwrap().modified().unwrap();

        let store2 = builder.build_or_load(&mut collection).unwrap();
        let dict_mtime_2 = fs::metadata(collection.path_for(ArtifactKey::Dictionary)).unwrap().modified().unwrap();

        assert_eq!(dict_mtime_1, dict_mtime_2);
        assert_eq!(store2.len(), text.len() as u64);
    }

    #[test]
    fn extract_range_handles_mid_block_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let text = b"abcdefghijABCDEFGHIJabcdefghijABCDEFGHIJ".to_vec();
        let mut collection = make_collection(dir.path(), &text);
        let mut cfg = small_cfg();
        cfg.factorization_block_size = 6;
        let builder = RlzBuilder::new(cfg).unwrap();
        let store = builder.build_or_load(&mut collection).unwrap();

        let extracted = store.extract_range(3, 17).unwrap();
        assert_eq!(extracted, &text[3..17]);
    }
}
