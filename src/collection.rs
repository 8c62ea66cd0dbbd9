//! Collection store (C1): the on-disk layout holding the raw text and the
//! artifacts built from it.
//!
//! A collection is a directory containing a `text` file (the corpus `T`)
//! and an `index/` subdirectory the builder fills in. Every artifact write
//! goes through [`atomic_write`], which writes to a sibling temp file and
//! renames it into place, so a crash mid-build never leaves a half-written
//! artifact visible under its real name.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{ConfigError, IoError, RlzError};

/// Identifies one of the fixed artifact slots a build produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKey {
    Dictionary,
    Sketch,
    FactorStream,
    BlockMap,
    Manifest,
}

impl ArtifactKey {
    fn file_name(self) -> &'static str {
        match self {
            ArtifactKey::Dictionary => "dict",
            ArtifactKey::Sketch => "sketch.cms",
            ArtifactKey::FactorStream => "factors.bin",
            ArtifactKey::BlockMap => "blockmap.bin",
            ArtifactKey::Manifest => "manifest.txt",
        }
    }
}

/// Owns the collection directory and the mapping from artifact keys to
/// their on-disk paths, plus a small free-form key/value parameter map
/// (currently just the dictionary hash).
pub struct CollectionStore {
    root: PathBuf,
    index_dir: PathBuf,
    param_map: HashMap<String, String>,
}

impl CollectionStore {
    /// Opens `root` as a collection directory, validating that `text`
    /// exists and creating `index/` if it is missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, RlzError> {
        let root = root.into();
        let text_path = root.join("text");
        if !text_path.is_file() {
            return Err(ConfigError::MissingTextFile(text_path).into());
        }
        let index_dir = root.join("index");
        fs::create_dir_all(&index_dir)
            .map_err(|e| IoError::AtPath(index_dir.clone(), e))?;
        Ok(CollectionStore { root, index_dir, param_map: HashMap::new() })
    }

    pub fn text_path(&self) -> PathBuf {
        self.root.join("text")
    }

    /// Memory-maps the corpus text for read-only, shared access.
    pub fn map_text(&self) -> Result<Mmap, RlzError> {
        let path = self.text_path();
        let file = fs::File::open(&path).map_err(|e| IoError::AtPath(path.clone(), e))?;
        // SAFETY: the collection's text file is treated as immutable for the
        // lifetime of the store; callers must not mutate it out-of-band
        // while a mapping is live.
        unsafe { Mmap::map(&file) }.map_err(|e| IoError::AtPath(path, e).into())
    }

    pub fn path_for(&self, key: ArtifactKey) -> PathBuf {
        self.index_dir.join(key.file_name())
    }

    pub fn file_exists(&self, key: ArtifactKey) -> bool {
        self.path_for(key).is_file()
    }

    pub fn set_param(&mut self, key: &str, value: impl Into<String>) {
        self.param_map.insert(key.to_string(), value.into());
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.param_map.get(key).map(String::as_str)
    }

    /// Computes a stable content hash of the dictionary artifact, used to
    /// detect whether downstream artifacts (factor stream, block map) were
    /// built against the current dictionary or a stale one.
    pub fn compute_dict_hash(&self, dict: &[u8]) -> String {
        blake3::hash(dict).to_hex().to_string()
    }
}

/// Writes `contents` to `path` by first writing to a sibling `.tmp` file and
/// then renaming it into place, so readers never observe a partial file.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), RlzError> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut f = fs::File::create(&tmp_path).map_err(|e| IoError::AtPath(tmp_path.clone(), e))?;
        f.write_all(contents).map_err(|e| IoError::AtPath(tmp_path.clone(), e))?;
        f.sync_all().map_err(|e| IoError::AtPath(tmp_path.clone(), e))?;
    }
    fs::rename(&tmp_path, path).map_err(|e| IoError::AtPath(path.to_path_buf(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_collection(text: &[u8]) -> (tempfile::TempDir, CollectionStore) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("text"), text).unwrap();
        let store = CollectionStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn open_creates_index_dir() {
        let (dir, _store) = make_collection(b"hello world");
        assert!(dir.path().join("index").is_dir());
    }

    #[test]
    fn open_fails_without_text() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CollectionStore::open(dir.path()).is_err());
    }

    #[test]
    fn map_text_reads_contents() {
        let (_dir, store) = make_collection(b"hello world");
        let mapping = store.map_text().unwrap();
        assert_eq!(&mapping[..], b"hello world");
    }

    #[test]
    fn atomic_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        atomic_write(&path, b"payload").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"payload");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn dict_hash_is_stable_and_sensitive_to_content() {
        let (_dir, store) = make_collection(b"hello world");
        let h1 = store.compute_dict_hash(b"dict-contents");
        let h2 = store.compute_dict_hash(b"dict-contents");
        let h3 = store.compute_dict_hash(b"other-contents");
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }
}
