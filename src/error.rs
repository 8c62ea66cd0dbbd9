//! Error taxonomy for the RLZ build/serve pipeline.
//!
//! Follows the manual enum + `Display`/`Error` idiom used throughout this
//! crate's codec layer rather than a derive-macro based error crate: each
//! variant carries just enough context to produce a single, actionable log
//! line at the CLI boundary.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type returned by every fallible operation in this crate.
#[derive(Debug)]
pub enum RlzError {
    Config(ConfigError),
    Io(IoError),
    Corruption(CorruptionError),
    Build(BuildError),
    Coder(CoderError),
}

impl fmt::Display for RlzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RlzError::Config(e) => write!(f, "configuration error: {e}"),
            RlzError::Io(e) => write!(f, "i/o error: {e}"),
            RlzError::Corruption(e) => write!(f, "corrupt artifact: {e}"),
            RlzError::Build(e) => write!(f, "build error: {e}"),
            RlzError::Coder(e) => write!(f, "coder error: {e}"),
        }
    }
}

impl std::error::Error for RlzError {}

impl From<ConfigError> for RlzError {
    fn from(e: ConfigError) -> Self {
        RlzError::Config(e)
    }
}

impl From<IoError> for RlzError {
    fn from(e: IoError) -> Self {
        RlzError::Io(e)
    }
}

impl From<CorruptionError> for RlzError {
    fn from(e: CorruptionError) -> Self {
        RlzError::Corruption(e)
    }
}

impl From<BuildError> for RlzError {
    fn from(e: BuildError) -> Self {
        RlzError::Build(e)
    }
}

impl From<CoderError> for RlzError {
    fn from(e: CoderError) -> Self {
        RlzError::Coder(e)
    }
}

impl From<io::Error> for RlzError {
    fn from(e: io::Error) -> Self {
        RlzError::Io(IoError::Os(e))
    }
}

/// Bad or missing configuration: malformed collection layout, inconsistent
/// sketch parameters, a budget too small to be useful, and similar.
#[derive(Debug)]
pub enum ConfigError {
    MissingTextFile(PathBuf),
    MismatchedSketchParams { expected: (usize, usize), found: (usize, usize) },
    InvalidParam(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingTextFile(p) => {
                write!(f, "collection text file not found: {}", p.display())
            }
            ConfigError::MismatchedSketchParams { expected, found } => write!(
                f,
                "cannot combine sketches of differing shape: expected (depth,width)={:?}, found {:?}",
                expected, found
            ),
            ConfigError::InvalidParam(name, detail) => {
                write!(f, "invalid parameter `{name}`: {detail}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Wraps the underlying OS error plus, where useful, the path it concerns.
#[derive(Debug)]
pub enum IoError {
    Os(io::Error),
    AtPath(PathBuf, io::Error),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoError::Os(e) => write!(f, "{e}"),
            IoError::AtPath(p, e) => write!(f, "{}: {e}", p.display()),
        }
    }
}

impl std::error::Error for IoError {}

/// Artifacts that fail a structural sanity check on load.
#[derive(Debug)]
pub enum CorruptionError {
    BadMagic { path: PathBuf },
    TruncatedFile { path: PathBuf, expected_at_least: u64, found: u64 },
    NonMonotoneBlockMap { index: usize },
    DictHashMismatch { expected: String, found: String },
}

impl fmt::Display for CorruptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptionError::BadMagic { path } => {
                write!(f, "{}: bad magic / header", path.display())
            }
            CorruptionError::TruncatedFile { path, expected_at_least, found } => write!(
                f,
                "{}: truncated (expected at least {expected_at_least} bytes, found {found})",
                path.display()
            ),
            CorruptionError::NonMonotoneBlockMap { index } => write!(
                f,
                "block map offsets are not strictly increasing at index {index}"
            ),
            CorruptionError::DictHashMismatch { expected, found } => write!(
                f,
                "dictionary hash mismatch: artifacts were built against {expected}, current dictionary is {found}"
            ),
        }
    }
}

impl std::error::Error for CorruptionError {}

/// Failures specific to dictionary construction / factorization.
#[derive(Debug)]
pub enum BuildError {
    EmptyHeavyGramTable,
    NoWorkerThreads,
    WorkerPanicked(usize),
    ThreadPoolInit(String),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::EmptyHeavyGramTable => write!(
                f,
                "no w-gram met the heavy threshold; dictionary selection has nothing to pick from"
            ),
            BuildError::NoWorkerThreads => write!(f, "worker thread count must be at least 1"),
            BuildError::WorkerPanicked(idx) => {
                write!(f, "factorization worker {idx} panicked")
            }
            BuildError::ThreadPoolInit(detail) => {
                write!(f, "failed to start worker thread pool: {detail}")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Failures from the factor encoder/decoder.
#[derive(Debug)]
pub enum CoderError {
    OffsetOutOfRange(u64),
    LengthOverflow(u64),
    UnexpectedEndOfStream,
}

impl fmt::Display for CoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoderError::OffsetOutOfRange(off) => write!(f, "offset {off} exceeds dictionary size"),
            CoderError::LengthOverflow(len) => write!(f, "factor length {len} does not fit the coder's width"),
            CoderError::UnexpectedEndOfStream => write!(f, "factor stream ended before the expected count was decoded"),
        }
    }
}

impl std::error::Error for CoderError {}
