//! Compile-time defaults and the runtime `Config` struct.
//!
//! Every tunable gets a documented default constant, and `Config` bundles
//! them into the struct the orchestrator actually threads through the
//! pipeline.

use crate::error::ConfigError;
use crate::factor::FactorSelectionPolicy;
use crate::coder::CoderKind;

/// Dictionary sampling block size in bytes.
pub const B_DEFAULT: u32 = 1024;
/// Frequency-estimator window width (the "w-gram" length), in bytes.
pub const W_DEFAULT: u32 = 16;
/// Dictionary byte budget, 64 MiB by default.
pub const BUDGET_DEFAULT: u64 = 64 * 1024 * 1024;
/// Heavy-gram threshold. The original hard-codes this; here it is
/// configurable, with this value kept as the default.
pub const TAU_DEFAULT: u64 = 1000;
/// Count-Min sketch relative error.
pub const CMS_EPSILON_DEFAULT: f64 = 1.0 / 3_000_000.0;
/// Count-Min sketch failure probability.
pub const CMS_DELTA_DEFAULT: f64 = 1.0 / 10.0;
/// Factorization block size in bytes (text-side, not dictionary-side).
pub const BF_DEFAULT: u32 = 2048;

/// Which policy resolves a suffix-array range `[sp, ep)` to a single
/// dictionary offset when more than one candidate match exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicyKind {
    First,
    Random,
    SuffixArraySample,
}

impl SelectionPolicyKind {
    pub fn into_policy(self) -> FactorSelectionPolicy {
        match self {
            SelectionPolicyKind::First => FactorSelectionPolicy::First,
            SelectionPolicyKind::Random => FactorSelectionPolicy::Random,
            SelectionPolicyKind::SuffixArraySample => FactorSelectionPolicy::SuffixArraySample,
        }
    }
}

/// Named-but-not-implemented forward-compat value; `Uncompressed` is the
/// only block map representation this crate currently emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMapKind {
    Uncompressed,
    EliasFano,
}

/// Runtime-tunable pipeline parameters: one place that holds every
/// user-facing knob, with a sensible `Default`.
#[derive(Debug, Clone)]
pub struct Config {
    pub sample_block_size: u32,
    pub estimator_window: u32,
    pub budget_bytes: u64,
    pub heavy_threshold: u64,
    pub cms_epsilon: f64,
    pub cms_delta: f64,
    pub factorization_block_size: u32,
    pub num_threads: usize,
    pub selection_policy: SelectionPolicyKind,
    pub coder: CoderKind,
    pub block_map: BlockMapKind,
    pub rebuild: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sample_block_size: B_DEFAULT,
            estimator_window: W_DEFAULT,
            budget_bytes: BUDGET_DEFAULT,
            heavy_threshold: TAU_DEFAULT,
            cms_epsilon: CMS_EPSILON_DEFAULT,
            cms_delta: CMS_DELTA_DEFAULT,
            factorization_block_size: BF_DEFAULT,
            num_threads: crate::util::count_cores(),
            selection_policy: SelectionPolicyKind::SuffixArraySample,
            coder: CoderKind::VarByte,
            block_map: BlockMapKind::Uncompressed,
            rebuild: false,
        }
    }
}

impl Config {
    /// Validates parameter relationships that can't be enforced by the type
    /// system alone (e.g. a window wider than a sampling block makes no
    /// w-gram ever fit inside one sample).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.estimator_window == 0 {
            return Err(ConfigError::InvalidParam(
                "estimator_window",
                "must be >= 1".to_string(),
            ));
        }
        if self.sample_block_size < self.estimator_window {
            return Err(ConfigError::InvalidParam(
                "sample_block_size",
                format!(
                    "must be >= estimator_window ({} < {})",
                    self.sample_block_size, self.estimator_window
                ),
            ));
        }
        if self.num_threads == 0 {
            return Err(ConfigError::InvalidParam("num_threads", "must be >= 1".to_string()));
        }
        if !(0.0..1.0).contains(&self.cms_epsilon) || !(0.0..1.0).contains(&self.cms_delta) {
            return Err(ConfigError::InvalidParam(
                "cms_epsilon/cms_delta",
                "must be in (0, 1)".to_string(),
            ));
        }
        Ok(())
    }
}
