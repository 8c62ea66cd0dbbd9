//! Parallel RLZ (relative Lempel-Ziv) compressed index builder and store.
//!
//! A collection's text is sampled and sketched ([`sketch`]) to pick a small
//! dictionary via weighted set-cover ([`dict`]), which is then used to
//! factorize the whole corpus in parallel ([`factorize`], against the
//! dictionary's self-index in [`selfindex`]) into an entropy-coded factor
//! stream with random-access block map ([`coder`]). [`builder`] wires all
//! of this into a single `build_or_load` entry point over a [`collection`].

pub mod coder;
pub mod collection;
pub mod config;
pub mod dict;
pub mod error;
pub mod factor;
pub mod factorize;
pub mod log;
pub mod selfindex;
pub mod sketch;
pub mod util;

mod builder;

pub use builder::{RlzBuilder, RlzStore};
pub use collection::CollectionStore;
pub use config::Config;
pub use error::RlzError;

pub const VERSION_MAJOR: i32 = 0;
pub const VERSION_MINOR: i32 = 1;
pub const VERSION_PATCH: i32 = 0;
pub const VERSION_STRING: &str = "0.1.0";

/// Returns the library version string (e.g. `"0.1.0"`).
pub fn version_string() -> &'static str {
    VERSION_STRING
}
