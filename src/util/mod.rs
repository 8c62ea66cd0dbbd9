//! Cross-cutting utility functions.
//!
//! Submodules:
//! - [`cores`] — CPU core counting via [`std::thread::available_parallelism`]

pub mod cores;

pub use cores::count_cores;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_cores_at_least_one() {
        assert!(count_cores() >= 1);
    }
}
