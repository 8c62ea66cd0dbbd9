//! Leveled progress diagnostics.
//!
//! A global verbosity atomic plus a leveled `eprintln!` macro, rather than
//! pulling in a logging crate: this crate's long-running stages (sketch
//! build, greedy selection, factorization) report progress directly to
//! stderr at a configurable verbosity level.

use std::sync::atomic::{AtomicI32, Ordering};

static DISPLAY_LEVEL: AtomicI32 = AtomicI32::new(1);

/// Sets the global verbosity level (0 = silent, 5 = trace).
pub fn set_display_level(level: i32) {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
}

/// Returns the current global verbosity level.
pub fn display_level() -> i32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

/// Prints `$($arg)*` to stderr if the global level is at least `$lvl`.
#[macro_export]
macro_rules! displaylevel {
    ($lvl:expr, $($arg:tt)*) => {
        if $crate::log::display_level() >= $lvl {
            eprintln!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_round_trips() {
        set_display_level(3);
        assert_eq!(display_level(), 3);
        set_display_level(1);
    }
}
