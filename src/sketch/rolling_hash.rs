//! Fixed-width rolling hash over `w`-byte windows ("w-grams").
//!
//! A polynomial rolling hash maintained incrementally: each call to
//! [`RollingWindowHasher::push`] adds the new trailing byte and removes the
//! contribution of the byte that falls out of the window, in O(1) time
//! regardless of `w`.

const BASE: u64 = 1_099_511_628_211; // FNV-ish odd multiplier, good avalanche for this width.

pub struct RollingWindowHasher {
    w: usize,
    ring: Vec<u8>,
    pos: usize,
    filled: usize,
    hash: u64,
    base_pow_w_minus_1: u64,
}

impl RollingWindowHasher {
    pub fn new(w: usize) -> Self {
        assert!(w > 0, "window width must be >= 1");
        let mut base_pow = 1u64;
        for _ in 0..w.saturating_sub(1) {
            base_pow = base_pow.wrapping_mul(BASE);
        }
        RollingWindowHasher {
            w,
            ring: vec![0u8; w],
            pos: 0,
            filled: 0,
            hash: 0,
            base_pow_w_minus_1: base_pow,
        }
    }

    pub fn window(&self) -> usize {
        self.w
    }

    /// Feeds one more byte into the window. Returns `Some(hash)` once at
    /// least `w` bytes have been seen (the hash of the most recent `w`
    /// bytes), otherwise `None`.
    pub fn push(&mut self, byte: u8) -> Option<u64> {
        if self.filled == self.w {
            let outgoing = self.ring[self.pos] as u64;
            self.hash = self
                .hash
                .wrapping_sub(outgoing.wrapping_mul(self.base_pow_w_minus_1));
        } else {
            self.filled += 1;
        }
        self.hash = self.hash.wrapping_mul(BASE).wrapping_add(byte as u64);
        self.ring[self.pos] = byte;
        self.pos = (self.pos + 1) % self.w;

        if self.filled == self.w {
            Some(self.hash)
        } else {
            None
        }
    }
}

/// Hashes every w-gram in `data` in one pass, yielding `len(data) - w + 1`
/// hashes (or zero if `data` is shorter than `w`).
pub fn hash_all_windows(data: &[u8], w: usize) -> Vec<u64> {
    let mut hasher = RollingWindowHasher::new(w);
    let mut out = Vec::with_capacity(data.len().saturating_sub(w).saturating_add(1));
    for &b in data {
        if let Some(h) = hasher.push(b) {
            out.push(h);
        }
    }
    out
}
