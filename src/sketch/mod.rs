//! Count-Min Sketch frequency estimator (C2).
//!
//! Approximates the occurrence count of every w-gram hash in the corpus
//! using a fixed-size `depth x width` counter table, sized from the desired
//! `(epsilon, delta)` error bounds rather than from the corpus size. Built
//! in parallel over disjoint, `w - 1`-byte-overlapping ranges of the text so
//! no w-gram spanning a range boundary is missed or double-counted.

pub mod rolling_hash;

use std::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

use rayon::prelude::*;

use crate::error::{BuildError, ConfigError, RlzError};
use rolling_hash::RollingWindowHasher;

/// `depth` pairwise-independent hash rows over a `width`-wide counter table.
pub struct CountMinSketch {
    depth: usize,
    width: usize,
    cells: Vec<Vec<u64>>,
    total_count: u64,
    seeds: Vec<u64>,
}

impl CountMinSketch {
    pub fn new(depth: usize, width: usize) -> Self {
        assert!(depth > 0 && width > 0);
        let seeds = (0..depth).map(|i| 0x9E3779B97F4A7C15u64.wrapping_mul(i as u64 + 1)).collect();
        CountMinSketch {
            depth,
            width,
            cells: vec![vec![0u64; width]; depth],
            total_count: 0,
            seeds,
        }
    }

    /// Sizes a sketch from desired relative error `epsilon` and failure
    /// probability `delta`, via the standard CMS construction:
    /// `width = ceil(e / epsilon)`, `depth = ceil(ln(1 / delta))`.
    pub fn with_error_bounds(epsilon: f64, delta: f64) -> Result<Self, ConfigError> {
        if !(epsilon > 0.0 && epsilon < 1.0) {
            return Err(ConfigError::InvalidParam("epsilon", "must be in (0, 1)".to_string()));
        }
        if !(delta > 0.0 && delta < 1.0) {
            return Err(ConfigError::InvalidParam("delta", "must be in (0, 1)".to_string()));
        }
        let width = (std::f64::consts::E / epsilon).ceil() as usize;
        let depth = (1.0 / delta).ln().ceil() as usize;
        Ok(CountMinSketch::new(depth.max(1), width.max(1)))
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn width(&self) -> usize {
        self.width
    }

    fn row_index(&self, row: usize, h: u64) -> usize {
        let mut hasher = DefaultHasher::new();
        self.seeds[row].hash(&mut hasher);
        h.hash(&mut hasher);
        (hasher.finish() % self.width as u64) as usize
    }

    pub fn update(&mut self, h: u64) {
        for row in 0..self.depth {
            let idx = self.row_index(row, h);
            self.cells[row][idx] += 1;
        }
        self.total_count += 1;
    }

    pub fn estimate(&self, h: u64) -> u64 {
        (0..self.depth)
            .map(|row| self.cells[row][self.row_index(row, h)])
            .min()
            .unwrap_or(0)
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Merges `other`'s counters into `self`, cell by cell. Both sketches
    /// must share the same `(depth, width)` shape.
    pub fn combine(&mut self, other: &CountMinSketch) -> Result<(), ConfigError> {
        if self.depth != other.depth || self.width != other.width {
            return Err(ConfigError::MismatchedSketchParams {
                expected: (self.depth, self.width),
                found: (other.depth, other.width),
            });
        }
        for row in 0..self.depth {
            for col in 0..self.width {
                self.cells[row][col] += other.cells[row][col];
            }
        }
        self.total_count += other.total_count;
        Ok(())
    }

    pub fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.depth * self.width * std::mem::size_of::<u64>()
    }

    /// The configured relative error bound `epsilon = e / width`.
    pub fn estimation_error(&self) -> f64 {
        std::f64::consts::E / self.width as f64
    }

    /// The configured success probability `1 - delta`, `delta = e^{-depth}`.
    pub fn estimation_probability(&self) -> f64 {
        1.0 - (-(self.depth as f64)).exp()
    }

    /// Serializes to a simple fixed binary layout: depth, width as u32 LE,
    /// total_count as u64 LE, then `depth * width` u64 cells, row-major.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + self.depth * self.width * 8);
        out.extend_from_slice(&(self.depth as u32).to_le_bytes());
        out.extend_from_slice(&(self.width as u32).to_le_bytes());
        out.extend_from_slice(&self.total_count.to_le_bytes());
        for row in &self.cells {
            for &cell in row {
                out.extend_from_slice(&cell.to_le_bytes());
            }
        }
        out
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < 16 {
            return None;
        }
        let depth = u32::from_le_bytes(buf[0..4].try_into().ok()?) as usize;
        let width = u32::from_le_bytes(buf[4..8].try_into().ok()?) as usize;
        let total_count = u64::from_le_bytes(buf[8..16].try_into().ok()?);
        let expected_len = 16 + depth * width * 8;
        if buf.len() != expected_len {
            return None;
        }
        let mut cells = vec![vec![0u64; width]; depth];
        let mut cursor = 16;
        for row in cells.iter_mut() {
            for cell in row.iter_mut() {
                *cell = u64::from_le_bytes(buf[cursor..cursor + 8].try_into().ok()?);
                cursor += 8;
            }
        }
        let seeds = (0..depth).map(|i| 0x9E3779B97F4A7C15u64.wrapping_mul(i as u64 + 1)).collect();
        Some(CountMinSketch { depth, width, cells, total_count, seeds })
    }
}

/// Builds one sketch per `num_threads` contiguous, overlapping ranges of
/// `text` and combines them, so the result is identical regardless of how
/// many threads were used. The ranges are mapped inside a scoped pool sized
/// to exactly `num_threads`, rather than rayon's ambient global pool, so the
/// configured worker count is actually honored.
pub fn build_sketch_parallel(
    text: &[u8],
    w: usize,
    epsilon: f64,
    delta: f64,
    num_threads: usize,
) -> Result<CountMinSketch, RlzError> {
    let num_threads = num_threads.max(1);
    if text.len() < w {
        return Ok(CountMinSketch::with_error_bounds(epsilon, delta)?);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| BuildError::ThreadPoolInit(e.to_string()))?;

    let chunk_len = (text.len() + num_threads - 1) / num_threads;

    // Each worker owns the w-grams whose *start* position falls in its
    // primary range `[start, primary_end)`. It reads `w - 1` bytes past
    // that boundary (the overlap) purely so the last few owned w-grams are
    // complete, without ever counting a w-gram whose start belongs to the
    // next worker — that is what keeps `combine` additive rather than
    // double-counting shared bytes.
    let ranges: Vec<(usize, usize, usize)> = (0..num_threads)
        .map(|i| {
            let start = (i * chunk_len).min(text.len());
            let primary_end = ((i + 1) * chunk_len).min(text.len());
            let read_end = (primary_end + w - 1).min(text.len());
            (start, primary_end, read_end)
        })
        .filter(|(s, primary_end, _)| s < primary_end)
        .collect();

    let partials: Vec<CountMinSketch> = pool.install(|| {
        ranges
            .into_par_iter()
            .map(|(start, primary_end, read_end)| {
                let mut sketch = CountMinSketch::with_error_bounds(epsilon, delta)
                    .expect("validated bounds");
                let owned_starts = primary_end - start;
                let mut hasher = RollingWindowHasher::new(w);
                let mut windows_seen = 0usize;
                for &byte in &text[start..read_end] {
                    if let Some(h) = hasher.push(byte) {
                        if windows_seen < owned_starts {
                            sketch.update(h);
                        }
                        windows_seen += 1;
                    }
                }
                sketch
            })
            .collect()
    });

    let mut combined = CountMinSketch::with_error_bounds(epsilon, delta)?;
    for partial in &partials {
        combined.combine(partial)?;
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_never_underestimates() {
        let mut s = CountMinSketch::new(4, 64);
        for h in [1u64, 2, 1, 3, 1, 2] {
            s.update(h);
        }
        assert!(s.estimate(1) >= 3);
        assert!(s.estimate(2) >= 2);
        assert!(s.estimate(3) >= 1);
    }

    #[test]
    fn combine_matches_sequential_update() {
        let mut a = CountMinSketch::new(3, 32);
        let mut b = CountMinSketch::new(3, 32);
        let mut seq = CountMinSketch::new(3, 32);
        for h in [10u64, 20, 10, 30] {
            a.update(h);
            seq.update(h);
        }
        for h in [20u64, 20, 40] {
            b.update(h);
            seq.update(h);
        }
        a.combine(&b).unwrap();
        for h in [10u64, 20, 30, 40] {
            assert_eq!(a.estimate(h), seq.estimate(h));
        }
        assert_eq!(a.total_count(), seq.total_count());
    }

    #[test]
    fn combine_rejects_mismatched_shapes() {
        let mut a = CountMinSketch::new(3, 32);
        let b = CountMinSketch::new(4, 32);
        assert!(a.combine(&b).is_err());
    }

    #[test]
    fn round_trip_bytes() {
        let mut s = CountMinSketch::new(2, 8);
        s.update(5);
        s.update(5);
        let bytes = s.to_bytes();
        let loaded = CountMinSketch::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.estimate(5), s.estimate(5));
        assert_eq!(loaded.total_count(), s.total_count());
    }

    #[test]
    fn parallel_build_is_order_independent_of_thread_count() {
        let text = b"the quick brown fox jumps over the lazy dog the quick brown fox";
        let single = build_sketch_parallel(text, 4, 1.0 / 1000.0, 0.1, 1).unwrap();
        let multi = build_sketch_parallel(text, 4, 1.0 / 1000.0, 0.1, 5).unwrap();
        // every w-gram's exact count should match between the two builds
        let mut hasher = RollingWindowHasher::new(4);
        for &b in text {
            if let Some(h) = hasher.push(b) {
                assert_eq!(single.estimate(h), multi.estimate(h));
            }
        }
    }
}
