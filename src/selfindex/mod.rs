//! Dictionary self-index (C4).
//!
//! Builds a suffix array over the dictionary `D` with the `libsais` crate
//! and factorizes arbitrary text against it by greedily narrowing the
//! matching suffix-array range one byte at a time.

use rand::Rng;

use crate::factor::{Factor, FactorSelectionPolicy};

/// An immutable suffix array over a dictionary, supporting greedy
/// longest-match factorization of arbitrary text. Built from plain `Vec`s
/// of `Copy` integers, so it is `Send + Sync` for free and needs no unsafe
/// wrapper to share across worker threads behind an `Arc`.
pub struct SelfIndex {
    dict_len: usize,
    sa: Vec<i32>,
}

impl SelfIndex {
    /// Builds a suffix array over `dict`. Falls back to a direct sort for
    /// inputs too small to be worth dispatching to `libsais`.
    pub fn build(dict: &[u8]) -> Self {
        let n = dict.len();
        if n < 2 {
            return SelfIndex { dict_len: n, sa: (0..n as i32).collect() };
        }

        let mut sa: Vec<i32> = vec![0; n];
        let built = libsais::SuffixArrayConstruction::for_text(dict)
            .in_borrowed_buffer(&mut sa)
            .run()
            .is_ok();

        if !built {
            // Deterministic fallback: sort suffix start positions directly.
            let mut idx: Vec<i32> = (0..n as i32).collect();
            idx.sort_by(|&a, &b| dict[a as usize..].cmp(&dict[b as usize..]));
            sa = idx;
        }

        SelfIndex { dict_len: n, sa }
    }

    pub fn dict_len(&self) -> usize {
        self.dict_len
    }

    /// Narrows `[lo, hi)` — a suffix-array range of suffixes agreeing on
    /// their first `depth` bytes — to the sub-range whose byte at `depth`
    /// equals `byte`. Suffixes shorter than `depth + 1` sort before `byte`
    /// (they can't be extended further).
    fn narrow_range(&self, dict: &[u8], lo: usize, hi: usize, depth: usize, byte: u8) -> (usize, usize) {
        let key_at = |sa_idx: usize| -> Option<u8> {
            let start = self.sa[sa_idx] as usize + depth;
            dict.get(start).copied()
        };
        // Binary search for the first position whose key >= byte (treating
        // "no byte" i.e. exhausted suffix as less than every byte).
        let mut a = lo;
        let mut b = hi;
        while a < b {
            let mid = a + (b - a) / 2;
            let k = key_at(mid);
            let less = match k {
                None => true,
                Some(kb) => kb < byte,
            };
            if less {
                a = mid + 1;
            } else {
                b = mid;
            }
        }
        let start = a;

        let mut a = start;
        let mut b = hi;
        while a < b {
            let mid = a + (b - a) / 2;
            let k = key_at(mid);
            let less_eq = match k {
                None => true,
                Some(kb) => kb <= byte,
            };
            if less_eq {
                a = mid + 1;
            } else {
                b = mid;
            }
        }
        (start, a)
    }

    /// Greedily factorizes `text` against `dict` (the same bytes the index
    /// was built from). Resolves multi-candidate ranges via `policy`.
    pub fn factorize(&self, text: &[u8], dict: &[u8], policy: FactorSelectionPolicy) -> Vec<Factor> {
        let mut out = Vec::new();
        let mut pos = 0usize;
        let n = self.sa.len();

        while pos < text.len() {
            let mut lo = 0usize;
            let mut hi = n;
            let mut len = 0usize;

            while pos + len < text.len() && lo < hi {
                let byte = text[pos + len];
                let (nlo, nhi) = self.narrow_range(dict, lo, hi, len, byte);
                if nlo >= nhi {
                    break;
                }
                lo = nlo;
                hi = nhi;
                len += 1;
            }

            if len == 0 {
                out.push(Factor::literal(text[pos]));
                pos += 1;
            } else {
                let offset = self.resolve_offset(lo, hi, policy);
                out.push(Factor::reference(offset, len as u32));
                pos += len;
            }
        }

        out
    }

    fn resolve_offset(&self, lo: usize, hi: usize, policy: FactorSelectionPolicy) -> u32 {
        debug_assert!(lo < hi);
        let candidates = &self.sa[lo..hi];
        let chosen = match policy {
            FactorSelectionPolicy::First => *candidates.iter().min().unwrap(),
            FactorSelectionPolicy::Random => {
                let idx = rand::thread_rng().gen_range(0..candidates.len());
                candidates[idx]
            }
            FactorSelectionPolicy::SuffixArraySample => candidates[candidates.len() / 2],
        };
        chosen as u32
    }
}
