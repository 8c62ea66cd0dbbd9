//! `BlockCover`: one sampling block's entry in the lazy-greedy max-heap.
//!
//! Ordered by `val` (current marginal coverage gain), breaking ties toward
//! the smaller `id` for deterministic output regardless of heap internals.

use std::cmp::Ordering;
use std::collections::HashSet;

pub struct BlockCover {
    pub id: u64,
    pub val: u64,
    pub contents: HashSet<u64>,
}

impl PartialEq for BlockCover {
    fn eq(&self, other: &Self) -> bool {
        self.val == other.val && self.id == other.id
    }
}
impl Eq for BlockCover {}

impl PartialOrd for BlockCover {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BlockCover {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: higher val pops first; on a tie, the
        // *smaller* id should pop first, so it compares as "greater".
        self.val.cmp(&other.val).then_with(|| other.id.cmp(&self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn higher_val_pops_first() {
        let mut heap = BinaryHeap::new();
        heap.push(BlockCover { id: 0, val: 1, contents: HashSet::new() });
        heap.push(BlockCover { id: 1, val: 5, contents: HashSet::new() });
        heap.push(BlockCover { id: 2, val: 3, contents: HashSet::new() });
        assert_eq!(heap.pop().unwrap().id, 1);
        assert_eq!(heap.pop().unwrap().id, 2);
        assert_eq!(heap.pop().unwrap().id, 0);
    }

    #[test]
    fn tie_breaks_toward_smaller_id() {
        let mut heap = BinaryHeap::new();
        heap.push(BlockCover { id: 5, val: 7, contents: HashSet::new() });
        heap.push(BlockCover { id: 2, val: 7, contents: HashSet::new() });
        heap.push(BlockCover { id: 9, val: 7, contents: HashSet::new() });
        assert_eq!(heap.pop().unwrap().id, 2);
    }
}
