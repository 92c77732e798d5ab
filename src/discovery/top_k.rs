//! Bounded top-K selection.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Keeps the `k` highest-scoring items seen so far.
///
/// Backed by a min-heap of at most `k` entries, so a stream of `n` items costs
/// O(n log k) time and O(k) space. Once full, a new item only displaces the
/// current minimum when its score is strictly greater; among equal scores the
/// earliest arrival stays.
#[derive(Debug)]
pub struct TopK<T> {
    capacity: usize,
    heap: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T> TopK<T> {
    /// The heap grows as items arrive; `capacity` is only an upper bound.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::new(),
        }
    }

    /// Offer an item. Returns `true` if it was kept.
    pub fn push(&mut self, score: u64, item: T) -> bool {
        if self.capacity == 0 {
            return false;
        }

        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(Entry { score, item }));
            return true;
        }

        let Some(mut min) = self.heap.peek_mut() else {
            return false;
        };
        if score > min.0.score {
            min.0 = Entry { score, item };
            true
        } else {
            false
        }
    }

    /// Lowest score currently kept.
    #[cfg(test)]
    fn min_score(&self) -> Option<u64> {
        self.heap.peek().map(|entry| entry.0.score)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drain into a list ordered by score, highest first.
    #[must_use]
    pub fn into_sorted_vec(self) -> Vec<(u64, T)> {
        // Ascending over Reverse is descending over scores
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(entry)| (entry.score, entry.item))
            .collect()
    }
}

/// Heap entry ordered by score alone; the item never takes part in comparisons.
#[derive(Debug)]
struct Entry<T> {
    score: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.cmp(&other.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_highest_scores() {
        let mut top = TopK::new(3);
        for (score, name) in [(5, "e"), (1, "a"), (9, "i"), (3, "c"), (7, "g")] {
            top.push(score, name);
        }

        let kept: Vec<_> = top.into_sorted_vec();
        assert_eq!(kept, vec![(9, "i"), (7, "g"), (5, "e")]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut top = TopK::new(0);
        assert!(!top.push(100, "x"));
        assert!(top.is_empty());
        assert!(top.into_sorted_vec().is_empty());
    }

    #[test]
    fn test_equal_score_does_not_displace() {
        let mut top = TopK::new(1);
        assert!(top.push(10, "first"));
        assert!(!top.push(10, "second"));
        assert!(top.push(11, "third"));
        assert_eq!(top.into_sorted_vec(), vec![(11, "third")]);
    }

    #[test]
    fn test_min_score_tracks_heap_floor() {
        let mut top = TopK::new(2);
        assert_eq!(top.min_score(), None);
        top.push(4, ());
        top.push(8, ());
        assert_eq!(top.min_score(), Some(4));
        top.push(6, ());
        assert_eq!(top.min_score(), Some(6));
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_unbounded_capacity_allocates_lazily() {
        let mut top = TopK::new(usize::MAX);
        assert!(top.push(3, "a"));
        assert!(top.push(1, "b"));
        assert_eq!(top.into_sorted_vec(), vec![(3, "a"), (1, "b")]);
    }

    #[test]
    fn test_large_stream_bounded() {
        let mut top = TopK::new(5);
        for i in 0..100_000u64 {
            // Scrambled order so the maximum is not simply the last item
            top.push((i * 7919) % 100_003, i);
        }
        let kept = top.into_sorted_vec();
        assert_eq!(kept.len(), 5);
        assert!(kept.windows(2).all(|w| w[0].0 >= w[1].0));
    }
}
