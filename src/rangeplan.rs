//! Range algebra and the hash-range plan it builds.
//!
//! Kept independent of any one container format: [`StreamRange`],
//! [`invert`] and [`merge_neighbors`] know nothing about PE, so a sibling
//! parser for another signed-container format can reuse them to plan its
//! own digest ranges.

use std::vec::Vec;

/// A half-open `[position, position + size)` interval on some stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamRange {
    pub position: u64,
    pub size: u64,
}

impl StreamRange {
    pub fn new(position: u64, size: u64) -> Self {
        Self { position, size }
    }

    /// The exclusive end of this range.
    pub fn end(&self) -> u64 {
        self.position + self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// True iff `self` ends exactly where `other` begins.
    pub fn is_neighbor_of(&self, other: &StreamRange) -> bool {
        self.end() == other.position
    }
}

/// An ordered, non-overlapping, coalesced sequence of [`StreamRange`]
/// covering every byte that contributes to an image digest.
///
/// `reserved_a`/`reserved_b` exist purely for format-family uniformity with
/// sibling parsers that carry extra numeric slots in their own plans (e.g. a
/// page size or a segment count); PE never populates them, so both are
/// always zero here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashRangePlan {
    pub ranges: Vec<StreamRange>,
    pub reserved_a: u64,
    pub reserved_b: u64,
}

impl HashRangePlan {
    pub fn is_sorted_and_merged(&self) -> bool {
        self.ranges
            .windows(2)
            .all(|pair| pair[0].end() < pair[1].position)
    }
}

/// Given a universe `[0, universe_size)` and a sorted, non-overlapping set
/// of excluded ranges within it, produce the ordered, non-empty ranges that
/// partition the complement.
///
/// `excluded` must already be sorted ascending by `position` and
/// non-overlapping; this walks a single cursor through it rather than
/// re-validating that precondition.
pub fn invert(universe_size: u64, excluded: &[StreamRange]) -> Vec<StreamRange> {
    let mut included = Vec::with_capacity(excluded.len() + 1);
    let mut cursor = 0u64;

    for range in excluded {
        if range.position > cursor {
            included.push(StreamRange::new(cursor, range.position - cursor));
        }
        cursor = cursor.max(range.end());
    }

    if cursor < universe_size {
        included.push(StreamRange::new(cursor, universe_size - cursor));
    }

    included
}

/// Coalesce adjacent ranges (`a.end() == b.position`) in place. Does not
/// sort; the caller is responsible for ordering.
pub fn merge_neighbors(ranges: &mut Vec<StreamRange>) {
    let mut merged: Vec<StreamRange> = Vec::with_capacity(ranges.len());
    for range in ranges.drain(..) {
        match merged.last_mut() {
            Some(last) if last.is_neighbor_of(&range) => last.size += range.size,
            _ => merged.push(range),
        }
    }
    *ranges = merged;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_drops_empty_leading_and_trailing_gaps() {
        let excluded = [StreamRange::new(0, 10)];
        let included = invert(10, &excluded);
        assert!(included.is_empty());
    }

    #[test]
    fn invert_yields_complement() {
        let excluded = [StreamRange::new(4, 2), StreamRange::new(8, 1)];
        let included = invert(12, &excluded);
        assert_eq!(
            included,
            vec![
                StreamRange::new(0, 4),
                StreamRange::new(6, 2),
                StreamRange::new(9, 3),
            ]
        );
    }

    #[test]
    fn invert_is_self_inverse_modulo_merge() {
        let excluded = [StreamRange::new(4, 2), StreamRange::new(8, 1)];
        let included = invert(12, &excluded);
        let mut round_tripped = invert(12, &included);
        merge_neighbors(&mut round_tripped);

        let mut expected = excluded.to_vec();
        merge_neighbors(&mut expected);
        assert_eq!(round_tripped, expected);
    }

    #[test]
    fn merge_neighbors_coalesces_touching_ranges() {
        let mut ranges = vec![
            StreamRange::new(0, 4),
            StreamRange::new(4, 6),
            StreamRange::new(20, 5),
        ];
        merge_neighbors(&mut ranges);
        assert_eq!(
            ranges,
            vec![StreamRange::new(0, 10), StreamRange::new(20, 5)]
        );
    }

    #[test]
    fn merge_neighbors_leaves_gaps_alone() {
        let mut ranges = vec![StreamRange::new(0, 4), StreamRange::new(5, 6)];
        merge_neighbors(&mut ranges);
        assert_eq!(ranges.len(), 2);
    }
}
