//! Match results.

use serde::{Deserialize, Serialize};

/// The correspondence a matcher found between two ordered collections.
///
/// `matched` holds `(left, right)` index pairs in ascending left order; no
/// index appears twice on either side. The unmatched lists are ascending and
/// disjoint from the matched indices, so together they cover both sides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Matched `(left, right)` index pairs.
    pub matched: Vec<(usize, usize)>,
    /// Left indices with no partner.
    pub unmatched_left: Vec<usize>,
    /// Right indices with no partner.
    pub unmatched_right: Vec<usize>,
}

impl MatchReport {
    /// Build a report from a set of pairs over collections of the given sizes.
    ///
    /// Pairs are sorted by left index; indices not mentioned are unmatched.
    pub fn from_pairs(left_len: usize, right_len: usize, mut pairs: Vec<(usize, usize)>) -> Self {
        pairs.sort_unstable();
        let mut left_used = vec![false; left_len];
        let mut right_used = vec![false; right_len];
        for &(l, r) in &pairs {
            left_used[l] = true;
            right_used[r] = true;
        }
        Self {
            matched: pairs,
            unmatched_left: unused(&left_used),
            unmatched_right: unused(&right_used),
        }
    }

    /// A report in which nothing matched.
    pub fn unmatched(left_len: usize, right_len: usize) -> Self {
        Self::from_pairs(left_len, right_len, Vec::new())
    }

    /// Pair each index with the same index on the other side.
    pub fn positional(left_len: usize, right_len: usize) -> Self {
        let pairs = (0..left_len.min(right_len)).map(|i| (i, i)).collect();
        Self::from_pairs(left_len, right_len, pairs)
    }

    /// Returns `true` if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// Returns `true` if the report partitions both sides exactly once.
    pub fn is_partition(&self, left_len: usize, right_len: usize) -> bool {
        let mut left_seen = vec![0u32; left_len];
        let mut right_seen = vec![0u32; right_len];
        for &(l, r) in &self.matched {
            match (left_seen.get_mut(l), right_seen.get_mut(r)) {
                (Some(a), Some(b)) => {
                    *a += 1;
                    *b += 1;
                }
                _ => return false,
            }
        }
        for &l in &self.unmatched_left {
            match left_seen.get_mut(l) {
                Some(a) => *a += 1,
                None => return false,
            }
        }
        for &r in &self.unmatched_right {
            match right_seen.get_mut(r) {
                Some(b) => *b += 1,
                None => return false,
            }
        }
        left_seen.iter().chain(&right_seen).all(|&n| n == 1)
    }
}

fn unused(used: &[bool]) -> Vec<usize> {
    used.iter()
        .enumerate()
        .filter_map(|(i, &u)| (!u).then_some(i))
        .collect()
}
