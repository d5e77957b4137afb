//! Greedy first-best matcher.
//!
//! Each left element, in order, takes the not-yet-taken right element with
//! the strictly highest score; the first candidate wins ties and a perfect
//! score ends the scan early. The result is not globally optimal, but costs
//! only O(n·m) score evaluations.

use arbor_types::TrackedElement;

use crate::report::MatchReport;
use crate::scoring::ElementScorer;

/// Match `left_len` against `right_len` items using `score(left, right)`.
///
/// A left item stays unmatched unless its best score is greater than zero
/// and at least `min_confidence`.
pub fn greedy_match<F>(
    left_len: usize,
    right_len: usize,
    min_confidence: f64,
    mut score: F,
) -> MatchReport
where
    F: FnMut(usize, usize) -> f64,
{
    let mut taken = vec![false; right_len];
    let mut pairs = Vec::new();

    for l in 0..left_len {
        let mut best: Option<(usize, f64)> = None;
        for r in (0..right_len).filter(|&r| !taken[r]) {
            let s = score(l, r);
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((r, s));
            }
            if s >= 1.0 {
                break;
            }
        }

        if let Some((r, s)) = best {
            if s > 0.0 && s >= min_confidence {
                taken[r] = true;
                pairs.push((l, r));
            }
        }
    }

    MatchReport::from_pairs(left_len, right_len, pairs)
}

/// Match two element slices with an [`ElementScorer`].
pub fn match_elements(
    left: &[TrackedElement<'_>],
    right: &[TrackedElement<'_>],
    scorer: &ElementScorer,
    min_confidence: f64,
) -> MatchReport {
    greedy_match(left.len(), right.len(), min_confidence, |l, r| {
        scorer.score(&left[l], &right[r])
    })
}
