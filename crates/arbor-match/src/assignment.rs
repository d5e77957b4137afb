//! Globally optimal matching on top of the assignment solver.
//!
//! The caller supplies, for every left/right pair, the change magnitude the
//! pair would produce if compared (`cost`) and the magnitude that would mean
//! "nothing in common" (`potential`). The solver minimizes total cost, which
//! always yields a complete pairing, so pairs whose `cost / potential`
//! exceeds the reject ratio are dropped afterwards and both sides reported
//! as unmatched.
//!
//! A pair the caller reports as incompatible (`None`) is given a penalty
//! cost above every compatible cost and is never accepted.

use tracing::debug;

use crate::error::SolveError;
use crate::munkres::{solve, Cell, CostMatrix};
use crate::report::MatchReport;

/// Default ceiling on `cost / potential` for an accepted pair.
pub const DEFAULT_REJECT_RATIO: f64 = 0.95;

/// Cost of pairing one left element with one right element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairCost {
    /// Change magnitude produced by comparing the pair.
    pub cost: f64,
    /// Largest magnitude the pair could produce.
    pub potential: f64,
}

impl PairCost {
    /// Returns `true` if the pair is close enough to keep.
    ///
    /// A pair with zero potential is kept only when its cost is also zero.
    pub fn is_acceptable(&self, reject_ratio: f64) -> bool {
        if self.potential <= 0.0 {
            return self.cost <= 0.0;
        }
        self.cost / self.potential <= reject_ratio
    }
}

/// Match `left_len` against `right_len` items by minimum total cost.
///
/// `pair_cost` is evaluated once per cell and returns `None` for pairs that
/// can never match. Errors from it are passed through unchanged; solver
/// failures are converted with `From<SolveError>`.
pub fn assignment_match<E, F>(
    left_len: usize,
    right_len: usize,
    reject_ratio: f64,
    mut pair_cost: F,
) -> Result<MatchReport, E>
where
    E: From<SolveError>,
    F: FnMut(usize, usize) -> Result<Option<PairCost>, E>,
{
    let mut costs = Vec::with_capacity(left_len * right_len);
    for l in 0..left_len {
        for r in 0..right_len {
            costs.push(pair_cost(l, r)?);
        }
    }

    let penalty = costs
        .iter()
        .flatten()
        .map(|c| c.cost)
        .fold(0.0, f64::max)
        + 1.0;
    let matrix = CostMatrix::from_fn(left_len, right_len, |l, r| {
        Cell::Cost(costs[l * right_len + r].map_or(penalty, |c| c.cost))
    });
    let solution = solve(&matrix)?;

    let accepted: Vec<(usize, usize)> = solution
        .into_iter()
        .filter(|&(l, r)| {
            costs[l * right_len + r].is_some_and(|c| c.is_acceptable(reject_ratio))
        })
        .collect();

    debug!(
        left = left_len,
        right = right_len,
        accepted = accepted.len(),
        reject_ratio,
        "assignment matching complete"
    );
    Ok(MatchReport::from_pairs(left_len, right_len, accepted))
}
