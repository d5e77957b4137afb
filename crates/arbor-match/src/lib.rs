//! Array element matching for Arbor.
//!
//! Given two ordered collections, decide which left element corresponds to
//! which right element. The comparator uses these matchers before recursing
//! into matched pairs, so a reordered or edited element is reported as
//! changed instead of as a deletion plus an addition.
//!
//! # Key Types
//!
//! - [`MatchReport`] -- Matched index pairs plus unmatched indices on both sides
//! - [`ElementScorer`] / [`ScoreMode`] -- Literal or similarity scoring of two elements
//! - [`greedy_match`] -- First-best O(n·m) matcher driven by a score function
//! - [`assignment_match`] -- Globally optimal matcher with a quality gate
//! - [`CostMatrix`] / [`solve`] -- Hungarian (Munkres) minimum-cost assignment
//! - [`jaro_winkler`] -- Normalized string similarity

pub mod assignment;
pub mod error;
pub mod greedy;
pub mod munkres;
pub mod report;
pub mod scoring;
pub mod similarity;

pub use assignment::{assignment_match, PairCost, DEFAULT_REJECT_RATIO};
pub use error::{SolveError, SolveResult};
pub use greedy::{greedy_match, match_elements};
pub use munkres::{solve, Cell, CostMatrix};
pub use report::MatchReport;
pub use scoring::{ElementScorer, ScoreMode};
pub use similarity::{jaro, jaro_winkler};
