//! Structural diff engine for Arbor.
//!
//! Compares two JSON documents and produces a hierarchical change report.
//! Arrays are reconciled before recursion: each old element is paired with
//! the new element it most likely became, so reordered or edited elements
//! are reported as changes rather than as a deletion plus an addition.
//!
//! # Key Types
//!
//! - [`Comparator`] / [`compare`] -- Recursive document comparison
//! - [`DocumentComparison`] / [`Change`] / [`ArrayChange`] -- The change report
//! - [`DiffConfig`] / [`Constraint`] / [`MatchStrategy`] -- Per-location matching rules
//! - [`MatchCache`] -- Memoized array results keyed by pointer pairs

pub mod cache;
pub mod change;
pub mod comparator;
pub mod config;
pub mod error;

pub use cache::{CacheStats, CachedArray, MatchCache};
pub use change::{
    ArrayChange, ArrayItem, ArraySubElement, Change, DocumentComparison, MatchMethod,
};
pub use comparator::{compare, Comparator};
pub use config::{Constraint, DiffConfig, MatchStrategy, Rules};
pub use error::{ConfigError, DiffError, DiffResult};
