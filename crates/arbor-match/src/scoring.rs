//! Pairwise element scoring for the greedy matcher.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use arbor_types::{Pointer, TrackedElement};

use crate::similarity::jaro_winkler;

/// How two selected values are scored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    /// 1 for equal values, 0 otherwise.
    Literal,
    /// Jaro-Winkler similarity for strings; literal for everything else.
    Similarity,
}

/// Scores two elements by comparing the values selected by an optional
/// match property.
///
/// The property is a relative pointer (`id`, `meta/key`) resolved on each
/// element. Without a property the elements themselves are compared. If the
/// property does not resolve on either side, the pair scores 0.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementScorer {
    mode: ScoreMode,
    property: Option<Pointer>,
    case_sensitive: bool,
}

impl ElementScorer {
    /// A case-sensitive scorer.
    pub fn new(mode: ScoreMode, property: Option<Pointer>) -> Self {
        Self {
            mode,
            property,
            case_sensitive: true,
        }
    }

    /// Set whether string comparison is case-sensitive.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// The scoring mode.
    pub fn mode(&self) -> ScoreMode {
        self.mode
    }

    /// The match property, if any.
    pub fn property(&self) -> Option<&Pointer> {
        self.property.as_ref()
    }

    /// Score a pair in `[0, 1]`.
    pub fn score(&self, left: &TrackedElement<'_>, right: &TrackedElement<'_>) -> f64 {
        let (Some(a), Some(b)) = (self.select(left), self.select(right)) else {
            return 0.0;
        };
        match (self.mode, a, b) {
            (ScoreMode::Similarity, Value::String(x), Value::String(y)) => {
                if self.case_sensitive {
                    jaro_winkler(x, y)
                } else {
                    jaro_winkler(&x.to_lowercase(), &y.to_lowercase())
                }
            }
            _ => {
                if self.literal_eq(a, b) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    fn select<'a>(&self, element: &TrackedElement<'a>) -> Option<&'a Value> {
        match &self.property {
            None => Some(element.raw()),
            Some(property) => element.resolve(property).ok().map(|e| e.raw()),
        }
    }

    fn literal_eq(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::String(x), Value::String(y)) if !self.case_sensitive => {
                x.to_lowercase() == y.to_lowercase()
            }
            _ => a == b,
        }
    }
}
