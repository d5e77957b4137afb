//! Matching rules.
//!
//! A [`DiffConfig`] holds global defaults plus a list of [`Constraint`]s,
//! each bound to a [`PointerPattern`]. [`DiffConfig::rules_for`] folds the
//! constraints that match a pointer into the [`Rules`] in effect there.

use serde::{Deserialize, Serialize};

use arbor_match::{ScoreMode, DEFAULT_REJECT_RATIO};
use arbor_types::{Pointer, PointerPattern};

use crate::error::ConfigError;

/// How the elements of an array are paired before comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum MatchStrategy {
    /// Greedy matching on equal values of `property` (or whole elements).
    Literal {
        #[serde(default)]
        property: Option<Pointer>,
    },
    /// Greedy matching on Jaro-Winkler similarity of `property`.
    Similarity {
        #[serde(default)]
        property: Option<Pointer>,
    },
    /// Minimum-cost assignment over full pairwise comparisons.
    Assignment {
        /// Overrides [`DiffConfig::reject_ratio`] for this array.
        #[serde(default)]
        reject_ratio: Option<f64>,
    },
    /// Index `i` paired with index `i`.
    Positional,
}

/// Overrides applied to every node whose pointer matches `pattern`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constraint {
    pub pattern: PointerPattern,
    /// Higher priorities are consulted first.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub strategy: Option<MatchStrategy>,
    /// Child pointers to leave out of the comparison.
    #[serde(default)]
    pub ignore: Vec<PointerPattern>,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    #[serde(default)]
    pub min_confidence: Option<f64>,
    /// Relative pointer compared in place of each matched element.
    #[serde(default)]
    pub select: Option<Pointer>,
}

impl Constraint {
    /// A constraint with no overrides.
    pub fn new(pattern: PointerPattern) -> Self {
        Self {
            pattern,
            priority: 0,
            strategy: None,
            ignore: Vec::new(),
            case_sensitive: None,
            min_confidence: None,
            select: None,
        }
    }

    /// Compile `pattern` and build a constraint with no overrides.
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(PointerPattern::parse(pattern)?))
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_ignore(mut self, pattern: PointerPattern) -> Self {
        self.ignore.push(pattern);
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = Some(case_sensitive);
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    pub fn with_select(mut self, select: Pointer) -> Self {
        self.select = Some(select);
        self
    }
}

/// Configuration for a [`Comparator`](crate::Comparator).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    /// Per-location overrides.
    pub constraints: Vec<Constraint>,
    /// Child pointers ignored everywhere.
    pub ignore: Vec<PointerPattern>,
    /// Scoring modes tried by the object-array heuristic, in order.
    pub heuristic_modes: Vec<ScoreMode>,
    /// Ceiling on `cost / potential` for assignment-matched pairs.
    pub reject_ratio: f64,
    /// Minimum greedy score for a pair to be accepted.
    pub min_confidence: f64,
    /// Whether literal and similarity scoring respect case.
    pub case_sensitive: bool,
    /// Whether array results are memoized during a run.
    pub cache: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            constraints: Vec::new(),
            ignore: Vec::new(),
            heuristic_modes: vec![ScoreMode::Literal, ScoreMode::Similarity],
            reject_ratio: DEFAULT_REJECT_RATIO,
            min_confidence: 0.0,
            case_sensitive: true,
            cache: true,
        }
    }
}

impl DiffConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Add a constraint after the existing ones.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Check value ranges that the type system does not express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_ratio("reject_ratio", self.reject_ratio)?;
        check_confidence("min_confidence", self.min_confidence)?;
        for constraint in &self.constraints {
            let at = constraint.pattern.as_str();
            if let Some(value) = constraint.min_confidence {
                check_confidence(&format!("min_confidence for '{at}'"), value)?;
            }
            if let Some(MatchStrategy::Assignment {
                reject_ratio: Some(value),
            }) = constraint.strategy
            {
                check_ratio(&format!("reject_ratio for '{at}'"), value)?;
            }
        }
        Ok(())
    }

    /// Effective rules at `pointer`.
    ///
    /// Matching constraints are consulted in descending priority, ties in
    /// declaration order. The first constraint that sets a field decides it;
    /// ignore lists accumulate, after the global ones.
    pub fn rules_for(&self, pointer: &Pointer) -> Rules<'_> {
        let mut applying: Vec<&Constraint> = self
            .constraints
            .iter()
            .filter(|c| c.pattern.matches(pointer))
            .collect();
        applying.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut rules = Rules {
            strategy: None,
            select: None,
            ignore: self.ignore.iter().collect(),
            case_sensitive: self.case_sensitive,
            min_confidence: self.min_confidence,
        };
        let mut case_sensitive = None;
        let mut min_confidence = None;
        for constraint in applying {
            rules.strategy = rules.strategy.or(constraint.strategy.as_ref());
            rules.select = rules.select.or(constraint.select.as_ref());
            case_sensitive = case_sensitive.or(constraint.case_sensitive);
            min_confidence = min_confidence.or(constraint.min_confidence);
            rules.ignore.extend(&constraint.ignore);
        }
        rules.case_sensitive = case_sensitive.unwrap_or(rules.case_sensitive);
        rules.min_confidence = min_confidence.unwrap_or(rules.min_confidence);
        rules
    }
}

fn check_ratio(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be a positive number, got {value}")))
    }
}

fn check_confidence(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be within [0, 1], got {value}")))
    }
}

/// The overrides in effect at one pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct Rules<'c> {
    pub strategy: Option<&'c MatchStrategy>,
    pub select: Option<&'c Pointer>,
    pub ignore: Vec<&'c PointerPattern>,
    pub case_sensitive: bool,
    pub min_confidence: f64,
}

impl Rules<'_> {
    /// Returns `true` if `pointer` matches one of the ignore patterns.
    pub fn is_ignored(&self, pointer: &Pointer) -> bool {
        self.ignore.iter().any(|pattern| pattern.matches(pointer))
    }
}
