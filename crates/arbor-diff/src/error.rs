//! Error types for the diff crate.

use arbor_match::SolveError;
use arbor_types::{ElementKind, PathError, PatternError, Pointer};

/// Errors that abort a comparison.
///
/// No partial result is returned when any of these occurs.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The two sides have incompatible shapes at the same logical position.
    #[error("type mismatch: {old_kind} at '{old_pointer}' cannot be compared with {new_kind} at '{new_pointer}'")]
    TypeMismatch {
        old_pointer: Pointer,
        new_pointer: Pointer,
        old_kind: ElementKind,
        new_kind: ElementKind,
    },

    /// A selection path did not resolve.
    #[error("path resolution failed: {0}")]
    Path(#[from] PathError),

    /// The assignment solver could not produce a matching.
    #[error("assignment failed: {0}")]
    Solve(#[from] SolveError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;

/// Errors raised while loading or validating a [`DiffConfig`](crate::DiffConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed into a configuration.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The JSON document could not be parsed into a configuration.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A pointer pattern did not compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] PatternError),

    /// The configuration parsed but holds an out-of-range value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
