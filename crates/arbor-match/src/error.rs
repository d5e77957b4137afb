//! Error types for the matching crate.

/// Errors raised by the assignment solver.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SolveError {
    /// After padding, a row has no selectable cell.
    #[error("row {row} has only disallowed cells")]
    InfeasibleRow {
        /// Row index in the padded matrix.
        row: usize,
    },

    /// Cost adjustment found no selectable uncovered cell. The disallowed
    /// cells leave no complete assignment.
    #[error("assignment cannot make progress: no selectable uncovered cell remains")]
    NoProgress,

    /// A cost was NaN or infinite.
    #[error("cost at ({row}, {col}) is not finite")]
    NonFiniteCost { row: usize, col: usize },
}

/// Convenience alias for solver results.
pub type SolveResult<T> = Result<T, SolveError>;
