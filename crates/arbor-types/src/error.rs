use thiserror::Error;

use crate::pointer::Pointer;

/// Errors produced while navigating a document with a [`Pointer`].
///
/// Every variant carries the pointer of the node where navigation stopped,
/// not the pointer that was requested.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("object at '{at}' has no member '{segment}'")]
    MissingMember { at: Pointer, segment: String },

    #[error("index {index} out of bounds for array of length {len} at '{at}'")]
    IndexOutOfBounds { at: Pointer, index: usize, len: usize },

    #[error("segment '{segment}' is not a valid array index at '{at}'")]
    InvalidIndex { at: Pointer, segment: String },

    #[error("cannot resolve '{segment}' below primitive value at '{at}'")]
    TerminalNode { at: Pointer, segment: String },
}

/// Errors produced while parsing a [`PointerPattern`](crate::PointerPattern).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern '{pattern}' contains an empty segment")]
    EmptySegment { pattern: String },
}

/// Convenience alias for navigation results.
pub type PathResult<T> = Result<T, PathError>;
