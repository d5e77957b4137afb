//! Foundation types for Arbor, a structural deep-diff engine for JSON-like
//! documents.
//!
//! This crate provides the path and navigation primitives shared by the
//! matcher and comparator crates. Every other Arbor crate depends on
//! `arbor-types`.
//!
//! # Key Types
//!
//! - [`Pointer`] -- Structured slash-delimited path to a node (`/catalog/groups/0/id`)
//! - [`PointerPattern`] -- Condition pattern with `#` (index) and `*` (any segment) tokens
//! - [`TrackedElement`] -- Read-only view of a document node together with its pointer
//! - [`ElementKind`] -- Shape of a node: primitive, object, or array

pub mod element;
pub mod error;
pub mod pattern;
pub mod pointer;

pub use element::{leaf_count, ElementKind, TrackedElement};
pub use error::{PathError, PathResult, PatternError};
pub use pattern::{test_pointer_condition, PointerPattern};
pub use pointer::Pointer;
