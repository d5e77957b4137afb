//! Tracked tree view: read-only navigation over a `serde_json::Value`.
//!
//! [`TrackedElement`] pairs a borrowed node with the [`Pointer`] at which it
//! was reached. The node's shape is classified once, at construction, into an
//! [`ElementKind`] so consumers can dispatch on it without re-inspecting the
//! value.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PathError, PathResult};
use crate::pattern::PointerPattern;
use crate::pointer::Pointer;

/// Shape of a document node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// String, number, boolean, or null.
    Primitive,
    /// Ordered mapping of member names to values.
    Object,
    /// Ordered sequence of values.
    Array,
}

impl ElementKind {
    /// Classify a raw value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            _ => Self::Primitive,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Primitive => "primitive",
            Self::Object => "object",
            Self::Array => "array",
        };
        f.write_str(name)
    }
}

/// Count the leaf values under `value`.
///
/// A primitive counts as one leaf. Objects and arrays contribute the sum of
/// their children, so empty containers count zero.
pub fn leaf_count(value: &Value) -> usize {
    match value {
        Value::Object(map) => map.values().map(leaf_count).sum(),
        Value::Array(items) => items.iter().map(leaf_count).sum(),
        _ => 1,
    }
}

/// An immutable view of one node in a document tree.
///
/// The document owns the data; a `TrackedElement` only borrows it and is
/// cheap to create whenever navigation needs one.
#[derive(Clone, PartialEq)]
pub struct TrackedElement<'a> {
    pointer: Pointer,
    raw: &'a Value,
    kind: ElementKind,
}

impl<'a> TrackedElement<'a> {
    /// Wrap a document root.
    pub fn root(raw: &'a Value) -> Self {
        Self::new(Pointer::root(), raw)
    }

    /// Wrap a node reached at `pointer`.
    pub fn new(pointer: Pointer, raw: &'a Value) -> Self {
        Self {
            pointer,
            kind: ElementKind::of(raw),
            raw,
        }
    }

    /// The pointer at which this node was reached.
    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    /// The underlying value.
    pub fn raw(&self) -> &'a Value {
        self.raw
    }

    /// The node's shape.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Returns `true` for strings, numbers, booleans, and null.
    pub fn is_primitive(&self) -> bool {
        self.kind == ElementKind::Primitive
    }

    /// The members, if this node is an object.
    pub fn as_object(&self) -> Option<&'a Map<String, Value>> {
        self.raw.as_object()
    }

    /// The items, if this node is an array.
    pub fn as_array(&self) -> Option<&'a [Value]> {
        self.raw.as_array().map(Vec::as_slice)
    }

    /// Number of immediate children (zero for primitives).
    pub fn len(&self) -> usize {
        match self.raw {
            Value::Object(map) => map.len(),
            Value::Array(items) => items.len(),
            _ => 0,
        }
    }

    /// Returns `true` if the node has no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Immediate children, each with its pointer extended by one segment.
    ///
    /// Objects yield members in insertion order, arrays in index order, and
    /// primitives yield nothing.
    pub fn children(&self) -> Vec<TrackedElement<'a>> {
        match self.raw {
            Value::Object(map) => map
                .iter()
                .map(|(name, value)| TrackedElement::new(self.pointer.child(name.as_str()), value))
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, value)| TrackedElement::new(self.pointer.index(i), value))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The named member of an object, if present.
    pub fn member(&self, name: &str) -> Option<TrackedElement<'a>> {
        let value = self.raw.as_object()?.get(name)?;
        Some(TrackedElement::new(self.pointer.child(name), value))
    }

    /// The item at `index` of an array, if present.
    pub fn item(&self, index: usize) -> Option<TrackedElement<'a>> {
        let value = self.raw.as_array()?.get(index)?;
        Some(TrackedElement::new(self.pointer.index(index), value))
    }

    /// Navigate one segment down.
    pub fn child(&self, segment: &str) -> PathResult<TrackedElement<'a>> {
        match self.raw {
            Value::Object(map) => match map.get(segment) {
                Some(value) => Ok(TrackedElement::new(self.pointer.child(segment), value)),
                None => Err(PathError::MissingMember {
                    at: self.pointer.clone(),
                    segment: segment.to_string(),
                }),
            },
            Value::Array(items) => {
                let index = parse_index(segment).ok_or_else(|| PathError::InvalidIndex {
                    at: self.pointer.clone(),
                    segment: segment.to_string(),
                })?;
                match items.get(index) {
                    Some(value) => Ok(TrackedElement::new(self.pointer.index(index), value)),
                    None => Err(PathError::IndexOutOfBounds {
                        at: self.pointer.clone(),
                        index,
                        len: items.len(),
                    }),
                }
            }
            _ => Err(PathError::TerminalNode {
                at: self.pointer.clone(),
                segment: segment.to_string(),
            }),
        }
    }

    /// Navigate every segment of `relative`, starting from this node.
    ///
    /// The returned element's pointer is this node's pointer joined with the
    /// navigated segments.
    pub fn resolve(&self, relative: &Pointer) -> PathResult<TrackedElement<'a>> {
        let mut current = self.clone();
        for segment in relative.segments() {
            current = current.child(segment)?;
        }
        Ok(current)
    }

    /// Number of leaf values under this node.
    pub fn leaf_count(&self) -> usize {
        leaf_count(self.raw)
    }

    /// Test this node's pointer against a condition pattern.
    pub fn matches_condition(&self, pattern: &PointerPattern) -> bool {
        pattern.matches(&self.pointer)
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

impl fmt::Debug for TrackedElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackedElement({} {})", self.kind, self.pointer)
    }
}
