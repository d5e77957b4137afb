//! The change model produced by a comparison.
//!
//! A [`DocumentComparison`] holds an ordered list of [`Change`] records.
//! Array changes nest: each matched pair of elements carries its own change
//! list, so the report mirrors the shape of the documents.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use arbor_types::{leaf_count, Pointer};

/// How the elements of an array were paired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Greedy matching on equal values.
    Literal,
    /// Greedy matching on string similarity.
    Similarity,
    /// Minimum-cost assignment with a quality gate.
    Assignment,
    /// Index `i` paired with index `i`.
    Positional,
    /// No strategy applied; every element is added or removed.
    Unmatched,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Literal => "literal",
            Self::Similarity => "similarity",
            Self::Assignment => "assignment",
            Self::Positional => "positional",
            Self::Unmatched => "unmatched",
        };
        f.write_str(name)
    }
}

/// One element that exists on only one side of an array comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrayItem {
    /// Index within its own array.
    pub index: usize,
    /// Pointer of the element in its own document.
    pub pointer: Pointer,
    /// The element's value.
    pub element: Value,
}

/// A matched pair of array elements and the changes between them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArraySubElement {
    pub old_index: usize,
    pub new_index: usize,
    pub old_pointer: Pointer,
    pub new_pointer: Pointer,
    pub changes: Vec<Change>,
}

/// Array-level change record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrayChange {
    pub old_pointer: Pointer,
    pub new_pointer: Pointer,
    /// Right-only elements, in right index order.
    pub added_items: Vec<ArrayItem>,
    /// Left-only elements, in left index order.
    pub removed_items: Vec<ArrayItem>,
    /// Matched pairs that carry nested changes, in left index order.
    pub sub_changes: Vec<ArraySubElement>,
    /// Matched pairs compared through a selection path.
    pub out_of_tree: Vec<ArraySubElement>,
    /// Every matched `(old, new)` index pair, changed or not.
    pub matched_indices: Vec<(usize, usize)>,
    /// Member the matcher keyed on, if any.
    pub match_property: Option<String>,
    pub match_method: MatchMethod,
}

impl ArrayChange {
    /// An array change with no content yet.
    pub fn new(
        old_pointer: Pointer,
        new_pointer: Pointer,
        match_method: MatchMethod,
        match_property: Option<String>,
    ) -> Self {
        Self {
            old_pointer,
            new_pointer,
            added_items: Vec::new(),
            removed_items: Vec::new(),
            sub_changes: Vec::new(),
            out_of_tree: Vec::new(),
            matched_indices: Vec::new(),
            match_property,
            match_method,
        }
    }

    /// Returns `true` if nothing was added, removed, or changed.
    pub fn is_empty(&self) -> bool {
        self.added_items.is_empty()
            && self.removed_items.is_empty()
            && self.sub_changes.is_empty()
            && self.out_of_tree.is_empty()
    }

    fn nested(&self) -> impl Iterator<Item = &Change> {
        self.sub_changes
            .iter()
            .chain(&self.out_of_tree)
            .flat_map(|sub| sub.changes.iter())
    }
}

/// A single difference between two documents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    /// A member exists only in the new document.
    PropertyAdded {
        pointer: Pointer,
        parent: Pointer,
        value: Value,
    },
    /// A member exists only in the old document.
    PropertyDeleted {
        pointer: Pointer,
        parent: Pointer,
        value: Value,
    },
    /// A primitive value differs at the same logical position.
    PropertyChanged {
        old_pointer: Pointer,
        new_pointer: Pointer,
        old_value: Value,
        new_value: Value,
    },
    /// An array's elements were added, removed, or changed.
    ArrayChanged(ArrayChange),
}

impl Change {
    /// The pointer that best locates the change in the new document, or in
    /// the old one for deletions.
    pub fn pointer(&self) -> &Pointer {
        match self {
            Self::PropertyAdded { pointer, .. } | Self::PropertyDeleted { pointer, .. } => pointer,
            Self::PropertyChanged { new_pointer, .. } => new_pointer,
            Self::ArrayChanged(array) => &array.new_pointer,
        }
    }

    /// Leaf values present only on the new side, counted through nested changes.
    pub fn added_leaves(&self) -> usize {
        match self {
            Self::PropertyAdded { value, .. } => leaf_count(value),
            Self::PropertyDeleted { .. } | Self::PropertyChanged { .. } => 0,
            Self::ArrayChanged(array) => {
                array
                    .added_items
                    .iter()
                    .map(|item| leaf_count(&item.element))
                    .sum::<usize>()
                    + array.nested().map(Change::added_leaves).sum::<usize>()
            }
        }
    }

    /// Leaf values present only on the old side, counted through nested changes.
    pub fn removed_leaves(&self) -> usize {
        match self {
            Self::PropertyDeleted { value, .. } => leaf_count(value),
            Self::PropertyAdded { .. } | Self::PropertyChanged { .. } => 0,
            Self::ArrayChanged(array) => {
                array
                    .removed_items
                    .iter()
                    .map(|item| leaf_count(&item.element))
                    .sum::<usize>()
                    + array.nested().map(Change::removed_leaves).sum::<usize>()
            }
        }
    }
}

/// The result of comparing two labelled documents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentComparison {
    pub old_label: String,
    pub new_label: String,
    /// Top-level changes in traversal order.
    pub changes: Vec<Change>,
    /// Total change magnitude.
    pub score: usize,
}

impl DocumentComparison {
    /// Returns `true` if the documents are equivalent.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of top-level changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Number of top-level added members.
    pub fn additions(&self) -> usize {
        self.count(|c| matches!(c, Change::PropertyAdded { .. }))
    }

    /// Number of top-level deleted members.
    pub fn deletions(&self) -> usize {
        self.count(|c| matches!(c, Change::PropertyDeleted { .. }))
    }

    /// Number of top-level changed primitives.
    pub fn modifications(&self) -> usize {
        self.count(|c| matches!(c, Change::PropertyChanged { .. }))
    }

    /// Number of top-level array changes.
    pub fn array_changes(&self) -> usize {
        self.count(|c| matches!(c, Change::ArrayChanged(_)))
    }

    /// Leaf values only in the new document, across the whole report.
    pub fn added_leaves(&self) -> usize {
        self.changes.iter().map(Change::added_leaves).sum()
    }

    /// Leaf values only in the old document, across the whole report.
    pub fn removed_leaves(&self) -> usize {
        self.changes.iter().map(Change::removed_leaves).sum()
    }

    fn count(&self, pred: impl Fn(&Change) -> bool) -> usize {
        self.changes.iter().filter(|c| pred(c)).count()
    }
}
