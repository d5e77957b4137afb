//! Document pointers.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Path from a document root to one of its nodes.
///
/// A `Pointer` is stored as a sequence of unescaped segments and displayed as
/// a slash-delimited string: `/catalog/groups/0/id`. The root pointer has no
/// segments and displays as the empty string.
///
/// Segments containing `~` or `/` are escaped as `~0` and `~1` when displayed
/// and unescaped when parsed, so member names may contain either character.
///
/// Ordering is lexicographic over segments. Every strict descendant of a
/// pointer `p` therefore sorts after `p` and before any pointer that does not
/// start with `p`, which lets ordered maps scan descendants as one range.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer(Vec<String>);

impl Pointer {
    /// The root pointer (no segments).
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a pointer from already-unescaped segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a pointer string.
    ///
    /// A leading `/` is optional, so relative pointers such as `meta/id` parse
    /// into the same segments as `/meta/id`. The empty string is the root.
    pub fn parse(s: &str) -> Self {
        if s.is_empty() {
            return Self::root();
        }
        let body = s.strip_prefix('/').unwrap_or(s);
        Self(body.split('/').map(unescape).collect())
    }

    /// Returns `true` for the root pointer.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the pointer has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The unescaped segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The last segment, or `None` for the root.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// The parent pointer, or `None` for the root.
    pub fn parent(&self) -> Option<Pointer> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// A new pointer extended by one segment.
    pub fn child(&self, segment: impl Into<String>) -> Pointer {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(segment.into());
        Self(segments)
    }

    /// A new pointer extended by one array index segment.
    pub fn index(&self, index: usize) -> Pointer {
        self.child(index.to_string())
    }

    /// A new pointer extended by every segment of `relative`.
    pub fn join(&self, relative: &Pointer) -> Pointer {
        let mut segments = self.0.clone();
        segments.extend(relative.0.iter().cloned());
        Self(segments)
    }

    /// The pointer without its leading slash (`meta/id`), as written for
    /// relative selections.
    pub fn to_relative_string(&self) -> String {
        self.0.iter().map(|s| escape(s)).collect::<Vec<_>>().join("/")
    }

    /// Returns `true` if `prefix` is equal to this pointer or one of its ancestors.
    pub fn starts_with(&self, prefix: &Pointer) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Returns `true` if this pointer lies strictly below `ancestor`.
    ///
    /// Equivalent to testing `self` as a string for the prefix `ancestor + "/"`.
    pub fn is_strict_descendant_of(&self, ancestor: &Pointer) -> bool {
        self.0.len() > ancestor.0.len() && self.starts_with(ancestor)
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", escape(segment))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pointer({self})")
    }
}

impl FromStr for Pointer {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Pointer {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl Serialize for Pointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}
