//! Pointer condition patterns.
//!
//! A pattern is written like a pointer, with two wildcard tokens:
//!
//! - `#` matches one segment made of one or more ASCII digits (an array index)
//! - `*` matches any single segment
//!
//! A pattern with a leading `/` is anchored at the document root and must
//! match the whole pointer. A pattern without one matches any trailing
//! sub-path, so `items/#/id` matches `/catalog/items/3/id`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PatternError;
use crate::pointer::Pointer;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Literal(String),
    Digits,
    Any,
}

impl Token {
    fn matches(&self, segment: &str) -> bool {
        match self {
            Token::Literal(expected) => expected == segment,
            Token::Digits => !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()),
            Token::Any => true,
        }
    }
}

/// A compiled pointer condition.
#[derive(Clone, PartialEq, Eq)]
pub struct PointerPattern {
    source: String,
    anchored: bool,
    tokens: Vec<Token>,
}

impl PointerPattern {
    /// Compile a pattern string.
    ///
    /// The empty pattern and `/` both match only the root pointer.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() || pattern == "/" {
            return Ok(Self {
                source: pattern.to_string(),
                anchored: true,
                tokens: Vec::new(),
            });
        }

        let anchored = pattern.starts_with('/');
        let body = pattern.strip_prefix('/').unwrap_or(pattern);

        let mut tokens = Vec::new();
        for segment in body.split('/') {
            let token = match segment {
                "" => {
                    return Err(PatternError::EmptySegment {
                        pattern: pattern.to_string(),
                    })
                }
                "#" => Token::Digits,
                "*" => Token::Any,
                literal => Token::Literal(literal.replace("~1", "/").replace("~0", "~")),
            };
            tokens.push(token);
        }

        Ok(Self {
            source: pattern.to_string(),
            anchored,
            tokens,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if the pattern is anchored at the document root.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Test a pointer against this pattern.
    pub fn matches(&self, pointer: &Pointer) -> bool {
        let segments = pointer.segments();
        if self.anchored {
            return segments.len() == self.tokens.len() && self.matches_at(segments);
        }
        if segments.len() < self.tokens.len() {
            return false;
        }
        // Only the alignment ending at the last segment can match a suffix.
        self.matches_at(&segments[segments.len() - self.tokens.len()..])
    }

    fn matches_at(&self, segments: &[String]) -> bool {
        self.tokens
            .iter()
            .zip(segments)
            .all(|(token, segment)| token.matches(segment))
    }
}

/// Test a pointer string against a pattern string.
///
/// An invalid pattern never matches.
pub fn test_pointer_condition(pointer: &str, pattern: &str) -> bool {
    PointerPattern::parse(pattern)
        .map(|p| p.matches(&Pointer::parse(pointer)))
        .unwrap_or(false)
}

impl fmt::Debug for PointerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PointerPattern({})", self.source)
    }
}

impl fmt::Display for PointerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for PointerPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for PointerPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
