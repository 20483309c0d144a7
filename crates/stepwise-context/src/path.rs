//! Context paths
//!
//! A [`ContextPath`] addresses a value inside a context bucket: the first
//! segment picks a top-level key, the remaining segments walk nested objects
//! (or arrays, when the segment is a decimal index).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Parsed dotted path
///
/// `answers.items.0` has key `answers` and rest `["items", "0"]`. The empty
/// string parses to the root path, which addresses the whole bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContextPath(Vec<String>);

impl ContextPath {
    /// Path addressing the whole bucket
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// All segments, key first
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Top-level key; `None` for the root path
    #[inline]
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Segments below the top-level key
    #[inline]
    #[must_use]
    pub fn rest(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }
}

impl Display for ContextPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for ContextPath {
    type Err = PathError;

    /// Segments are trimmed; `a..b` is rejected, anything else non-empty is
    /// a valid segment
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        trimmed
            .split('.')
            .map(|segment| match segment.trim() {
                "" => Err(PathError::EmptySegment(trimmed.to_string())),
                segment => Ok(segment.to_string()),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// Malformed context path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Two dots with nothing between them
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),
}
