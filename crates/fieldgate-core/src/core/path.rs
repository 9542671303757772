// crates/fieldgate-core/src/core/path.rs
// ============================================================================
// Module: Data Paths
// Description: Segment-based document locations with JSON Pointer parse and
//              render forms, plus reference pointers used by variables.
// Purpose: Locate values in the document under validation and resolve
//          absolute or relative reference pointers against the cursor.
// Dependencies: serde, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! A [`DataPath`] names one location in the document being validated: the
//! ordered list of segments walked from the root, where each segment is an
//! object member name or an array index. Paths render as JSON Pointer strings
//! (RFC 6901 escaping) and are the keys of every path-indexed structure in
//! this crate. Segments are stored as raw strings; whether a segment selects
//! a member or an index is decided by the container it is applied to, so
//! numeric member names still resolve correctly.
//!
//! A [`ValueReference`] is the parse form used by path-reference variables:
//! either an absolute pointer resolved from the document root, or a relative
//! pointer (`N` or `N/seg/...`) that climbs `N` levels from the current
//! location before descending.
//!
//! Invariants:
//! - The canonical form of the root path is the empty string.
//! - `parse_absolute` and [`DataPath::canonical`] round-trip for every path.
//! - Lookup never panics; missing members and mismatched containers yield
//!   `None`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced while parsing or resolving pointers.
///
/// Variants are stable for programmatic handling.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PathError {
    /// Pointer text is neither empty nor `/`-prefixed.
    #[error("pointer must be empty or start with '/': {pointer}")]
    NotAbsolute {
        /// Offending pointer text.
        pointer: String,
    },
    /// Pointer segment contains a `~` escape other than `~0` or `~1`.
    #[error("invalid escape sequence in pointer: {pointer}")]
    Escape {
        /// Offending pointer text.
        pointer: String,
    },
    /// Relative pointer does not start with a decimal level count.
    #[error("relative pointer is missing its leading level count: {pointer}")]
    LevelCount {
        /// Offending pointer text.
        pointer: String,
    },
    /// Relative pointer climbs above the document root.
    #[error("relative pointer climbs {levels} levels from depth {depth}")]
    AboveRoot {
        /// Levels the pointer climbs.
        levels: usize,
        /// Depth of the location it was resolved against.
        depth: usize,
    },
}

// ============================================================================
// SECTION: Data Path
// ============================================================================

/// Location of one value in the document under validation.
///
/// # Invariants
/// - Segments are stored unescaped; escaping is applied only when rendering
///   the canonical JSON Pointer form.
/// - An empty segment list denotes the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DataPath {
    /// Unescaped segments from the document root.
    segments: Vec<String>,
}

impl DataPath {
    /// Returns the document-root path.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parses an absolute JSON Pointer (`""` or `/a/0/b~0c`).
    ///
    /// # Errors
    /// Returns [`PathError::NotAbsolute`] for non-empty text without a
    /// leading `/`, and [`PathError::Escape`] for malformed `~` escapes.
    pub fn parse_absolute(pointer: &str) -> Result<Self, PathError> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(PathError::NotAbsolute {
                pointer: pointer.to_string(),
            });
        };
        let mut segments = Vec::new();
        for raw in rest.split('/') {
            segments.push(unescape_segment(raw).ok_or_else(|| PathError::Escape {
                pointer: pointer.to_string(),
            })?);
        }
        Ok(Self {
            segments,
        })
    }

    /// Appends an object member name.
    pub fn push_member(&mut self, name: &str) {
        self.segments.push(name.to_string());
    }

    /// Appends an array index.
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(index.to_string());
    }

    /// Removes the last segment, if any.
    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` when the path denotes the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the unescaped segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Renders the canonical JSON Pointer form (`""` for the root).
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut rendered = String::new();
        for segment in &self.segments {
            rendered.push('/');
            rendered.push_str(&escape_segment(segment));
        }
        rendered
    }

    /// Returns a copy of this path with `segment` appended as a member name.
    #[must_use]
    pub fn child_member(&self, name: &str) -> Self {
        let mut child = self.clone();
        child.push_member(name);
        child
    }

    /// Returns a copy of this path with `index` appended.
    #[must_use]
    pub fn child_index(&self, index: usize) -> Self {
        let mut child = self.clone();
        child.push_index(index);
        child
    }

    /// Resolves this path against a document root.
    ///
    /// Returns `None` when any segment is missing or applied to a scalar.
    /// Array segments must parse as decimal indices; object segments are
    /// member names.
    #[must_use]
    pub fn lookup<'doc>(&self, root: &'doc Value) -> Option<&'doc Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.canonical())
    }
}

impl From<DataPath> for String {
    fn from(path: DataPath) -> Self {
        path.canonical()
    }
}

impl TryFrom<String> for DataPath {
    type Error = PathError;

    fn try_from(pointer: String) -> Result<Self, Self::Error> {
        Self::parse_absolute(&pointer)
    }
}

// ============================================================================
// SECTION: Value References
// ============================================================================

/// Parse form of a path-reference variable target.
///
/// # Invariants
/// - `Absolute` always resolves from the document root.
/// - `Relative` climbs `up` levels from the full current path before
///   descending along `down`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueReference {
    /// Pointer resolved from the document root.
    Absolute(DataPath),
    /// Pointer resolved against the current traversal location.
    Relative {
        /// Levels to climb from the current location.
        up: usize,
        /// Segments to descend after climbing.
        down: DataPath,
    },
}

impl ValueReference {
    /// Parses reference text in absolute (`""`, `/a/b`) or relative
    /// (`N`, `N/a/b`) pointer form.
    ///
    /// # Errors
    /// Returns [`PathError::LevelCount`] when relative text lacks a decimal
    /// level count and [`PathError::Escape`] for malformed segments.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        if text.is_empty() || text.starts_with('/') {
            return DataPath::parse_absolute(text).map(Self::Absolute);
        }
        let digits_end = text.find(|ch: char| !ch.is_ascii_digit()).unwrap_or(text.len());
        let (digits, rest) = text.split_at(digits_end);
        let up = digits.parse::<usize>().map_err(|_| PathError::LevelCount {
            pointer: text.to_string(),
        })?;
        let down = if rest.is_empty() {
            DataPath::root()
        } else if rest.starts_with('/') {
            DataPath::parse_absolute(rest)?
        } else {
            return Err(PathError::LevelCount {
                pointer: text.to_string(),
            });
        };
        Ok(Self::Relative {
            up,
            down,
        })
    }

    /// Resolves the reference to an absolute path, using `current` as the
    /// traversal location for relative forms.
    ///
    /// # Errors
    /// Returns [`PathError::AboveRoot`] when a relative reference climbs
    /// more levels than `current` has.
    pub fn resolve(&self, current: &DataPath) -> Result<DataPath, PathError> {
        match self {
            Self::Absolute(path) => Ok(path.clone()),
            Self::Relative {
                up,
                down,
            } => {
                let depth = current.depth();
                if *up > depth {
                    return Err(PathError::AboveRoot {
                        levels: *up,
                        depth,
                    });
                }
                let mut segments: Vec<String> =
                    current.segments()[..depth - up].to_vec();
                segments.extend(down.segments().iter().cloned());
                Ok(DataPath {
                    segments,
                })
            }
        }
    }
}

impl fmt::Display for ValueReference {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(path) => write!(formatter, "{}", path.canonical()),
            Self::Relative {
                up,
                down,
            } => write!(formatter, "{up}{}", down.canonical()),
        }
    }
}

// ============================================================================
// SECTION: Segment Escaping
// ============================================================================

/// Applies RFC 6901 escaping to one segment.
fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Reverses RFC 6901 escaping; `None` for malformed `~` sequences.
fn unescape_segment(raw: &str) -> Option<String> {
    let mut unescaped = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '~' {
            match chars.next() {
                Some('0') => unescaped.push('~'),
                Some('1') => unescaped.push('/'),
                _ => return None,
            }
        } else {
            unescaped.push(ch);
        }
    }
    Some(unescaped)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use serde_json::json;

    use super::DataPath;
    use super::PathError;
    use super::ValueReference;

    #[test]
    fn canonical_round_trips_escaped_segments() {
        let mut path = DataPath::root();
        path.push_member("a/b");
        path.push_member("c~d");
        let canonical = path.canonical();
        assert_eq!(canonical, "/a~1b/c~0d");
        let parsed = DataPath::parse_absolute(&canonical).unwrap();
        assert_eq!(parsed, path);
    }

    #[test]
    fn root_renders_empty() {
        assert_eq!(DataPath::root().canonical(), "");
        assert!(DataPath::parse_absolute("").unwrap().is_root());
    }

    #[test]
    fn lookup_distinguishes_members_and_indices() {
        let doc = json!({"items": [{"price": 5}], "0": "member"});
        let nested = DataPath::parse_absolute("/items/0/price").unwrap();
        assert_eq!(nested.lookup(&doc), Some(&json!(5)));
        let numeric_member = DataPath::parse_absolute("/0").unwrap();
        assert_eq!(numeric_member.lookup(&doc), Some(&json!("member")));
        let missing = DataPath::parse_absolute("/items/7").unwrap();
        assert_eq!(missing.lookup(&doc), None);
    }

    #[test]
    fn relative_reference_climbs_and_descends() {
        let current = DataPath::parse_absolute("/order/lines/2/price").unwrap();
        let reference = ValueReference::parse("1/qty").unwrap();
        let resolved = reference.resolve(&current).unwrap();
        assert_eq!(resolved.canonical(), "/order/lines/2/qty");
    }

    #[test]
    fn relative_reference_above_root_is_reported() {
        let current = DataPath::parse_absolute("/a").unwrap();
        let reference = ValueReference::parse("3/b").unwrap();
        let err = reference.resolve(&current).unwrap_err();
        assert!(matches!(err, PathError::AboveRoot { levels: 3, depth: 1 }));
    }

    #[test]
    fn malformed_pointers_are_rejected() {
        assert!(DataPath::parse_absolute("a/b").is_err());
        assert!(DataPath::parse_absolute("/a~2b").is_err());
        assert!(ValueReference::parse("x/a").is_err());
    }
}
