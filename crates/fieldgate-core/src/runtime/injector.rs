// crates/fieldgate-core/src/runtime/injector.rs
// ============================================================================
// Module: Value Injector
// Description: In-place writes and removals on the document under validation.
// Purpose: Let derivation keywords overwrite the data tree mid-traversal
//          while the traversal keeps a consistent view of it.
// Dependencies: crate::core::path, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! Derived values are written into the shared document while validation is
//! walking it. The traversal re-resolves its current path against the
//! document on every access, so a write made here is observed by subsequent
//! sibling and ancestor handlers with its new value and new type; no cursor
//! cache survives a mutation.
//!
//! Writes create intermediate object members on demand. Writing to an array
//! index equal to the length appends; writing beyond the length pads with
//! nulls first (null is the "unset" sentinel). Both operations mutate the
//! document in place; callers treat the root as mutable for the duration of
//! validation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::path::DataPath;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures while writing into the document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum InjectError {
    /// A path segment would descend through a scalar value.
    #[error("cannot write through scalar value at {pointer}")]
    Scalar {
        /// Canonical pointer of the scalar ancestor.
        pointer: String,
    },
    /// A segment applied to an array is not a decimal index.
    #[error("array segment is not an index at {pointer}")]
    Index {
        /// Canonical pointer of the offending location.
        pointer: String,
    },
}

// ============================================================================
// SECTION: Writes
// ============================================================================

/// Writes a derived value at `path`, transforming whatever is there now.
///
/// `transform` receives the current value (`None` when absent) and returns
/// the replacement. Missing intermediate containers are created as objects.
///
/// # Errors
/// Returns [`InjectError::Scalar`] when an existing scalar blocks descent
/// and [`InjectError::Index`] for non-numeric array segments.
pub fn set_value(
    document: &mut Value,
    path: &DataPath,
    transform: impl FnOnce(Option<Value>) -> Value,
) -> Result<(), InjectError> {
    let Some((last, ancestors)) = path.segments().split_last() else {
        let old = std::mem::take(document);
        *document = transform(some_unless_null(old));
        return Ok(());
    };
    let parent = descend_creating(document, ancestors, path)?;
    match parent {
        Value::Object(map) => {
            if let Some(existing) = map.get_mut(last) {
                let old = std::mem::take(existing);
                *existing = transform(some_unless_null(old));
            } else {
                map.insert(last.clone(), transform(None));
            }
            Ok(())
        }
        Value::Array(items) => {
            let index = last.parse::<usize>().map_err(|_| InjectError::Index {
                pointer: path.canonical(),
            })?;
            while items.len() < index {
                items.push(Value::Null);
            }
            if index == items.len() {
                items.push(transform(None));
            } else {
                let old = std::mem::take(&mut items[index]);
                items[index] = transform(some_unless_null(old));
            }
            Ok(())
        }
        _ => Err(InjectError::Scalar {
            pointer: path.canonical(),
        }),
    }
}

/// Removes the value at `path` entirely.
///
/// Object members are deleted, array elements are removed and later
/// elements shift down, and the root is replaced with null. Removing an
/// already-absent value is a no-op.
///
/// # Errors
/// Returns [`InjectError::Index`] for non-numeric array segments.
pub fn unset_value(document: &mut Value, path: &DataPath) -> Result<(), InjectError> {
    let Some((last, ancestors)) = path.segments().split_last() else {
        *document = Value::Null;
        return Ok(());
    };
    let Some(parent) = descend_existing(document, ancestors) else {
        return Ok(());
    };
    match parent {
        Value::Object(map) => {
            map.remove(last);
            Ok(())
        }
        Value::Array(items) => {
            let index = last.parse::<usize>().map_err(|_| InjectError::Index {
                pointer: path.canonical(),
            })?;
            if index < items.len() {
                items.remove(index);
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

// ============================================================================
// SECTION: Descent Helpers
// ============================================================================

/// Walks `segments`, creating missing object members along the way.
///
/// # Errors
/// Returns [`InjectError::Scalar`] when an existing non-container blocks
/// descent and [`InjectError::Index`] for non-numeric array segments.
fn descend_creating<'doc>(
    document: &'doc mut Value,
    segments: &[String],
    full_path: &DataPath,
) -> Result<&'doc mut Value, InjectError> {
    let mut current = document;
    for segment in segments {
        if current.is_null() {
            // Null is the unset sentinel; promote it to a fresh container.
            *current = Value::Object(serde_json::Map::new());
        }
        current = match current {
            Value::Object(map) => map.entry(segment.clone()).or_insert(Value::Null),
            Value::Array(items) => {
                let index = segment.parse::<usize>().map_err(|_| InjectError::Index {
                    pointer: full_path.canonical(),
                })?;
                while items.len() <= index {
                    items.push(Value::Null);
                }
                &mut items[index]
            }
            _ => {
                return Err(InjectError::Scalar {
                    pointer: full_path.canonical(),
                });
            }
        };
    }
    if current.is_null() {
        *current = Value::Object(serde_json::Map::new());
    }
    Ok(current)
}

/// Walks `segments` without creating anything; `None` when the walk dies.
fn descend_existing<'doc>(
    document: &'doc mut Value,
    segments: &[String],
) -> Option<&'doc mut Value> {
    let mut current = document;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => {
                let index = segment.parse::<usize>().ok()?;
                items.get_mut(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Wraps a pre-existing value, treating null as absent.
fn some_unless_null(value: Value) -> Option<Value> {
    if value.is_null() { None } else { Some(value) }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
