// crates/fieldgate-core/src/core/collector.rs
// ============================================================================
// Module: Error Collector
// Description: Path-indexed store of validation errors with a leaf view.
// Purpose: Let path-reference variables and limit rules observe where
//          individual failures occurred during the current validation call.
// Dependencies: crate::core::{error, path}, serde_json.
// ============================================================================

//! ## Overview
//! The collector indexes every recorded validation error by the canonical
//! pointer of the value it blames, alongside a parallel index of leaf errors.
//! Aggregate errors (the `schema` wrapper and fan-out nodes) are expanded so
//! the index reflects where each individual failure actually occurred; the
//! aggregate itself is also indexed at its own path.
//!
//! One collector lives for one top-level validation call. Speculative
//! sub-validations (condition schemas, `anyOf` branches) clone the collector
//! and restore the original afterwards so their side effects never land in
//! the real index.
//!
//! Invariants:
//! - Every indexed path maps to a non-empty error list.
//! - An error is a leaf iff it has no sub-errors or its keyword is in the
//!   extra-leaf set.
//! - Recording the same error at the same path twice is a no-op.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::core::error::ValidationError;
use crate::core::path::DataPath;

// ============================================================================
// SECTION: Error Collector
// ============================================================================

/// Path-indexed store of validation errors for one validation call.
///
/// # Invariants
/// - `leaf_errors_by_path` is always a subset view of `errors_by_path`.
/// - Lists are non-empty; a path with no errors has no entry.
#[derive(Debug, Clone)]
pub struct ErrorCollector {
    /// Every recorded error, keyed by canonical pointer.
    errors_by_path: BTreeMap<String, Vec<ValidationError>>,
    /// Errors considered atomic, keyed by canonical pointer.
    leaf_errors_by_path: BTreeMap<String, Vec<ValidationError>>,
    /// Keywords treated as leaves despite carrying sub-errors.
    extra_leaf_keywords: BTreeSet<String>,
}

impl Default for ErrorCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorCollector {
    /// Constructs an empty collector with the default extra-leaf set
    /// (`anyOf` and `oneOf`, whose sub-errors describe rejected
    /// alternatives rather than independent failures).
    #[must_use]
    pub fn new() -> Self {
        let mut extra_leaf_keywords = BTreeSet::new();
        extra_leaf_keywords.insert("anyOf".to_string());
        extra_leaf_keywords.insert("oneOf".to_string());
        Self {
            errors_by_path: BTreeMap::new(),
            leaf_errors_by_path: BTreeMap::new(),
            extra_leaf_keywords,
        }
    }

    /// Constructs an empty collector with a caller-supplied extra-leaf set.
    #[must_use]
    pub fn with_extra_leaf_keywords(extra_leaf_keywords: BTreeSet<String>) -> Self {
        Self {
            errors_by_path: BTreeMap::new(),
            leaf_errors_by_path: BTreeMap::new(),
            extra_leaf_keywords,
        }
    }

    /// Records an error, expanding aggregates into their sub-errors.
    ///
    /// The `schema` wrapper and fan-out nodes contribute each sub-error at
    /// its own path before the aggregate is indexed at its own path.
    pub fn add_error(&mut self, error: &ValidationError) {
        if error.is_aggregate() {
            for sub in &error.sub_errors {
                self.add_error(sub);
            }
        }
        self.index(error);
    }

    /// Returns `true` when any error is recorded exactly at `path`.
    #[must_use]
    pub fn has_error_at(&self, path: &DataPath) -> bool {
        self.errors_by_path.contains_key(&path.canonical())
    }

    /// Returns `true` when any error is recorded at a canonical pointer.
    #[must_use]
    pub fn has_error_at_pointer(&self, pointer: &str) -> bool {
        self.errors_by_path.contains_key(pointer)
    }

    /// Returns the errors recorded exactly at `path`.
    #[must_use]
    pub fn errors_at(&self, path: &DataPath) -> &[ValidationError] {
        self.errors_by_path.get(&path.canonical()).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` when a leaf error is recorded exactly at `path`.
    #[must_use]
    pub fn has_leaf_error_at(&self, path: &DataPath) -> bool {
        self.leaf_errors_by_path.contains_key(&path.canonical())
    }

    /// Returns the leaf errors recorded exactly at `path`.
    #[must_use]
    pub fn leaf_errors_at(&self, path: &DataPath) -> &[ValidationError] {
        self.leaf_errors_by_path.get(&path.canonical()).map_or(&[], Vec::as_slice)
    }

    /// Returns the full path index.
    #[must_use]
    pub fn errors(&self) -> &BTreeMap<String, Vec<ValidationError>> {
        &self.errors_by_path
    }

    /// Returns the leaf path index.
    #[must_use]
    pub fn leaf_errors(&self) -> &BTreeMap<String, Vec<ValidationError>> {
        &self.leaf_errors_by_path
    }

    /// Returns `true` when no error has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors_by_path.is_empty()
    }

    /// Returns the number of recorded leaf errors across all paths.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaf_errors_by_path.values().map(Vec::len).sum()
    }

    /// Indexes one error at its own path, skipping exact duplicates.
    fn index(&mut self, error: &ValidationError) {
        let key = error.path.canonical();
        let entry = self.errors_by_path.entry(key.clone()).or_default();
        if entry.contains(error) {
            return;
        }
        entry.push(error.clone());
        if self.is_leaf(error) {
            self.leaf_errors_by_path.entry(key).or_default().push(error.clone());
        }
    }

    /// Returns `true` when an error counts as a leaf.
    fn is_leaf(&self, error: &ValidationError) -> bool {
        error.sub_errors.is_empty() || self.extra_leaf_keywords.contains(&error.keyword)
    }
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

    use super::DataPath;
    use super::ErrorCollector;
    use super::ValidationError;

    fn path(pointer: &str) -> DataPath {
        DataPath::parse_absolute(pointer).unwrap()
    }

    #[test]
    fn schema_wrapper_expands_into_sub_errors() {
        let wrapper = ValidationError::new("schema", path("/a"), "value rejected")
            .with_sub_errors(vec![
                ValidationError::new("type", path("/a/b"), "wrong type"),
                ValidationError::new("minimum", path("/a/c"), "too small"),
            ]);
        let mut collector = ErrorCollector::new();
        collector.add_error(&wrapper);
        assert_eq!(collector.errors().len(), 3);
        assert!(collector.has_error_at(&path("/a")));
        assert!(collector.has_error_at(&path("/a/b")));
        assert!(collector.has_error_at(&path("/a/c")));
        assert_eq!(collector.leaf_errors().len(), 2);
        assert!(!collector.has_leaf_error_at(&path("/a")));
    }

    #[test]
    fn duplicate_errors_are_indexed_once() {
        let error = ValidationError::new("type", path("/a"), "wrong type");
        let mut collector = ErrorCollector::new();
        collector.add_error(&error);
        collector.add_error(&error);
        assert_eq!(collector.errors_at(&path("/a")).len(), 1);
        assert_eq!(collector.leaf_count(), 1);
    }

    #[test]
    fn extra_leaf_keywords_count_as_leaves() {
        let error = ValidationError::new("anyOf", path("/a"), "no alternative matched")
            .with_sub_errors(vec![ValidationError::new("type", path("/a"), "wrong type")]);
        let mut collector = ErrorCollector::new();
        collector.add_error(&error);
        assert!(collector.has_leaf_error_at(&path("/a")));
    }

    #[test]
    fn distinct_errors_at_one_path_accumulate() {
        let mut collector = ErrorCollector::new();
        collector.add_error(&ValidationError::new("type", path("/a"), "wrong type"));
        collector.add_error(&ValidationError::new("minimum", path("/a"), "too small"));
        assert_eq!(collector.errors_at(&path("/a")).len(), 2);
        assert_eq!(collector.leaf_errors_at(&path("/a")).len(), 2);
    }
}
