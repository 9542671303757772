// crates/fieldgate-core/src/core/tags.rs
// ============================================================================
// Module: Tag Collector
// Description: Deferred (tag, path) observations over the validated document.
// Purpose: Record where tagged values live during traversal and resolve
//          their values only after all mutations have settled.
// Dependencies: crate::core::path, serde, serde_json.
// ============================================================================

//! ## Overview
//! The `$tag` keyword records an observation at the current data path during
//! traversal. Because value injection mutates the document mid-walk, the
//! observed values are not read until [`TagCollector::resolve`] runs against
//! the final document, so injected and reordered values are reflected.
//! Observations whose path no longer exists (the member was unset) are
//! dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::path::DataPath;

// ============================================================================
// SECTION: Tag Entry
// ============================================================================

/// One resolved tag observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagEntry {
    /// Location of the tagged value.
    pub path: DataPath,
    /// The tagged value, read from the final document.
    pub value: Value,
}

// ============================================================================
// SECTION: Tag Collector
// ============================================================================

/// Accumulates (tag, path) observations for one validation call.
#[derive(Debug, Clone, Default)]
pub struct TagCollector {
    /// Observations in traversal order.
    observations: Vec<(String, DataPath)>,
}

impl TagCollector {
    /// Constructs an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observation at `path`.
    pub fn record(&mut self, tag: &str, path: DataPath) {
        self.observations.push((tag.to_string(), path));
    }

    /// Returns the number of recorded observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Resolves every observation against the final document, grouping
    /// entries by tag and dropping observations whose path no longer
    /// resolves.
    #[must_use]
    pub fn resolve(&self, document: &Value) -> BTreeMap<String, Vec<TagEntry>> {
        let mut resolved: BTreeMap<String, Vec<TagEntry>> = BTreeMap::new();
        for (tag, path) in &self.observations {
            let Some(value) = path.lookup(document) else {
                continue;
            };
            resolved.entry(tag.clone()).or_default().push(TagEntry {
                path: path.clone(),
                value: value.clone(),
            });
        }
        resolved
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
