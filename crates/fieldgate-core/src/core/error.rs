// crates/fieldgate-core/src/core/error.rs
// ============================================================================
// Module: Validation and Resolution Errors
// Description: Validation error trees plus the parse and resolve taxonomies.
// Purpose: Carry structured failure information through compilation,
//          resolution, and validation without panicking.
// Dependencies: crate::core::path, serde, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! Three failure families flow through this crate. [`ParseError`] is fatal
//! and aborts schema compilation: it means the schema itself is broken, not
//! the data. [`ResolveError`] is recoverable: the keyword handler that asked
//! for a variable decides whether an unresolved or violated reference becomes
//! an omitted value or a reported error. [`ValidationError`] is the normal
//! outcome tree, mirroring schema nesting, aggregated upward and optionally
//! filtered by limit-validation rules.
//!
//! Invariants:
//! - A fan-out node has an empty keyword and two or more sub-errors; every
//!   component that edits an error tree preserves or rebuilds that shape.
//! - `keyword_value` holds the keyword's configured schema value (or null
//!   where not applicable) so suppression rules can match it without walking
//!   back into the schema.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::path::DataPath;

// ============================================================================
// SECTION: Parse Errors
// ============================================================================

/// Fatal schema-compilation failures.
///
/// Variants are stable for programmatic handling.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The schema fragment is structurally invalid.
    #[error("invalid schema: {detail}")]
    Schema {
        /// Human-readable description of the defect.
        detail: String,
    },
    /// One keyword's configured value is invalid.
    #[error("invalid value for keyword {keyword}: {detail}")]
    Keyword {
        /// Name of the offending keyword.
        keyword: String,
        /// Human-readable description of the defect.
        detail: String,
    },
    /// An expression was rejected by the configured evaluator.
    #[error("invalid expression {expression:?}: {detail}")]
    Expression {
        /// The rejected expression text.
        expression: String,
        /// Evaluator-supplied description of the defect.
        detail: String,
    },
}

// ============================================================================
// SECTION: Resolve Errors
// ============================================================================

/// Recoverable variable-resolution failures.
///
/// Callers that requested resolution catch these and decide whether to omit
/// the dependent value or report a validation error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolveError {
    /// No value could be determined after exhausting the fallback chain.
    #[error("unresolved value: {subject}")]
    Unresolved {
        /// Pointer text or expression that failed to resolve.
        subject: String,
    },
    /// The referenced location already carries a recorded validation error.
    #[error("referenced value at {path} has a recorded violation")]
    Violation {
        /// Canonical pointer of the violated location.
        path: String,
    },
    /// The expression evaluator failed at evaluation time.
    #[error("expression evaluation failed: {detail}")]
    Expression {
        /// Evaluator-supplied description of the failure.
        detail: String,
    },
}

// ============================================================================
// SECTION: Validation Errors
// ============================================================================

/// Keyword used by aggregate wrapper errors produced for whole-schema
/// failures (boolean `false` schemas, caller-supplied aggregates).
pub const SCHEMA_KEYWORD: &str = "schema";

/// One node in a validation error tree.
///
/// # Invariants
/// - `keyword` is empty only on fan-out nodes, which carry two or more
///   sub-errors representing sibling failures at the same schema depth.
/// - `path` locates the violating value in the document under validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Name of the failing keyword; empty for fan-out nodes.
    pub keyword: String,
    /// Location of the violating value.
    pub path: DataPath,
    /// Human-readable description of the failure.
    pub message: String,
    /// Structured failure details for programmatic consumers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, Value>,
    /// The keyword's configured schema value; null where not applicable.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub keyword_value: Value,
    /// Nested failures beneath this node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_errors: Vec<ValidationError>,
}

impl ValidationError {
    /// Constructs a leaf error for one keyword failure.
    #[must_use]
    pub fn new(keyword: &str, path: DataPath, message: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            path,
            message: message.to_string(),
            args: BTreeMap::new(),
            keyword_value: Value::Null,
            sub_errors: Vec::new(),
        }
    }

    /// Constructs a fan-out node wrapping sibling failures at one depth.
    ///
    /// Callers pass two or more errors; smaller sets are combined without a
    /// wrapper by the node loop.
    #[must_use]
    pub fn fan_out(path: DataPath, errors: Vec<Self>) -> Self {
        Self {
            keyword: String::new(),
            path,
            message: "multiple validation failures".to_string(),
            args: BTreeMap::new(),
            keyword_value: Value::Null,
            sub_errors: errors,
        }
    }

    /// Attaches one structured argument.
    #[must_use]
    pub fn with_arg(mut self, name: &str, value: Value) -> Self {
        self.args.insert(name.to_string(), value);
        self
    }

    /// Attaches the keyword's configured schema value.
    #[must_use]
    pub fn with_keyword_value(mut self, value: Value) -> Self {
        self.keyword_value = value;
        self
    }

    /// Attaches nested failures.
    #[must_use]
    pub fn with_sub_errors(mut self, sub_errors: Vec<Self>) -> Self {
        self.sub_errors = sub_errors;
        self
    }

    /// Returns `true` when this node is a fan-out wrapper.
    #[must_use]
    pub fn is_fan_out(&self) -> bool {
        self.keyword.is_empty()
    }

    /// Returns `true` when this node is an aggregate that the collector
    /// expands into its sub-errors: the `schema` wrapper or a fan-out node.
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        self.keyword.is_empty() || self.keyword == SCHEMA_KEYWORD
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
