// crates/fieldgate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Fieldgate Interfaces
// Description: Backend-agnostic interfaces for expression evaluation.
// Purpose: Define the contract surface between the validation engine and the
//          embedding application's expression language.
// Dependencies: serde_json, thiserror.
// ============================================================================

//! ## Overview
//! The engine never interprets expression text itself. An embedding
//! application supplies an [`ExpressionEvaluator`] that checks expressions at
//! schema-compile time and evaluates them against concrete bindings at
//! validation time. When no evaluator is configured, the expression-dependent
//! keywords (`$calculate`, `$evaluate`, `$validations`) are silently disabled
//! at parse time rather than failing.
//!
//! Implementations must be deterministic with respect to their bindings and
//! must report failures through [`ExpressionError`] instead of panicking.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Expression Errors
// ============================================================================

/// Failures reported by expression evaluator implementations.
///
/// Variants are stable for programmatic handling.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExpressionError {
    /// The expression text is malformed or uses undeclared variables.
    ///
    /// Surfaced at schema-compile time; always fatal for the schema.
    #[error("invalid expression: {detail}")]
    Invalid {
        /// Evaluator-supplied description of the defect.
        detail: String,
    },
    /// Evaluation failed against concrete bindings.
    ///
    /// Surfaced at validation time; converted into a keyword-level
    /// validation error by the requesting handler.
    #[error("expression evaluation failed: {detail}")]
    Failed {
        /// Evaluator-supplied description of the failure.
        detail: String,
    },
}

// ============================================================================
// SECTION: Expression Evaluator
// ============================================================================

/// Pluggable expression evaluator supplied by the embedding application.
///
/// # Invariants
/// - `check` accepts every expression that `evaluate` can run with the same
///   declared variable names; a `check` failure is a broken schema.
/// - `evaluate` receives a binding for every declared variable and never
///   observes the document directly.
pub trait ExpressionEvaluator: Send + Sync {
    /// Validates expression text against the declared variable names.
    ///
    /// # Errors
    /// Returns [`ExpressionError::Invalid`] for malformed expressions or
    /// references to undeclared variables.
    fn check(&self, expression: &str, variables: &[String]) -> Result<(), ExpressionError>;

    /// Evaluates an expression against concrete variable bindings.
    ///
    /// # Errors
    /// Returns [`ExpressionError::Failed`] when evaluation fails at runtime.
    fn evaluate(
        &self,
        expression: &str,
        bindings: &BTreeMap<String, Value>,
    ) -> Result<Value, ExpressionError>;
}
