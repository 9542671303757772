// crates/fieldgate-core/src/lib.rs
// ============================================================================
// Module: Fieldgate Core Library
// Description: Public API surface for the Fieldgate validation engine.
// Purpose: Expose the data model, evaluator interface, and runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Fieldgate extends structural JSON validation with computed-value
//! derivation, path-reference variables with explicit unresolved and
//! violation semantics, and declarative limit-validation error suppression.
//! The engine is expression-language-agnostic and integrates an evaluator
//! through the [`interfaces::ExpressionEvaluator`] trait rather than
//! embedding one.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ExpressionError;
pub use interfaces::ExpressionEvaluator;
pub use runtime::Compiler;
pub use runtime::DEFAULT_MAX_ERRORS;
pub use runtime::Decision;
pub use runtime::InjectError;
pub use runtime::Keyword;
pub use runtime::KeywordFactory;
pub use runtime::KeywordRegistry;
pub use runtime::LimitGate;
pub use runtime::LimitRule;
pub use runtime::ParseScope;
pub use runtime::Schema;
pub use runtime::SuppressionMode;
pub use runtime::ValidationContext;
pub use runtime::ValidationOutcome;
pub use runtime::Validator;
pub use runtime::ValidatorOptions;
pub use runtime::Verdict;
pub use runtime::default_rule_set;
pub use runtime::filter_error;
