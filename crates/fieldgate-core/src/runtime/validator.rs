// crates/fieldgate-core/src/runtime/validator.rs
// ============================================================================
// Module: Validator Facade
// Description: Compiled-schema entry point: options, validation calls, and
//              outcome assembly.
// Purpose: Own the compiled schema and per-validator configuration, and run
//          one validation call end to end.
// Dependencies: crate::core, crate::interfaces, crate::runtime::{context,
//               keywords, limit, schema}, serde_json.
// ============================================================================

//! ## Overview
//! A [`Validator`] is built once from a raw schema document and reused
//! across calls. Construction compiles the schema and the validator-level
//! default rule set, failing fast on any defect. Each call owns a fresh
//! [`ValidationContext`]; the document is borrowed mutably because
//! derivation writes computed values in place.
//!
//! `validate_with` accepts a caller-seeded collector so violations known
//! from an earlier call (or another source) are visible to path-reference
//! variables from the start.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use crate::core::collector::ErrorCollector;
use crate::core::error::ParseError;
use crate::core::error::ValidationError;
use crate::core::tags::TagEntry;
use crate::interfaces::ExpressionEvaluator;
use crate::runtime::context::ValidationContext;
use crate::runtime::keywords::KeywordRegistry;
use crate::runtime::limit::LimitRule;
use crate::runtime::limit::default_rule_set;
use crate::runtime::schema::Compiler;
use crate::runtime::schema::Schema;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Default leaf-error budget for one validation call.
pub const DEFAULT_MAX_ERRORS: usize = 128;

/// Per-validator configuration.
#[derive(Clone)]
pub struct ValidatorOptions {
    /// Expression evaluator backing `$calculate`, `$evaluate`, and
    /// `$validations`; absence disables those keywords at compile time.
    evaluator: Option<Arc<dyn ExpressionEvaluator>>,
    /// Keywords treated as leaves in the collector despite sub-errors.
    extra_leaf_keywords: BTreeSet<String>,
    /// Raw rule set used by gates that do not declare their own.
    default_rules: Value,
    /// Leaf-error budget per validation call.
    max_errors: usize,
}

impl std::fmt::Debug for ValidatorOptions {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ValidatorOptions")
            .field("has_evaluator", &self.evaluator.is_some())
            .field("extra_leaf_keywords", &self.extra_leaf_keywords)
            .field("max_errors", &self.max_errors)
            .finish_non_exhaustive()
    }
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        let mut extra_leaf_keywords = BTreeSet::new();
        extra_leaf_keywords.insert("anyOf".to_string());
        extra_leaf_keywords.insert("oneOf".to_string());
        Self {
            evaluator: None,
            extra_leaf_keywords,
            default_rules: default_rule_set(),
            max_errors: DEFAULT_MAX_ERRORS,
        }
    }
}

impl ValidatorOptions {
    /// Constructs the default options: no evaluator, built-in rule set,
    /// default budget.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the expression evaluator.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Replaces the extra-leaf keyword set.
    #[must_use]
    pub fn with_extra_leaf_keywords(mut self, keywords: BTreeSet<String>) -> Self {
        self.extra_leaf_keywords = keywords;
        self
    }

    /// Replaces the validator-level default suppression rule set.
    #[must_use]
    pub fn with_default_rules(mut self, rules: Value) -> Self {
        self.default_rules = rules;
        self
    }

    /// Sets the leaf-error budget.
    #[must_use]
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Result of one validation call.
#[derive(Debug)]
pub struct ValidationOutcome {
    /// `true` when the (possibly filtered) root error tree is empty.
    pub valid: bool,
    /// The root error tree, when any failure survived filtering.
    pub error: Option<ValidationError>,
    /// The full path-indexed collector, including recorded aggregates.
    pub errors: ErrorCollector,
    /// Tag observations resolved against the final document.
    pub tags: BTreeMap<String, Vec<TagEntry>>,
    /// `true` when the error budget stopped further descent.
    pub truncated: bool,
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// A compiled schema plus per-validator configuration.
#[derive(Debug)]
pub struct Validator {
    /// The compiled root schema.
    schema: Schema,
    /// Compiled validator-level default rules.
    rules: Vec<LimitRule>,
    /// The configuration the validator was built with.
    options: ValidatorOptions,
}

impl Validator {
    /// Compiles a raw schema with the standard keyword registry.
    ///
    /// # Errors
    /// Returns [`ParseError`] for any schema, keyword, rule, or expression
    /// defect; nothing is deferred to validation time.
    pub fn new(schema: &Value, options: ValidatorOptions) -> Result<Self, ParseError> {
        Self::with_registry(schema, options, &KeywordRegistry::standard())
    }

    /// Compiles a raw schema against a caller-supplied registry.
    ///
    /// # Errors
    /// See [`Validator::new`].
    pub fn with_registry(
        schema: &Value,
        options: ValidatorOptions,
        registry: &KeywordRegistry,
    ) -> Result<Self, ParseError> {
        let evaluator = options.evaluator.as_deref();
        let compiler = Compiler::new(registry, evaluator);
        let compiled = compiler.compile(schema)?;
        let rules = LimitRule::parse_set(&options.default_rules, &compiler)?;
        Ok(Self {
            schema: compiled,
            rules,
            options,
        })
    }

    /// Validates a document, mutating it in place where derivation applies.
    #[must_use]
    pub fn validate(&self, document: &mut Value) -> ValidationOutcome {
        let collector =
            ErrorCollector::with_extra_leaf_keywords(self.options.extra_leaf_keywords.clone());
        self.validate_with(document, collector)
    }

    /// Validates a document against a caller-seeded collector, so recorded
    /// violations from elsewhere are visible to path references.
    #[must_use]
    pub fn validate_with(
        &self,
        document: &mut Value,
        collector: ErrorCollector,
    ) -> ValidationOutcome {
        let mut ctx = ValidationContext::new(
            document,
            self.options.evaluator.as_deref(),
            &self.rules,
            collector,
            self.options.max_errors,
        );
        let error = self.schema.validate(&mut ctx);
        let (errors, observations, truncated) = ctx.into_parts();
        let tags = observations.resolve(document);
        ValidationOutcome {
            valid: error.is_none(),
            error,
            errors,
            tags,
            truncated,
        }
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

    use serde_json::json;

    use super::ParseError;
    use super::Validator;
    use super::ValidatorOptions;

    #[test]
    fn boolean_schemas_compile_and_judge() {
        let accept = Validator::new(&json!(true), ValidatorOptions::new()).unwrap();
        let reject = Validator::new(&json!(false), ValidatorOptions::new()).unwrap();
        let mut document = json!({"anything": 1});
        assert!(accept.validate(&mut document).valid);
        let outcome = reject.validate(&mut document);
        assert!(!outcome.valid);
        assert!(outcome.errors.has_error_at_pointer(""));
    }

    #[test]
    fn non_schema_json_is_a_parse_error() {
        let result = Validator::new(&json!(42), ValidatorOptions::new());
        assert!(matches!(result, Err(ParseError::Schema { .. })));
    }

    #[test]
    fn malformed_default_rules_abort_construction() {
        let options = ValidatorOptions::new().with_default_rules(json!([{"keep": "yes"}]));
        let result = Validator::new(&json!(true), options);
        assert!(matches!(result, Err(ParseError::Keyword { .. })));
    }

    #[test]
    fn expression_keywords_are_inert_without_an_evaluator() {
        let schema = json!({"type": "object", "$evaluate": ".x > 1"});
        let validator = Validator::new(&schema, ValidatorOptions::new()).unwrap();
        let mut document = json!({"x": 0});
        assert!(validator.validate(&mut document).valid);
    }
}
