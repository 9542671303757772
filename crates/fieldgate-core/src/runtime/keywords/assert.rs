// crates/fieldgate-core/src/runtime/keywords/assert.rs
// ============================================================================
// Module: Assertion Keywords
// Description: `$evaluate` and `$validations` boolean-expression checks.
// Purpose: Assert cross-field conditions through the configured expression
//          evaluator.
// Dependencies: crate::core, crate::runtime::{context, keywords, schema},
//               serde_json.
// ============================================================================

//! ## Overview
//! `$evaluate` reduces one expression to a boolean against the current
//! value's neighbourhood. An input that cannot be resolved (absent
//! reference, violated reference) makes the assertion vacuously true; the
//! keyword judges values, and a missing or already-failed value has nothing
//! to judge. Evaluator runtime failures are real errors and fail closed.
//!
//! `$validations` bundles several assertions with per-assertion messages;
//! each entry carries the same vacuous-pass semantics.
//!
//! Both factories decline when no evaluator is configured, so expression
//! keywords in the schema are inert rather than fatal on an
//! expression-less validator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::core::error::ParseError;
use crate::core::error::ResolveError;
use crate::core::error::ValidationError;
use crate::core::variable::Evaluation;
use crate::runtime::context::ValidationContext;
use crate::runtime::keywords::Keyword;
use crate::runtime::keywords::KeywordFactory;
use crate::runtime::keywords::ParseScope;
use crate::runtime::keywords::Verdict;
use crate::runtime::keywords::rank;
use crate::runtime::schema::Compiler;

// ============================================================================
// SECTION: Shared Judgement
// ============================================================================

/// Outcome of one assertion at one location.
enum Judgement {
    /// The expression held, or had nothing to judge.
    Holds,
    /// The expression evaluated to false.
    Refuted,
    /// The evaluator itself failed; carries the failure detail.
    Faulted(String),
}

/// Evaluates one assertion, folding unresolvable inputs into a vacuous
/// pass and keeping evaluator faults distinct.
fn judge(evaluation: &Evaluation, ctx: &ValidationContext<'_>) -> Judgement {
    match evaluation.evaluate(&ctx.resolve_scope()) {
        Ok(true) => Judgement::Holds,
        Ok(false) => Judgement::Refuted,
        Err(ResolveError::Unresolved { .. } | ResolveError::Violation { .. }) => Judgement::Holds,
        Err(err @ ResolveError::Expression { .. }) => Judgement::Faulted(err.to_string()),
    }
}

// ============================================================================
// SECTION: Evaluate Keyword
// ============================================================================

/// Builds [`EvaluateKeyword`] handlers from `$evaluate`.
#[derive(Debug, Clone, Copy)]
pub struct EvaluateFactory;

impl KeywordFactory for EvaluateFactory {
    fn keyword(&self) -> &str {
        "$evaluate"
    }

    fn rank(&self) -> u8 {
        rank::ASSERT
    }

    fn parse(
        &self,
        node: &Map<String, Value>,
        _scope: &ParseScope,
        compiler: &Compiler<'_>,
    ) -> Result<Option<Box<dyn Keyword>>, ParseError> {
        let Some(raw) = node.get("$evaluate") else {
            return Ok(None);
        };
        let Some(evaluator) = compiler.evaluator() else {
            return Ok(None);
        };
        let evaluation = Evaluation::parse(raw)?;
        evaluation.check(evaluator)?;
        Ok(Some(Box::new(EvaluateKeyword {
            evaluation,
        })))
    }
}

/// Asserts one boolean expression at the current location.
struct EvaluateKeyword {
    /// The compiled assertion.
    evaluation: Evaluation,
}

impl Keyword for EvaluateKeyword {
    fn name(&self) -> &str {
        "$evaluate"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        match judge(&self.evaluation, ctx) {
            Judgement::Holds => Verdict::pass(),
            Judgement::Refuted => Verdict::fail(
                ValidationError::new("$evaluate", ctx.path().clone(), "expression is not satisfied")
                    .with_keyword_value(json!(self.evaluation.expression)),
            ),
            Judgement::Faulted(detail) => Verdict::fail(
                ValidationError::new("$evaluate", ctx.path().clone(), "expression failed to evaluate")
                    .with_keyword_value(json!(self.evaluation.expression))
                    .with_arg("reason", json!(detail)),
            ),
        }
    }
}

// ============================================================================
// SECTION: Validations Keyword
// ============================================================================

/// Builds [`ValidationsKeyword`] handlers from `$validations`.
#[derive(Debug, Clone, Copy)]
pub struct ValidationsFactory;

impl KeywordFactory for ValidationsFactory {
    fn keyword(&self) -> &str {
        "$validations"
    }

    fn rank(&self) -> u8 {
        rank::ASSERT
    }

    fn parse(
        &self,
        node: &Map<String, Value>,
        _scope: &ParseScope,
        compiler: &Compiler<'_>,
    ) -> Result<Option<Box<dyn Keyword>>, ParseError> {
        let Some(raw) = node.get("$validations") else {
            return Ok(None);
        };
        let Some(evaluator) = compiler.evaluator() else {
            return Ok(None);
        };
        let Value::Array(items) = raw else {
            return Err(ParseError::Keyword {
                keyword: "$validations".to_string(),
                detail: "value must be an array of validation entries".to_string(),
            });
        };
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            entries.push(ValidationEntry::parse(item, evaluator)?);
        }
        Ok(Some(Box::new(ValidationsKeyword {
            entries,
        })))
    }
}

/// One named assertion inside `$validations`.
struct ValidationEntry {
    /// The compiled assertion.
    evaluation: Evaluation,
    /// Message reported when the assertion fails.
    message: Option<String>,
}

impl ValidationEntry {
    /// Parses one `{"$evaluate": ..., "message": ...}` entry.
    ///
    /// # Errors
    /// Returns [`ParseError::Keyword`] for non-object entries, a missing
    /// `$evaluate`, or a non-string message, and propagates expression
    /// checking failures.
    fn parse(
        raw: &Value,
        evaluator: &dyn crate::interfaces::ExpressionEvaluator,
    ) -> Result<Self, ParseError> {
        let Value::Object(map) = raw else {
            return Err(ParseError::Keyword {
                keyword: "$validations".to_string(),
                detail: "each entry must be an object".to_string(),
            });
        };
        let Some(raw_evaluate) = map.get("$evaluate") else {
            return Err(ParseError::Keyword {
                keyword: "$validations".to_string(),
                detail: "each entry requires an $evaluate expression".to_string(),
            });
        };
        let evaluation = Evaluation::parse(raw_evaluate)?;
        evaluation.check(evaluator)?;
        let message = match map.get("message") {
            None => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(_) => {
                return Err(ParseError::Keyword {
                    keyword: "$validations".to_string(),
                    detail: "entry message must be a string".to_string(),
                });
            }
        };
        Ok(Self {
            evaluation,
            message,
        })
    }
}

/// Asserts an ordered list of boolean expressions.
struct ValidationsKeyword {
    /// The entries, checked in declaration order.
    entries: Vec<ValidationEntry>,
}

impl Keyword for ValidationsKeyword {
    fn name(&self) -> &str {
        "$validations"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let mut errors = Vec::new();
        for entry in &self.entries {
            match judge(&entry.evaluation, ctx) {
                Judgement::Holds => {}
                Judgement::Refuted => {
                    let message = entry
                        .message
                        .clone()
                        .unwrap_or_else(|| "expression is not satisfied".to_string());
                    errors.push(
                        ValidationError::new("$validations", ctx.path().clone(), &message)
                            .with_keyword_value(json!(entry.evaluation.expression)),
                    );
                }
                Judgement::Faulted(detail) => {
                    errors.push(
                        ValidationError::new(
                            "$validations",
                            ctx.path().clone(),
                            "expression failed to evaluate",
                        )
                        .with_keyword_value(json!(entry.evaluation.expression))
                        .with_arg("reason", json!(detail)),
                    );
                }
            }
        }
        match errors.len() {
            0 => Verdict::pass(),
            1 => match errors.into_iter().next() {
                Some(error) => Verdict::fail(error),
                None => Verdict::pass(),
            },
            _ => Verdict::fail(ValidationError::fan_out(ctx.path().clone(), errors)),
        }
    }
}
