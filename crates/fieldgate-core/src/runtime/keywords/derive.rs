// crates/fieldgate-core/src/runtime/keywords/derive.rs
// ============================================================================
// Module: Derivation Keyword
// Description: The `$calculate` keyword: compute a value and inject it at
//              the current location.
// Purpose: Materialize derived members before structural keywords observe
//          them, and unset members whose derivation failed.
// Dependencies: crate::core, crate::runtime::{context, keywords, schema},
//               serde_json.
// ============================================================================

//! ## Overview
//! `$calculate` runs first at its node. On success it overwrites the current
//! location with the computed value; every later handler at this node and
//! every later sibling observes the new value and its new type. When the
//! value cannot be derived (unresolved or violated inputs, null result with
//! no fallback), the member is unset entirely so it reads as absent, not
//! null, and the node halts: a required member reports a single
//! `$calculate` error, an optional one is silently omitted.
//!
//! Evaluator runtime failures are reported as `$calculate` errors
//! unconditionally; they indicate a broken expression rather than missing
//! inputs. The factory declines when no evaluator is configured.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::core::error::ParseError;
use crate::core::error::ResolveError;
use crate::core::error::ValidationError;
use crate::core::variable::Calculation;
use crate::runtime::context::ValidationContext;
use crate::runtime::keywords::Keyword;
use crate::runtime::keywords::KeywordFactory;
use crate::runtime::keywords::ParseScope;
use crate::runtime::keywords::Verdict;
use crate::runtime::keywords::rank;
use crate::runtime::schema::Compiler;

// ============================================================================
// SECTION: Factory
// ============================================================================

/// Builds [`CalculateKeyword`] handlers from `$calculate`.
#[derive(Debug, Clone, Copy)]
pub struct CalculateFactory;

impl KeywordFactory for CalculateFactory {
    fn keyword(&self) -> &str {
        "$calculate"
    }

    fn rank(&self) -> u8 {
        rank::DERIVE
    }

    fn parse(
        &self,
        node: &Map<String, Value>,
        scope: &ParseScope,
        compiler: &Compiler<'_>,
    ) -> Result<Option<Box<dyn Keyword>>, ParseError> {
        let Some(raw) = node.get("$calculate") else {
            return Ok(None);
        };
        let Some(evaluator) = compiler.evaluator() else {
            return Ok(None);
        };
        let calculation = Calculation::parse(raw)?;
        calculation.check(evaluator)?;
        Ok(Some(Box::new(CalculateKeyword {
            calculation,
            required: scope.required_member,
        })))
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Derives and injects a value at the current location.
struct CalculateKeyword {
    /// The compiled calculation.
    calculation: Calculation,
    /// The directly-enclosing node lists this member as required, so a
    /// failed derivation is reported instead of silently omitted.
    required: bool,
}

impl Keyword for CalculateKeyword {
    fn name(&self) -> &str {
        "$calculate"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        match self.calculation.resolve(&ctx.resolve_scope()) {
            Ok(Some(value)) => match ctx.set_current(|_| value) {
                Ok(()) => Verdict::pass(),
                Err(err) => Verdict::halt_with(self.error(ctx, &err.to_string())),
            },
            Ok(None) => self.underivable(ctx, None),
            Err(
                err @ (ResolveError::Unresolved { .. } | ResolveError::Violation { .. }),
            ) => self.underivable(ctx, Some(err)),
            Err(err) => {
                // A broken expression at runtime is always reported, even
                // for optional members.
                let mut detail = err.to_string();
                if let Err(unset) = ctx.unset_current() {
                    detail = format!("{detail}; {unset}");
                }
                Verdict::halt_with(self.error(ctx, &detail))
            }
        }
    }
}

impl CalculateKeyword {
    /// Handles an underivable value: unset the member so it reads as
    /// absent, then report only when the member is required.
    fn underivable(
        &self,
        ctx: &mut ValidationContext<'_>,
        cause: Option<ResolveError>,
    ) -> Verdict {
        if let Err(unset) = ctx.unset_current() {
            // The stale value is still in place; reported even for
            // optional members.
            return Verdict::halt_with(self.error(ctx, &unset.to_string()));
        }
        if !self.required {
            return Verdict::halt();
        }
        let detail = cause.map_or_else(
            || "expression produced no value".to_string(),
            |err| err.to_string(),
        );
        Verdict::halt_with(self.error(ctx, &detail))
    }

    /// Builds the `$calculate` error shape.
    fn error(&self, ctx: &ValidationContext<'_>, detail: &str) -> ValidationError {
        ValidationError::new("$calculate", ctx.path().clone(), "value could not be derived")
            .with_keyword_value(json!(self.calculation.expression.clone()))
            .with_arg("reason", json!(detail))
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

    use std::collections::BTreeMap;

    use serde_json::json;

    use super::CalculateKeyword;
    use super::Calculation;
    use super::Keyword;
    use super::ValidationContext;
    use crate::core::collector::ErrorCollector;
    use crate::interfaces::ExpressionError;
    use crate::interfaces::ExpressionEvaluator;

    /// Accepts every expression and evaluates everything to `1`.
    struct FixedEvaluator;

    impl ExpressionEvaluator for FixedEvaluator {
        fn check(
            &self,
            _expression: &str,
            _variables: &[String],
        ) -> Result<(), ExpressionError> {
            Ok(())
        }

        fn evaluate(
            &self,
            _expression: &str,
            _bindings: &BTreeMap<String, serde_json::Value>,
        ) -> Result<serde_json::Value, ExpressionError> {
            Ok(json!(1))
        }
    }

    #[test]
    fn failed_unsets_fold_into_the_reported_error() {
        // A member name over an array parent cannot be unset; the injector
        // failure must ride along with the evaluator failure.
        let keyword = CalculateKeyword {
            calculation: Calculation::parse(&json!("1 + 1")).unwrap(),
            required: false,
        };
        let mut document = json!([1]);
        let mut ctx =
            ValidationContext::new(&mut document, None, &[], ErrorCollector::new(), 128);
        let verdict = ctx.scoped_member("x", |ctx| keyword.validate(ctx));
        assert!(verdict.halt);
        let error = verdict.error.unwrap();
        assert_eq!(error.keyword, "$calculate");
        let reason = error.args["reason"].as_str().unwrap();
        assert!(reason.contains("no expression evaluator"));
        assert!(reason.contains("array segment is not an index"));
    }

    #[test]
    fn underivable_members_report_when_the_unset_fails() {
        // Optional members are normally omitted silently, but a failed
        // unset leaves the stale value in place and must be reported.
        let keyword = CalculateKeyword {
            calculation: Calculation::parse(&json!({
                "$expression": "$v",
                "$variables": {"v": {"$data": "/missing"}}
            }))
            .unwrap(),
            required: false,
        };
        let mut document = json!([1]);
        let evaluator = FixedEvaluator;
        let mut ctx = ValidationContext::new(
            &mut document,
            Some(&evaluator),
            &[],
            ErrorCollector::new(),
            128,
        );
        let verdict = ctx.scoped_member("x", |ctx| keyword.validate(ctx));
        assert!(verdict.halt);
        let error = verdict.error.unwrap();
        assert_eq!(error.keyword, "$calculate");
        let reason = error.args["reason"].as_str().unwrap();
        assert!(reason.contains("array segment is not an index"));
    }
}
