// crates/fieldgate-core/tests/common/mod.rs
// ============================================================================
// Module: Shared Test Fixtures
// Description: A deterministic stub expression evaluator for engine tests.
// Purpose: Exercise expression-dependent keywords without a real expression
//          language in the loop.
// Dependencies: fieldgate-core, serde_json
// ============================================================================

//! A table-driven evaluator: it recognizes the fixed expressions the test
//! suite uses and rejects everything else at check time, so tests observe
//! the engine's behavior rather than an expression language's.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    dead_code,
    reason = "Test-only helpers; not every test file uses every item."
)]

use std::collections::BTreeMap;

use fieldgate_core::interfaces::ExpressionError;
use fieldgate_core::interfaces::ExpressionEvaluator;
use serde_json::Value;
use serde_json::json;

/// Expressions the stub recognizes.
const KNOWN: &[&str] =
    &["2 * 3", "$y + 1", "$a + $b", "null", "boom", "$x > 1", "$n", "$total >= $paid"];

/// Deterministic evaluator over a fixed expression table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubEvaluator;

impl StubEvaluator {
    /// Extracts the `$name` tokens of an expression.
    fn names(expression: &str) -> Vec<String> {
        let mut names = Vec::new();
        let mut rest = expression;
        while let Some(start) = rest.find('$') {
            let tail = &rest[start + 1..];
            let end = tail.find(|c: char| !c.is_ascii_alphanumeric()).unwrap_or(tail.len());
            names.push(tail[..end].to_string());
            rest = &tail[end..];
        }
        names
    }

    /// Reads a binding as f64, panicking on non-numbers (tests bind
    /// numbers only).
    fn number(bindings: &BTreeMap<String, Value>, name: &str) -> Result<f64, ExpressionError> {
        bindings
            .get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| ExpressionError::Failed {
                detail: format!("binding {name} is not a number"),
            })
    }

    /// Renders an f64 back as the narrowest JSON number.
    fn render(value: f64) -> Value {
        if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Integral and range-checked above."
            )]
            return json!(value as i64);
        }
        json!(value)
    }
}

impl ExpressionEvaluator for StubEvaluator {
    fn check(&self, expression: &str, variables: &[String]) -> Result<(), ExpressionError> {
        if !KNOWN.contains(&expression) {
            return Err(ExpressionError::Invalid {
                detail: format!("unrecognized expression: {expression}"),
            });
        }
        for name in Self::names(expression) {
            if !variables.contains(&name) {
                return Err(ExpressionError::Invalid {
                    detail: format!("undeclared variable: {name}"),
                });
            }
        }
        Ok(())
    }

    fn evaluate(
        &self,
        expression: &str,
        bindings: &BTreeMap<String, Value>,
    ) -> Result<Value, ExpressionError> {
        match expression {
            "2 * 3" => Ok(json!(6)),
            "null" => Ok(Value::Null),
            "boom" => Err(ExpressionError::Failed {
                detail: "deliberate runtime failure".to_string(),
            }),
            "$y + 1" => Ok(Self::render(Self::number(bindings, "y")? + 1.0)),
            "$a + $b" => {
                Ok(Self::render(Self::number(bindings, "a")? + Self::number(bindings, "b")?))
            }
            "$x > 1" => Ok(json!(Self::number(bindings, "x")? > 1.0)),
            "$n" => bindings.get("n").cloned().ok_or_else(|| ExpressionError::Failed {
                detail: "binding n is absent".to_string(),
            }),
            "$total >= $paid" => Ok(json!(
                Self::number(bindings, "total")? >= Self::number(bindings, "paid")?
            )),
            other => Err(ExpressionError::Failed {
                detail: format!("unrecognized expression: {other}"),
            }),
        }
    }
}
