// crates/fieldgate-core/src/core/variable.rs
// ============================================================================
// Module: Variable Model
// Description: Literal, path-reference, and computed variables with uniform
//              resolution semantics and fallback composition.
// Purpose: Obtain concrete values for expression-dependent keywords, with
//          explicit unresolved and violation outcomes.
// Dependencies: crate::core::{collector, error, path}, crate::interfaces,
//               serde_json.
// ============================================================================

//! ## Overview
//! A [`Variable`] names a value source: a literal already-known value, a
//! pointer into the document under validation, or an expression computed from
//! a named set of sub-variables. All three resolve through the same contract:
//! a value, "unset" (no value could be determined, not an error under lenient
//! flags), or a [`ResolveError`].
//!
//! `null` is never a value here. A `null` where a variable is expected is a
//! parse error, a `null` fallback is a parse error (ambiguous with "no
//! fallback"), a referenced value of `null` counts as unset, and a computed
//! result of `null` legitimately engages the fallback chain at evaluation
//! time.
//!
//! Invariants:
//! - Resolution never returns `Some(Value::Null)` for references; null reads
//!   route through the fallback chain as unset.
//! - Sub-variables of a calculation resolve with both failure flags forced
//!   on; the calculation's own fallback is the only thing that may catch the
//!   resulting errors.
//! - Evaluator runtime failures always propagate, fallback or not.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::core::collector::ErrorCollector;
use crate::core::error::ParseError;
use crate::core::error::ResolveError;
use crate::core::path::DataPath;
use crate::core::path::ValueReference;
use crate::interfaces::ExpressionEvaluator;

// ============================================================================
// SECTION: Resolution Inputs
// ============================================================================

/// Failure flags controlling variable resolution.
///
/// # Invariants
/// - `fail_on_violation` is checked before the fallback chain is consulted;
///   a violated reference never falls back on its own.
/// - `fail_on_unresolved` is checked after the fallback chain is exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveFlags {
    /// Raise [`ResolveError::Unresolved`] when no value can be determined.
    pub fail_on_unresolved: bool,
    /// Raise [`ResolveError::Violation`] when the referenced location has a
    /// recorded validation error.
    pub fail_on_violation: bool,
}

impl ResolveFlags {
    /// Both flags off: absence resolves to unset, violations are ignored.
    pub const LENIENT: Self = Self {
        fail_on_unresolved: false,
        fail_on_violation: false,
    };
    /// Both flags on: forced for sub-variables of a calculation.
    pub const STRICT: Self = Self {
        fail_on_unresolved: true,
        fail_on_violation: true,
    };
}

/// Read-only view of the validation state a resolution runs against.
#[derive(Clone, Copy)]
pub struct ResolveScope<'a> {
    /// The full document under validation.
    pub document: &'a Value,
    /// The full current data path, used to anchor relative references.
    pub path: &'a DataPath,
    /// The collector consulted for recorded violations.
    pub collector: &'a ErrorCollector,
    /// The configured expression evaluator, when present.
    pub evaluator: Option<&'a dyn ExpressionEvaluator>,
}

impl fmt::Debug for ResolveScope<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ResolveScope")
            .field("path", &self.path.canonical())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Variable
// ============================================================================

/// A value source: literal, path reference, or computed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    /// An already-known value.
    Literal(Value),
    /// A pointer into the document under validation.
    Reference(PathReference),
    /// An expression computed from named sub-variables.
    Computed(Calculation),
}

impl Variable {
    /// Parses a variable position in the schema.
    ///
    /// Objects carrying `$data` parse as references, objects carrying
    /// `$expression` parse as calculations, anything else is a literal.
    ///
    /// # Errors
    /// Returns [`ParseError`] for `null` (meaningful only as unset), for
    /// `null` fallbacks, and for malformed reference or expression forms.
    pub fn parse(raw: &Value) -> Result<Self, ParseError> {
        match raw {
            Value::Null => Err(ParseError::Schema {
                detail: "null is not a variable; null means unset".to_string(),
            }),
            Value::Object(map) if map.contains_key("$data") => {
                PathReference::parse(map).map(Self::Reference)
            }
            Value::Object(map) if map.contains_key("$expression") => {
                Calculation::parse_object(map).map(Self::Computed)
            }
            other => Ok(Self::Literal(other.clone())),
        }
    }

    /// Resolves this variable to a value, or to unset (`None`).
    ///
    /// # Errors
    /// Returns [`ResolveError::Violation`] for violated references under
    /// `fail_on_violation`, [`ResolveError::Unresolved`] for exhausted
    /// fallback chains under `fail_on_unresolved`, and
    /// [`ResolveError::Expression`] for evaluator runtime failures.
    pub fn resolve(
        &self,
        scope: &ResolveScope<'_>,
        flags: ResolveFlags,
    ) -> Result<Option<Value>, ResolveError> {
        match self {
            Self::Literal(value) => Ok(Some(value.clone())),
            Self::Reference(reference) => reference.resolve(scope, flags),
            Self::Computed(calculation) => {
                let result = calculation.resolve(scope)?;
                if result.is_none() && flags.fail_on_unresolved {
                    return Err(ResolveError::Unresolved {
                        subject: calculation.expression.clone(),
                    });
                }
                Ok(result)
            }
        }
    }

    /// Collects the names of every declared sub-variable, for eager
    /// expression checking at parse time.
    fn declared_names(variables: &BTreeMap<String, Self>) -> Vec<String> {
        variables.keys().cloned().collect()
    }
}

// ============================================================================
// SECTION: Path Reference
// ============================================================================

/// A pointer into the document plus an optional fallback variable.
///
/// # Invariants
/// - A missing fallback behaves as a literal-null fallback: the reference
///   resolves to unset rather than failing, unless `fail_on_unresolved`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathReference {
    /// Absolute or relative pointer to the referenced value.
    pub pointer: ValueReference,
    /// Variable consulted when the referenced value is unset.
    pub fallback: Option<Box<Variable>>,
}

impl PathReference {
    /// Parses the `{"$data": ..., "$fallback": ...}` object form.
    ///
    /// # Errors
    /// Returns [`ParseError::Keyword`] for non-string pointers, malformed
    /// pointer text, and `null` fallbacks.
    fn parse(map: &serde_json::Map<String, Value>) -> Result<Self, ParseError> {
        let pointer_text =
            map.get("$data").and_then(Value::as_str).ok_or_else(|| ParseError::Keyword {
                keyword: "$data".to_string(),
                detail: "pointer must be a string".to_string(),
            })?;
        let pointer = ValueReference::parse(pointer_text).map_err(|err| ParseError::Keyword {
            keyword: "$data".to_string(),
            detail: err.to_string(),
        })?;
        let fallback = parse_fallback_variable(map)?;
        Ok(Self {
            pointer,
            fallback,
        })
    }

    /// Resolves the reference per the documented order: violation check,
    /// document read, fallback chain, unresolved check.
    ///
    /// # Errors
    /// See [`Variable::resolve`].
    fn resolve(
        &self,
        scope: &ResolveScope<'_>,
        flags: ResolveFlags,
    ) -> Result<Option<Value>, ResolveError> {
        let Ok(absolute) = self.pointer.resolve(scope.path) else {
            // Climbing above the root is a runtime condition, not a parse
            // error: the reference is simply unresolvable here.
            return self.fall_back(scope, flags);
        };
        if flags.fail_on_violation && scope.collector.has_error_at(&absolute) {
            return Err(ResolveError::Violation {
                path: absolute.canonical(),
            });
        }
        match absolute.lookup(scope.document) {
            Some(value) if !value.is_null() => Ok(Some(value.clone())),
            _ => self.fall_back(scope, flags),
        }
    }

    /// Consults the fallback chain, then applies the unresolved flag.
    ///
    /// # Errors
    /// See [`Variable::resolve`].
    fn fall_back(
        &self,
        scope: &ResolveScope<'_>,
        flags: ResolveFlags,
    ) -> Result<Option<Value>, ResolveError> {
        if let Some(fallback) = &self.fallback {
            return fallback.resolve(scope, flags);
        }
        if flags.fail_on_unresolved {
            return Err(ResolveError::Unresolved {
                subject: self.pointer.to_string(),
            });
        }
        Ok(None)
    }
}

// ============================================================================
// SECTION: Calculation
// ============================================================================

/// An expression bound to named sub-variables, yielding a value.
///
/// # Invariants
/// - `fallback` is never `Value::Null`; parse rejects the ambiguity.
/// - Created once per schema node at compile time; expression text is
///   checked eagerly through the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    /// Expression text handed to the evaluator.
    pub expression: String,
    /// Named sub-variables bound into the expression.
    pub variables: BTreeMap<String, Variable>,
    /// Value used when the variables fail to resolve or the computed
    /// result is null.
    pub fallback: Option<Value>,
}

impl Calculation {
    /// Parses a calculation from its string shorthand or object form.
    ///
    /// # Errors
    /// Returns [`ParseError`] for non-string/non-object input and for the
    /// object-form defects described on [`Calculation::parse_object`].
    pub fn parse(raw: &Value) -> Result<Self, ParseError> {
        match raw {
            Value::String(expression) => Ok(Self {
                expression: expression.clone(),
                variables: BTreeMap::new(),
                fallback: None,
            }),
            Value::Object(map) => Self::parse_object(map),
            _ => Err(ParseError::Schema {
                detail: "calculation must be an expression string or an object".to_string(),
            }),
        }
    }

    /// Parses the `{"$expression": ..., "$variables": ..., "$fallback": ...}`
    /// object form.
    ///
    /// # Errors
    /// Returns [`ParseError`] for a missing or non-string `$expression`, a
    /// non-object `$variables`, an unparsable sub-variable, or a `null`
    /// fallback.
    fn parse_object(map: &serde_json::Map<String, Value>) -> Result<Self, ParseError> {
        let expression =
            map.get("$expression").and_then(Value::as_str).ok_or_else(|| ParseError::Keyword {
                keyword: "$expression".to_string(),
                detail: "expression must be a string".to_string(),
            })?;
        let mut variables = BTreeMap::new();
        if let Some(raw_variables) = map.get("$variables") {
            let Value::Object(entries) = raw_variables else {
                return Err(ParseError::Keyword {
                    keyword: "$variables".to_string(),
                    detail: "variable bindings must be an object".to_string(),
                });
            };
            for (name, raw) in entries {
                variables.insert(name.clone(), Variable::parse(raw)?);
            }
        }
        let fallback = parse_fallback_value(map)?;
        Ok(Self {
            expression: expression.to_string(),
            variables,
            fallback,
        })
    }

    /// Checks the expression text and declared bindings through the
    /// evaluator, failing fast at schema-compile time.
    ///
    /// # Errors
    /// Returns [`ParseError::Expression`] when the evaluator rejects the
    /// expression, and checks nested calculations recursively.
    pub fn check(&self, evaluator: &dyn ExpressionEvaluator) -> Result<(), ParseError> {
        let names = Variable::declared_names(&self.variables);
        evaluator.check(&self.expression, &names).map_err(|err| ParseError::Expression {
            expression: self.expression.clone(),
            detail: err.to_string(),
        })?;
        for variable in self.variables.values() {
            if let Variable::Computed(nested) = variable {
                nested.check(evaluator)?;
            }
        }
        Ok(())
    }

    /// Resolves the bound variables and evaluates the expression.
    ///
    /// Sub-variables resolve under forced strict flags; their unresolved and
    /// violation failures are caught iff a fallback exists. A computed
    /// result of null engages the fallback. Returns `None` when no value
    /// could be determined and no fallback exists.
    ///
    /// # Errors
    /// Propagates sub-variable failures when no fallback exists and
    /// evaluator runtime failures unconditionally.
    pub fn resolve(&self, scope: &ResolveScope<'_>) -> Result<Option<Value>, ResolveError> {
        let Some(evaluator) = scope.evaluator else {
            return Err(ResolveError::Expression {
                detail: "no expression evaluator is configured".to_string(),
            });
        };
        let mut bindings = BTreeMap::new();
        for (name, variable) in &self.variables {
            match variable.resolve(scope, ResolveFlags::STRICT) {
                Ok(Some(value)) => {
                    bindings.insert(name.clone(), value);
                }
                Ok(None) => {
                    if let Some(fallback) = &self.fallback {
                        return Ok(Some(fallback.clone()));
                    }
                    return Err(ResolveError::Unresolved {
                        subject: name.clone(),
                    });
                }
                Err(err @ ResolveError::Expression { .. }) => return Err(err),
                Err(err) => {
                    if let Some(fallback) = &self.fallback {
                        return Ok(Some(fallback.clone()));
                    }
                    return Err(err);
                }
            }
        }
        let result = evaluator.evaluate(&self.expression, &bindings).map_err(|err| {
            ResolveError::Expression {
                detail: err.to_string(),
            }
        })?;
        if result.is_null() {
            return Ok(self.fallback.clone());
        }
        Ok(Some(result))
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// An expression bound to named sub-variables, yielding a boolean.
///
/// # Invariants
/// - Evaluations carry no fallback; a `$fallback` member is a parse error.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Expression text handed to the evaluator.
    pub expression: String,
    /// Named sub-variables bound into the expression.
    pub variables: BTreeMap<String, Variable>,
}

impl Evaluation {
    /// Parses an evaluation from its string shorthand or object form.
    ///
    /// # Errors
    /// Returns [`ParseError`] for non-string/non-object input, a missing or
    /// non-string `$expression`, an unparsable sub-variable, or a
    /// `$fallback` member (evaluations carry none).
    pub fn parse(raw: &Value) -> Result<Self, ParseError> {
        match raw {
            Value::String(expression) => Ok(Self {
                expression: expression.clone(),
                variables: BTreeMap::new(),
            }),
            Value::Object(map) => {
                if map.contains_key("$fallback") {
                    return Err(ParseError::Keyword {
                        keyword: "$fallback".to_string(),
                        detail: "evaluations do not take a fallback".to_string(),
                    });
                }
                let calculation = Calculation::parse_object(map)?;
                Ok(Self {
                    expression: calculation.expression,
                    variables: calculation.variables,
                })
            }
            _ => Err(ParseError::Schema {
                detail: "evaluation must be an expression string or an object".to_string(),
            }),
        }
    }

    /// Checks the expression text and declared bindings through the
    /// evaluator.
    ///
    /// # Errors
    /// Returns [`ParseError::Expression`] when the evaluator rejects the
    /// expression.
    pub fn check(&self, evaluator: &dyn ExpressionEvaluator) -> Result<(), ParseError> {
        self.as_calculation().check(evaluator)
    }

    /// Resolves the bound variables, evaluates the expression, and reduces
    /// the result to a boolean (`null` and `false` are false, everything
    /// else is true).
    ///
    /// # Errors
    /// Propagates every sub-variable failure (evaluations have no fallback)
    /// and evaluator runtime failures.
    pub fn evaluate(&self, scope: &ResolveScope<'_>) -> Result<bool, ResolveError> {
        let Some(evaluator) = scope.evaluator else {
            return Err(ResolveError::Expression {
                detail: "no expression evaluator is configured".to_string(),
            });
        };
        let mut bindings = BTreeMap::new();
        for (name, variable) in &self.variables {
            let value = variable.resolve(scope, ResolveFlags::STRICT)?.ok_or_else(|| {
                ResolveError::Unresolved {
                    subject: name.clone(),
                }
            })?;
            bindings.insert(name.clone(), value);
        }
        let result = evaluator.evaluate(&self.expression, &bindings).map_err(|err| {
            ResolveError::Expression {
                detail: err.to_string(),
            }
        })?;
        Ok(!matches!(result, Value::Null | Value::Bool(false)))
    }

    /// Borrows this evaluation as a fallback-free calculation.
    fn as_calculation(&self) -> Calculation {
        Calculation {
            expression: self.expression.clone(),
            variables: self.variables.clone(),
            fallback: None,
        }
    }
}

// ============================================================================
// SECTION: Fallback Parsing
// ============================================================================

/// Parses an optional `$fallback` member as a variable.
///
/// # Errors
/// Returns [`ParseError::Keyword`] for an explicit `null` fallback, which is
/// ambiguous with "no fallback".
fn parse_fallback_variable(
    map: &serde_json::Map<String, Value>,
) -> Result<Option<Box<Variable>>, ParseError> {
    match map.get("$fallback") {
        None => Ok(None),
        Some(Value::Null) => Err(null_fallback_error()),
        Some(raw) => Ok(Some(Box::new(Variable::parse(raw)?))),
    }
}

/// Parses an optional `$fallback` member as a plain value.
///
/// # Errors
/// Returns [`ParseError::Keyword`] for an explicit `null` fallback.
fn parse_fallback_value(
    map: &serde_json::Map<String, Value>,
) -> Result<Option<Value>, ParseError> {
    match map.get("$fallback") {
        None => Ok(None),
        Some(Value::Null) => Err(null_fallback_error()),
        Some(raw) => Ok(Some(raw.clone())),
    }
}

/// The shared rejection for explicit `null` fallbacks.
fn null_fallback_error() -> ParseError {
    ParseError::Keyword {
        keyword: "$fallback".to_string(),
        detail: "fallback must not be null; omit it instead".to_string(),
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
    use super::Variable;

    #[test]
    fn null_is_not_a_variable() {
        assert!(matches!(Variable::parse(&json!(null)), Err(ParseError::Schema { .. })));
    }

    #[test]
    fn null_fallback_is_rejected() {
        let raw = json!({"$data": "/a", "$fallback": null});
        assert!(matches!(
            Variable::parse(&raw),
            Err(ParseError::Keyword { keyword, .. }) if keyword == "$fallback"
        ));
        let raw = json!({"$expression": "1", "$fallback": null});
        assert!(matches!(
            Variable::parse(&raw),
            Err(ParseError::Keyword { keyword, .. }) if keyword == "$fallback"
        ));
    }

    #[test]
    fn nested_nulls_inside_literals_are_plain_data() {
        let raw = json!({"values": [null, 1]});
        assert!(matches!(Variable::parse(&raw), Ok(Variable::Literal(_))));
    }

    #[test]
    fn reference_form_parses_with_fallback_chain() {
        let raw = json!({"$data": "/a", "$fallback": {"$data": "1/b", "$fallback": 7}});
        let Ok(Variable::Reference(reference)) = Variable::parse(&raw) else {
            panic!("expected a reference");
        };
        let Some(fallback) = reference.fallback else {
            panic!("expected a fallback");
        };
        assert!(matches!(*fallback, Variable::Reference(_)));
    }
}
