// crates/fieldgate-core/src/runtime/limit.rs
// ============================================================================
// Module: Limit-Validation Engine
// Description: Conditional per-node gate with declarative, pattern-matched
//              error suppression rules.
// Purpose: Decide per error whether to keep, discard, or merge it, based on
//          a speculatively evaluated condition and an ordered rule list.
// Dependencies: crate::core, crate::runtime::{context, schema}, serde_json.
// ============================================================================

//! ## Overview
//! A limit gate wraps the rest of its node's handlers. It evaluates its
//! condition sub-schema speculatively (side effects never land in the real
//! collector), then either passes handler errors through unchanged
//! (unmatched) or filters each individual error through an ordered rule
//! list and appends an optional extra schema's result (matched). A node
//! without its own condition inherits the nearest enclosing decision.
//!
//! Each rule carries three predicate schemas matched against the failing
//! keyword's name, its configured value, and the violating data value.
//! First match wins; no match keeps the error. Rule predicates and
//! conditions are themselves validated with gates disabled, so filtering
//! never applies to the validation calls the filter issues.
//!
//! Invariants:
//! - Filtering preserves the fan-out shape: zero survivors collapse to
//!   nothing, one survivor is promoted, two or more are rewrapped.
//! - Filtering is idempotent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::core::error::ParseError;
use crate::core::error::ValidationError;
use crate::runtime::context::Decision;
use crate::runtime::context::ValidationContext;
use crate::runtime::schema::Compiler;
use crate::runtime::schema::Schema;
use crate::runtime::schema::SchemaNode;

// ============================================================================
// SECTION: Default Rules
// ============================================================================

/// The built-in suppression rule set, active when `$limitValidation` omits
/// `rules`: discard `required` errors and `type` errors whose violating
/// value is null. These are the "still computing" sentinel cases; arbitrary
/// type mismatches stay reported.
#[must_use]
pub fn default_rule_set() -> Value {
    json!([
        {"keyword": {"const": "required"}, "keep": false},
        {"keyword": {"const": "type"}, "value": {"type": "null"}, "keep": false},
    ])
}

// ============================================================================
// SECTION: Limit Gate
// ============================================================================

/// Compiled form of one `$limitValidation` keyword.
///
/// # Invariants
/// - A missing condition means "inherit the nearest enclosing decision".
/// - Missing rules mean "use the validator's default rule set".
#[derive(Debug)]
pub struct LimitGate {
    /// Condition sub-schema evaluated speculatively, when present.
    condition: Option<Schema>,
    /// Gate-local rule list overriding the validator defaults.
    rules: Option<Vec<LimitRule>>,
    /// Extra schema validated after filtering, when present.
    extra: Option<Schema>,
}

impl LimitGate {
    /// The implicit gate applied to nodes without `$limitValidation`:
    /// inherit the enclosing decision, use the default rules.
    pub(crate) const INHERIT: Self = Self {
        condition: None,
        rules: None,
        extra: None,
    };

    /// Parses the `$limitValidation` value: a boolean or plain schema as
    /// condition shorthand, or the full config object (any of `condition`,
    /// `rules`, `schema`).
    ///
    /// # Errors
    /// Returns [`ParseError`] for malformed conditions, rules, or extra
    /// schemas.
    pub fn parse(raw: &Value, compiler: &Compiler<'_>) -> Result<Self, ParseError> {
        if let Value::Object(map) = raw {
            let is_config = ["condition", "rules", "schema"]
                .iter()
                .any(|key| map.contains_key(*key));
            if is_config {
                let condition =
                    map.get("condition").map(|c| compiler.compile(c)).transpose()?;
                let rules = map
                    .get("rules")
                    .map(|raw_rules| parse_rules(raw_rules, compiler))
                    .transpose()?;
                let extra = map.get("schema").map(|s| compiler.compile(s)).transpose()?;
                return Ok(Self {
                    condition,
                    rules,
                    extra,
                });
            }
        }
        Ok(Self {
            condition: Some(compiler.compile(raw)?),
            rules: None,
            extra: None,
        })
    }

    /// Applies the gate to one node visit.
    ///
    /// Runs the node's handlers under the computed decision, then filters
    /// and combines per the matched/unmatched outcome.
    pub(crate) fn apply(
        &self,
        node: &SchemaNode,
        ctx: &mut ValidationContext<'_>,
    ) -> Option<ValidationError> {
        let decision = match &self.condition {
            Some(condition) => {
                let matched = ctx
                    .speculative(|ctx| ctx.unfiltered(|ctx| condition.validate(ctx).is_none()));
                if matched { Decision::Matched } else { Decision::Unmatched }
            }
            None => ctx.decision(),
        };
        let error = ctx.with_decision(decision, |ctx| node.run_handlers(ctx));
        if decision == Decision::Unmatched {
            return error;
        }
        let filtered = match &self.rules {
            Some(rules) => error.and_then(|error| filter_error(error, rules, ctx)),
            None => {
                let rules = ctx.default_rules();
                error.and_then(|error| filter_error(error, rules, ctx))
            }
        };
        let extra_error = self
            .extra
            .as_ref()
            .and_then(|schema| ctx.with_decision(decision, |ctx| schema.validate(ctx)));
        match (filtered, extra_error) {
            (Some(kept), Some(extra)) => {
                Some(ValidationError::fan_out(ctx.path().clone(), vec![kept, extra]))
            }
            (Some(kept), None) => Some(kept),
            (None, Some(extra)) => Some(extra),
            (None, None) => None,
        }
    }
}

/// Parses the `rules` array of a gate config.
///
/// # Errors
/// Returns [`ParseError::Keyword`] for a non-array value or any malformed
/// rule.
fn parse_rules(raw: &Value, compiler: &Compiler<'_>) -> Result<Vec<LimitRule>, ParseError> {
    let Value::Array(items) = raw else {
        return Err(ParseError::Keyword {
            keyword: "$limitValidation".to_string(),
            detail: "rules must be an array".to_string(),
        });
    };
    items.iter().map(|item| LimitRule::parse(item, compiler)).collect()
}

// ============================================================================
// SECTION: Limit Rules
// ============================================================================

/// One declarative suppression rule.
///
/// # Invariants
/// - A rule matches only if all three predicate schemas accept their
///   inputs; omitted predicates default to accept-everything.
#[derive(Debug)]
pub struct LimitRule {
    /// Predicate over the failing keyword's name (as a JSON string).
    keyword: Schema,
    /// Predicate over the keyword's configured schema value.
    keyword_value: Schema,
    /// Predicate over the violating data value.
    value: Schema,
    /// Keep (`true`) or discard (`false`) a matched error.
    keep: bool,
}

impl LimitRule {
    /// Parses one rule object.
    ///
    /// # Errors
    /// Returns [`ParseError::Keyword`] for non-object rules or a missing
    /// boolean `keep`, and propagates predicate compilation failures.
    pub fn parse(raw: &Value, compiler: &Compiler<'_>) -> Result<Self, ParseError> {
        let Value::Object(map) = raw else {
            return Err(ParseError::Keyword {
                keyword: "$limitValidation".to_string(),
                detail: "each rule must be an object".to_string(),
            });
        };
        let keep = map.get("keep").and_then(Value::as_bool).ok_or_else(|| {
            ParseError::Keyword {
                keyword: "$limitValidation".to_string(),
                detail: "each rule requires a boolean keep decision".to_string(),
            }
        })?;
        let compile_predicate = |key: &str| -> Result<Schema, ParseError> {
            map.get(key).map_or(Ok(Schema::Bool(true)), |raw| compiler.compile(raw))
        };
        Ok(Self {
            keyword: compile_predicate("keyword")?,
            keyword_value: compile_predicate("keywordValue")?,
            value: compile_predicate("value")?,
            keep,
        })
    }

    /// Parses an entire rule-set array, for validator-level defaults.
    ///
    /// # Errors
    /// See [`LimitRule::parse`].
    pub fn parse_set(raw: &Value, compiler: &Compiler<'_>) -> Result<Vec<Self>, ParseError> {
        parse_rules(raw, compiler)
    }

    /// Returns `true` when all three predicates accept this error.
    fn matches(&self, error: &ValidationError, ctx: &ValidationContext<'_>) -> bool {
        let violating = error.path.lookup(ctx.document()).cloned().unwrap_or(Value::Null);
        schema_accepts(&self.keyword, &Value::String(error.keyword.clone()), ctx)
            && schema_accepts(&self.keyword_value, &error.keyword_value, ctx)
            && schema_accepts(&self.value, &violating, ctx)
    }
}

/// Evaluates a predicate schema against a detached copy of `value`, with
/// gates disabled so filtering cannot recurse into itself.
fn schema_accepts(schema: &Schema, value: &Value, ctx: &ValidationContext<'_>) -> bool {
    let mut probe = value.clone();
    let mut probe_ctx = ValidationContext::probe(&mut probe, ctx.evaluator());
    schema.validate(&mut probe_ctx).is_none()
}

// ============================================================================
// SECTION: Error Filtering
// ============================================================================

/// Filters one error tree through an ordered rule list.
///
/// Real keyword failures are decided by the first matching rule (keep or
/// discard; no match keeps). Fan-out nodes are filtered recursively: zero
/// survivors collapse to `None`, a single survivor is promoted in place of
/// the wrapper, two or more survivors are rewrapped as a fan-out node.
#[must_use]
pub fn filter_error(
    error: ValidationError,
    rules: &[LimitRule],
    ctx: &ValidationContext<'_>,
) -> Option<ValidationError> {
    if !error.is_fan_out() {
        for rule in rules {
            if rule.matches(&error, ctx) {
                return if rule.keep { Some(error) } else { None };
            }
        }
        return Some(error);
    }
    let path = error.path.clone();
    let survivors: Vec<ValidationError> = error
        .sub_errors
        .into_iter()
        .filter_map(|sub| filter_error(sub, rules, ctx))
        .collect();
    match survivors.len() {
        0 => None,
        1 => survivors.into_iter().next(),
        _ => Some(ValidationError::fan_out(path, survivors)),
    }
}
