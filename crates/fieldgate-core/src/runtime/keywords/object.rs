// crates/fieldgate-core/src/runtime/keywords/object.rs
// ============================================================================
// Module: Object Keywords
// Description: `properties`, `additionalProperties`, and `required` checks.
// Purpose: Descend into declared members, police undeclared ones, and check
//          presence after derivation has had a chance to run.
// Dependencies: crate::core, crate::runtime::{context, keywords, schema},
//               serde_json.
// ============================================================================

//! ## Overview
//! `properties` descends into a declared member when the member is present
//! or its sub-schema derives a value, so `$calculate` can create members
//! that do not exist yet. `required` runs after the applicators and skips
//! names whose sub-schema in the same node carries an active `$calculate`:
//! derivation reports its own failure, and double-reporting a missing
//! derived member would blame the wrong keyword. That interaction is
//! deliberately narrow; composition keywords do not propagate requiredness.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::core::error::ParseError;
use crate::core::error::ValidationError;
use crate::runtime::context::ValidationContext;
use crate::runtime::keywords::Keyword;
use crate::runtime::keywords::KeywordFactory;
use crate::runtime::keywords::ParseScope;
use crate::runtime::keywords::Verdict;
use crate::runtime::keywords::rank;
use crate::runtime::schema::Compiler;
use crate::runtime::schema::Schema;

// ============================================================================
// SECTION: Shared Parsing
// ============================================================================

/// Reads the node's `required` array as a name list, tolerating absence.
fn required_names(node: &Map<String, Value>) -> Vec<String> {
    node.get("required")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(ToString::to_string).collect())
        .unwrap_or_default()
}

/// Returns `true` when a raw member sub-schema carries an active
/// `$calculate` (the keyword is present and an evaluator is configured).
fn member_derives(raw: &Value, compiler: &Compiler<'_>) -> bool {
    compiler.evaluator().is_some()
        && matches!(raw, Value::Object(map) if map.contains_key("$calculate"))
}

// ============================================================================
// SECTION: Properties Keyword
// ============================================================================

/// Builds [`PropertiesKeyword`] handlers from `properties`.
#[derive(Debug, Clone, Copy)]
pub struct PropertiesFactory;

impl KeywordFactory for PropertiesFactory {
    fn keyword(&self) -> &str {
        "properties"
    }

    fn rank(&self) -> u8 {
        rank::APPLICATOR
    }

    fn parse(
        &self,
        node: &Map<String, Value>,
        _scope: &ParseScope,
        compiler: &Compiler<'_>,
    ) -> Result<Option<Box<dyn Keyword>>, ParseError> {
        let Some(raw) = node.get("properties") else {
            return Ok(None);
        };
        let Value::Object(entries) = raw else {
            return Err(ParseError::Keyword {
                keyword: "properties".to_string(),
                detail: "value must be an object of member schemas".to_string(),
            });
        };
        let required = required_names(node);
        let mut members = Vec::with_capacity(entries.len());
        for (name, member_raw) in entries {
            let schema =
                compiler.compile_member(member_raw, required.iter().any(|req| req == name))?;
            members.push((name.clone(), schema));
        }
        Ok(Some(Box::new(PropertiesKeyword {
            members,
        })))
    }
}

/// Applies member schemas to declared object members.
struct PropertiesKeyword {
    /// Member schemas in declaration order.
    members: Vec<(String, Schema)>,
}

impl Keyword for PropertiesKeyword {
    fn name(&self) -> &str {
        "properties"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        if !matches!(ctx.current(), Some(Value::Object(_))) {
            return Verdict::pass();
        }
        let mut errors = Vec::new();
        for (name, schema) in &self.members {
            if ctx.budget_exhausted() {
                break;
            }
            let present = matches!(
                ctx.current(),
                Some(Value::Object(map)) if map.contains_key(name)
            );
            if !present && !schema.derives() {
                continue;
            }
            if let Some(error) = ctx.scoped_member(name, |ctx| schema.validate(ctx)) {
                errors.push(error);
            }
        }
        if errors.is_empty() {
            return Verdict::pass();
        }
        Verdict::fail(
            ValidationError::new(
                "properties",
                ctx.path().clone(),
                "one or more members failed validation",
            )
            .with_sub_errors(errors),
        )
    }
}

// ============================================================================
// SECTION: Additional Properties Keyword
// ============================================================================

/// Builds [`AdditionalPropertiesKeyword`] handlers from
/// `additionalProperties`.
#[derive(Debug, Clone, Copy)]
pub struct AdditionalPropertiesFactory;

impl KeywordFactory for AdditionalPropertiesFactory {
    fn keyword(&self) -> &str {
        "additionalProperties"
    }

    fn rank(&self) -> u8 {
        rank::APPLICATOR
    }

    fn parse(
        &self,
        node: &Map<String, Value>,
        _scope: &ParseScope,
        compiler: &Compiler<'_>,
    ) -> Result<Option<Box<dyn Keyword>>, ParseError> {
        let Some(raw) = node.get("additionalProperties") else {
            return Ok(None);
        };
        let declared: BTreeSet<String> = node
            .get("properties")
            .and_then(Value::as_object)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        let schema = compiler.compile(raw)?;
        Ok(Some(Box::new(AdditionalPropertiesKeyword {
            declared,
            schema,
        })))
    }
}

/// Applies a schema to members not declared under `properties`.
struct AdditionalPropertiesKeyword {
    /// Members declared in the sibling `properties`.
    declared: BTreeSet<String>,
    /// Schema applied to the remaining members.
    schema: Schema,
}

impl Keyword for AdditionalPropertiesKeyword {
    fn name(&self) -> &str {
        "additionalProperties"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let undeclared: Vec<String> = match ctx.current() {
            Some(Value::Object(map)) => map
                .keys()
                .filter(|name| !self.declared.contains(*name))
                .cloned()
                .collect(),
            _ => return Verdict::pass(),
        };
        let mut errors = Vec::new();
        for name in &undeclared {
            if ctx.budget_exhausted() {
                break;
            }
            if let Some(error) = ctx.scoped_member(name, |ctx| self.schema.validate(ctx)) {
                errors.push(error);
            }
        }
        if errors.is_empty() {
            return Verdict::pass();
        }
        Verdict::fail(
            ValidationError::new(
                "additionalProperties",
                ctx.path().clone(),
                "one or more undeclared members failed validation",
            )
            .with_sub_errors(errors),
        )
    }
}

// ============================================================================
// SECTION: Required Keyword
// ============================================================================

/// Builds [`RequiredKeyword`] handlers from `required`.
#[derive(Debug, Clone, Copy)]
pub struct RequiredFactory;

impl KeywordFactory for RequiredFactory {
    fn keyword(&self) -> &str {
        "required"
    }

    fn rank(&self) -> u8 {
        rank::REQUIRED
    }

    fn parse(
        &self,
        node: &Map<String, Value>,
        _scope: &ParseScope,
        compiler: &Compiler<'_>,
    ) -> Result<Option<Box<dyn Keyword>>, ParseError> {
        let Some(raw) = node.get("required") else {
            return Ok(None);
        };
        let Value::Array(items) = raw else {
            return Err(ParseError::Keyword {
                keyword: "required".to_string(),
                detail: "value must be an array of member names".to_string(),
            });
        };
        let mut names = Vec::with_capacity(items.len());
        for item in items {
            let Some(name) = item.as_str() else {
                return Err(ParseError::Keyword {
                    keyword: "required".to_string(),
                    detail: "member names must be strings".to_string(),
                });
            };
            names.push(name.to_string());
        }
        let derived: BTreeSet<String> = node
            .get("properties")
            .and_then(Value::as_object)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, member_raw)| member_derives(member_raw, compiler))
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Some(Box::new(RequiredKeyword {
            names,
            derived,
            raw: raw.clone(),
        })))
    }
}

/// Checks member presence, skipping derived members.
struct RequiredKeyword {
    /// Names that must be present.
    names: Vec<String>,
    /// Names whose sub-schema derives its own value; their absence is
    /// reported by `$calculate`, not here.
    derived: BTreeSet<String>,
    /// The configured keyword value, for rule matching.
    raw: Value,
}

impl Keyword for RequiredKeyword {
    fn name(&self) -> &str {
        "required"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let Some(Value::Object(map)) = ctx.current() else {
            return Verdict::pass();
        };
        let missing: Vec<&String> = self
            .names
            .iter()
            .filter(|name| !map.contains_key(*name) && !self.derived.contains(*name))
            .collect();
        if missing.is_empty() {
            return Verdict::pass();
        }
        Verdict::fail(
            ValidationError::new("required", ctx.path().clone(), "required members are missing")
                .with_keyword_value(self.raw.clone())
                .with_arg("missing", json!(missing)),
        )
    }
}
