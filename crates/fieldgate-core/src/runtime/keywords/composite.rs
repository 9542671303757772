// crates/fieldgate-core/src/runtime/keywords/composite.rs
// ============================================================================
// Module: Composition Keywords
// Description: `allOf`, `anyOf`, `oneOf`, and `not` applicators.
// Purpose: Combine alternative and conjunctive sub-schemas at one location.
// Dependencies: crate::core, crate::runtime::{context, keywords, schema},
//               serde_json.
// ============================================================================

//! ## Overview
//! `allOf` branches validate in place: their side effects (derived values,
//! recorded errors) are real. `anyOf`, `oneOf`, and `not` evaluate their
//! branches speculatively, because a rejected alternative's errors must not
//! pollute the collector; document mutations made by a branch are not
//! rolled back (single shared document, no copy-on-write).
//!
//! `anyOf` and `oneOf` report one error carrying the branch failures as
//! sub-errors; both keywords sit in the collector's default extra-leaf set,
//! so the index treats them as atomic.

// ============================================================================
// SECTION: Imports
// ============================================================================

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

/// Compiles the branch list of a composition keyword.
///
/// # Errors
/// Returns [`ParseError::Keyword`] for a non-array value or an empty list,
/// and propagates branch compilation failures.
fn parse_branches(
    keyword: &str,
    raw: &Value,
    compiler: &Compiler<'_>,
) -> Result<Vec<Schema>, ParseError> {
    let Value::Array(items) = raw else {
        return Err(ParseError::Keyword {
            keyword: keyword.to_string(),
            detail: "value must be an array of schemas".to_string(),
        });
    };
    if items.is_empty() {
        return Err(ParseError::Keyword {
            keyword: keyword.to_string(),
            detail: "at least one branch schema is required".to_string(),
        });
    }
    items.iter().map(|item| compiler.compile(item)).collect()
}

// ============================================================================
// SECTION: All Of
// ============================================================================

/// Builds [`AllOfKeyword`] handlers from `allOf`.
#[derive(Debug, Clone, Copy)]
pub struct AllOfFactory;

impl KeywordFactory for AllOfFactory {
    fn keyword(&self) -> &str {
        "allOf"
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
        let Some(raw) = node.get("allOf") else {
            return Ok(None);
        };
        Ok(Some(Box::new(AllOfKeyword {
            branches: parse_branches("allOf", raw, compiler)?,
        })))
    }
}

/// Requires every branch to accept the current value.
struct AllOfKeyword {
    /// Conjunctive branch schemas.
    branches: Vec<Schema>,
}

impl Keyword for AllOfKeyword {
    fn name(&self) -> &str {
        "allOf"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let mut errors = Vec::new();
        for branch in &self.branches {
            if ctx.budget_exhausted() {
                break;
            }
            if let Some(error) = branch.validate(ctx) {
                errors.push(error);
            }
        }
        if errors.is_empty() {
            return Verdict::pass();
        }
        Verdict::fail(
            ValidationError::new("allOf", ctx.path().clone(), "one or more branches rejected the value")
                .with_sub_errors(errors),
        )
    }
}

// ============================================================================
// SECTION: Any Of
// ============================================================================

/// Builds [`AnyOfKeyword`] handlers from `anyOf`.
#[derive(Debug, Clone, Copy)]
pub struct AnyOfFactory;

impl KeywordFactory for AnyOfFactory {
    fn keyword(&self) -> &str {
        "anyOf"
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
        let Some(raw) = node.get("anyOf") else {
            return Ok(None);
        };
        Ok(Some(Box::new(AnyOfKeyword {
            branches: parse_branches("anyOf", raw, compiler)?,
        })))
    }
}

/// Requires at least one branch to accept the current value.
struct AnyOfKeyword {
    /// Alternative branch schemas.
    branches: Vec<Schema>,
}

impl Keyword for AnyOfKeyword {
    fn name(&self) -> &str {
        "anyOf"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let mut errors = Vec::new();
        for branch in &self.branches {
            match ctx.speculative(|ctx| branch.validate(ctx)) {
                None => return Verdict::pass(),
                Some(error) => errors.push(error),
            }
        }
        Verdict::fail(
            ValidationError::new("anyOf", ctx.path().clone(), "no alternative accepted the value")
                .with_sub_errors(errors),
        )
    }
}

// ============================================================================
// SECTION: One Of
// ============================================================================

/// Builds [`OneOfKeyword`] handlers from `oneOf`.
#[derive(Debug, Clone, Copy)]
pub struct OneOfFactory;

impl KeywordFactory for OneOfFactory {
    fn keyword(&self) -> &str {
        "oneOf"
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
        let Some(raw) = node.get("oneOf") else {
            return Ok(None);
        };
        Ok(Some(Box::new(OneOfKeyword {
            branches: parse_branches("oneOf", raw, compiler)?,
        })))
    }
}

/// Requires exactly one branch to accept the current value.
struct OneOfKeyword {
    /// Alternative branch schemas.
    branches: Vec<Schema>,
}

impl Keyword for OneOfKeyword {
    fn name(&self) -> &str {
        "oneOf"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let mut matched = 0_usize;
        let mut errors = Vec::new();
        for branch in &self.branches {
            match ctx.speculative(|ctx| branch.validate(ctx)) {
                None => matched += 1,
                Some(error) => errors.push(error),
            }
        }
        if matched == 1 {
            return Verdict::pass();
        }
        let message = if matched == 0 {
            "no alternative accepted the value"
        } else {
            "more than one alternative accepted the value"
        };
        let sub_errors = if matched == 0 { errors } else { Vec::new() };
        Verdict::fail(
            ValidationError::new("oneOf", ctx.path().clone(), message)
                .with_arg("matched", json!(matched))
                .with_sub_errors(sub_errors),
        )
    }
}

// ============================================================================
// SECTION: Not
// ============================================================================

/// Builds [`NotKeyword`] handlers from `not`.
#[derive(Debug, Clone, Copy)]
pub struct NotFactory;

impl KeywordFactory for NotFactory {
    fn keyword(&self) -> &str {
        "not"
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
        let Some(raw) = node.get("not") else {
            return Ok(None);
        };
        Ok(Some(Box::new(NotKeyword {
            schema: compiler.compile(raw)?,
        })))
    }
}

/// Requires the sub-schema to reject the current value.
struct NotKeyword {
    /// The negated schema.
    schema: Schema,
}

impl Keyword for NotKeyword {
    fn name(&self) -> &str {
        "not"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let accepted = ctx.speculative(|ctx| self.schema.validate(ctx).is_none());
        if !accepted {
            return Verdict::pass();
        }
        Verdict::fail(ValidationError::new(
            "not",
            ctx.path().clone(),
            "value matches the negated schema",
        ))
    }
}
