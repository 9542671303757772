// crates/fieldgate-core/src/runtime/keywords/array.rs
// ============================================================================
// Module: Array Keywords
// Description: `items`, `minItems`, `maxItems`, and `uniqueItems` checks.
// Purpose: Apply element schemas and cardinality bounds to arrays.
// Dependencies: crate::core, crate::runtime::{context, keywords, schema},
//               serde_json.
// ============================================================================

//! ## Overview
//! `items` applies one schema to every element, descending with the
//! traversal cursor so element-level derivation and references see their
//! true absolute paths. Element errors are wrapped under a single `items`
//! error. Uniqueness is decimal-aware, consistent with `enum`. Non-array
//! values pass; the `type` keyword owns type mismatches.

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
use crate::runtime::keywords::number::json_equal;
use crate::runtime::keywords::rank;
use crate::runtime::schema::Compiler;
use crate::runtime::schema::Schema;

// ============================================================================
// SECTION: Items Keyword
// ============================================================================

/// Builds [`ItemsKeyword`] handlers from `items`.
#[derive(Debug, Clone, Copy)]
pub struct ItemsFactory;

impl KeywordFactory for ItemsFactory {
    fn keyword(&self) -> &str {
        "items"
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
        let Some(raw) = node.get("items") else {
            return Ok(None);
        };
        let schema = compiler.compile(raw)?;
        Ok(Some(Box::new(ItemsKeyword {
            schema,
        })))
    }
}

/// Applies one schema to every array element.
struct ItemsKeyword {
    /// The element schema.
    schema: Schema,
}

impl Keyword for ItemsKeyword {
    fn name(&self) -> &str {
        "items"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let length = match ctx.current() {
            Some(Value::Array(items)) => items.len(),
            _ => return Verdict::pass(),
        };
        let mut errors = Vec::new();
        for index in 0..length {
            if ctx.budget_exhausted() {
                break;
            }
            if let Some(error) = ctx.scoped_index(index, |ctx| self.schema.validate(ctx)) {
                errors.push(error);
            }
        }
        if errors.is_empty() {
            return Verdict::pass();
        }
        Verdict::fail(
            ValidationError::new("items", ctx.path().clone(), "one or more elements failed validation")
                .with_sub_errors(errors),
        )
    }
}

// ============================================================================
// SECTION: Count Keywords
// ============================================================================

/// Builds one array cardinality handler; instantiated once per keyword.
#[derive(Debug, Clone, Copy)]
pub struct CountFactory {
    /// The keyword this instance recognizes.
    name: &'static str,
    /// `true` for `minItems`, `false` for `maxItems`.
    lower: bool,
}

impl CountFactory {
    /// The `minItems` keyword.
    #[must_use]
    pub const fn min_items() -> Self {
        Self {
            name: "minItems",
            lower: true,
        }
    }

    /// The `maxItems` keyword.
    #[must_use]
    pub const fn max_items() -> Self {
        Self {
            name: "maxItems",
            lower: false,
        }
    }
}

impl KeywordFactory for CountFactory {
    fn keyword(&self) -> &str {
        self.name
    }

    fn rank(&self) -> u8 {
        rank::BOUNDS
    }

    fn parse(
        &self,
        node: &Map<String, Value>,
        _scope: &ParseScope,
        _compiler: &Compiler<'_>,
    ) -> Result<Option<Box<dyn Keyword>>, ParseError> {
        let Some(raw) = node.get(self.name) else {
            return Ok(None);
        };
        let Some(limit) = raw.as_u64() else {
            return Err(ParseError::Keyword {
                keyword: self.name.to_string(),
                detail: "cardinality bound must be a non-negative integer".to_string(),
            });
        };
        Ok(Some(Box::new(CountKeyword {
            name: self.name,
            lower: self.lower,
            limit,
        })))
    }
}

/// Checks an array cardinality bound.
struct CountKeyword {
    /// The keyword name reported on failure.
    name: &'static str,
    /// `true` for lower bounds.
    lower: bool,
    /// The configured limit.
    limit: u64,
}

impl Keyword for CountKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let Some(Value::Array(items)) = ctx.current() else {
            return Verdict::pass();
        };
        let length = u64::try_from(items.len()).unwrap_or(u64::MAX);
        let violated = if self.lower { length < self.limit } else { length > self.limit };
        if !violated {
            return Verdict::pass();
        }
        let message = if self.lower {
            "array has fewer elements than allowed"
        } else {
            "array has more elements than allowed"
        };
        Verdict::fail(
            ValidationError::new(self.name, ctx.path().clone(), message)
                .with_keyword_value(json!(self.limit))
                .with_arg("actual", json!(length)),
        )
    }
}

// ============================================================================
// SECTION: Unique Items Keyword
// ============================================================================

/// Builds [`UniqueItemsKeyword`] handlers from `uniqueItems`.
#[derive(Debug, Clone, Copy)]
pub struct UniqueItemsFactory;

impl KeywordFactory for UniqueItemsFactory {
    fn keyword(&self) -> &str {
        "uniqueItems"
    }

    fn rank(&self) -> u8 {
        rank::BOUNDS
    }

    fn parse(
        &self,
        node: &Map<String, Value>,
        _scope: &ParseScope,
        _compiler: &Compiler<'_>,
    ) -> Result<Option<Box<dyn Keyword>>, ParseError> {
        let Some(raw) = node.get("uniqueItems") else {
            return Ok(None);
        };
        let Some(unique) = raw.as_bool() else {
            return Err(ParseError::Keyword {
                keyword: "uniqueItems".to_string(),
                detail: "value must be a boolean".to_string(),
            });
        };
        if !unique {
            return Ok(None);
        }
        Ok(Some(Box::new(UniqueItemsKeyword)))
    }
}

/// Rejects arrays with decimal-aware duplicate elements.
struct UniqueItemsKeyword;

impl Keyword for UniqueItemsKeyword {
    fn name(&self) -> &str {
        "uniqueItems"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let Some(Value::Array(items)) = ctx.current() else {
            return Verdict::pass();
        };
        for (index, item) in items.iter().enumerate() {
            if items[..index].iter().any(|earlier| json_equal(earlier, item)) {
                return Verdict::fail(
                    ValidationError::new(
                        "uniqueItems",
                        ctx.path().clone(),
                        "array elements are not unique",
                    )
                    .with_keyword_value(json!(true))
                    .with_arg("duplicateIndex", json!(index)),
                );
            }
        }
        Verdict::pass()
    }
}
