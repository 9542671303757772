// crates/fieldgate-core/src/runtime/keywords/number.rs
// ============================================================================
// Module: Numeric Bound Keywords
// Description: `minimum`, `maximum`, `exclusiveMinimum`, `exclusiveMaximum`
//              with decimal-aware comparison helpers.
// Purpose: Order numeric JSON values deterministically regardless of their
//          integer or floating representation.
// Dependencies: crate::core, crate::runtime::{context, keywords, schema},
//               bigdecimal, serde_json.
// ============================================================================

//! ## Overview
//! JSON numbers mix integer and floating representations; comparing their
//! native forms misorders values like `1e2` and `100`. Bounds here parse
//! both sides into `BigDecimal` via their stable string rendering, so
//! ordering and equality are exact. Non-numeric values pass: the `type`
//! keyword owns type mismatches.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

use crate::core::error::ParseError;
use crate::core::error::ValidationError;
use crate::runtime::context::ValidationContext;
use crate::runtime::keywords::Keyword;
use crate::runtime::keywords::KeywordFactory;
use crate::runtime::keywords::ParseScope;
use crate::runtime::keywords::Verdict;
use crate::runtime::keywords::rank;
use crate::runtime::schema::Compiler;

// ============================================================================
// SECTION: Decimal Helpers
// ============================================================================

/// Parses a JSON number into `BigDecimal` via its string rendering.
pub(crate) fn decimal_from_number(number: &Number) -> Option<BigDecimal> {
    let rendered = number.to_string();
    BigDecimal::from_str(&rendered).ok()
}

/// Orders two JSON numbers with decimal-aware comparison.
pub(crate) fn decimal_cmp(left: &Number, right: &Number) -> Option<Ordering> {
    let left = decimal_from_number(left)?;
    let right = decimal_from_number(right)?;
    Some(left.cmp(&right))
}

/// Compares JSON values for equality with decimal-aware numeric handling.
pub(crate) fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left_num), Value::Number(right_num)) => {
            decimal_cmp(left_num, right_num) == Some(Ordering::Equal)
        }
        (Value::Array(left_items), Value::Array(right_items)) => {
            left_items.len() == right_items.len()
                && left_items.iter().zip(right_items).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(left_map), Value::Object(right_map)) => {
            left_map.len() == right_map.len()
                && left_map.iter().all(|(key, a)| {
                    right_map.get(key).is_some_and(|b| json_equal(a, b))
                })
        }
        _ => left == right,
    }
}

// ============================================================================
// SECTION: Factory
// ============================================================================

/// Which side of the range a bound guards, and whether it is strict.
#[derive(Debug, Clone, Copy)]
struct BoundKind {
    /// `true` for lower bounds, `false` for upper bounds.
    lower: bool,
    /// Equality with the limit is also a violation.
    exclusive: bool,
}

/// Builds one numeric bound handler; instantiated once per keyword.
#[derive(Debug, Clone, Copy)]
pub struct BoundFactory {
    /// The keyword this instance recognizes.
    name: &'static str,
    /// The guarded side and strictness.
    kind: BoundKind,
}

impl BoundFactory {
    /// The `minimum` keyword.
    #[must_use]
    pub const fn minimum() -> Self {
        Self {
            name: "minimum",
            kind: BoundKind {
                lower: true,
                exclusive: false,
            },
        }
    }

    /// The `maximum` keyword.
    #[must_use]
    pub const fn maximum() -> Self {
        Self {
            name: "maximum",
            kind: BoundKind {
                lower: false,
                exclusive: false,
            },
        }
    }

    /// The `exclusiveMinimum` keyword.
    #[must_use]
    pub const fn exclusive_minimum() -> Self {
        Self {
            name: "exclusiveMinimum",
            kind: BoundKind {
                lower: true,
                exclusive: true,
            },
        }
    }

    /// The `exclusiveMaximum` keyword.
    #[must_use]
    pub const fn exclusive_maximum() -> Self {
        Self {
            name: "exclusiveMaximum",
            kind: BoundKind {
                lower: false,
                exclusive: true,
            },
        }
    }
}

impl KeywordFactory for BoundFactory {
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
        let Value::Number(limit) = raw else {
            return Err(ParseError::Keyword {
                keyword: self.name.to_string(),
                detail: "bound must be a number".to_string(),
            });
        };
        Ok(Some(Box::new(BoundKeyword {
            name: self.name,
            kind: self.kind,
            limit: limit.clone(),
        })))
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Checks one numeric bound against the current value.
struct BoundKeyword {
    /// The keyword name reported on failure.
    name: &'static str,
    /// The guarded side and strictness.
    kind: BoundKind,
    /// The configured limit.
    limit: Number,
}

impl Keyword for BoundKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let Some(Value::Number(actual)) = ctx.current() else {
            return Verdict::pass();
        };
        let Some(ordering) = decimal_cmp(actual, &self.limit) else {
            return Verdict::pass();
        };
        let violated = if self.kind.lower {
            ordering == Ordering::Less || (self.kind.exclusive && ordering == Ordering::Equal)
        } else {
            ordering == Ordering::Greater || (self.kind.exclusive && ordering == Ordering::Equal)
        };
        if !violated {
            return Verdict::pass();
        }
        let actual = actual.clone();
        let message = if self.kind.lower {
            "value is below the allowed minimum"
        } else {
            "value is above the allowed maximum"
        };
        Verdict::fail(
            ValidationError::new(self.name, ctx.path().clone(), message)
                .with_keyword_value(Value::Number(self.limit.clone()))
                .with_arg("actual", Value::Number(actual)),
        )
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
