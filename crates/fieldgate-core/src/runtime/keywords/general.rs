// crates/fieldgate-core/src/runtime/keywords/general.rs
// ============================================================================
// Module: General Keywords
// Description: `type`, `enum`, and `const` checks.
// Purpose: Guard the shape and identity of the current value before the
//          more specific keywords run.
// Dependencies: crate::core, crate::runtime::{context, keywords, schema},
//               serde_json.
// ============================================================================

//! ## Overview
//! The general keywords run after derivation, so a value injected by
//! `$calculate` is checked in its final form. `integer` accepts any number
//! with a zero fractional part, matching the decimal-aware treatment used
//! by the bound keywords. Equality for `enum` and `const` is decimal-aware
//! for the same reason.

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

// ============================================================================
// SECTION: Type Names
// ============================================================================

/// One admissible type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeName {
    /// JSON null.
    Null,
    /// JSON booleans.
    Boolean,
    /// JSON objects.
    Object,
    /// JSON arrays.
    Array,
    /// Any JSON number.
    NumberType,
    /// Numbers with a zero fractional part.
    Integer,
    /// JSON strings.
    StringType,
}

impl TypeName {
    /// Parses one type name string.
    fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "number" => Some(Self::NumberType),
            "integer" => Some(Self::Integer),
            "string" => Some(Self::StringType),
            _ => None,
        }
    }

    /// Returns `true` when `value` belongs to this type.
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Null => value.is_null(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::NumberType => value.is_number(),
            Self::Integer => value.as_number().is_some_and(|number| {
                number.is_i64()
                    || number.is_u64()
                    || number.as_f64().is_some_and(|float| float.fract() == 0.0)
            }),
            Self::StringType => value.is_string(),
        }
    }
}

/// Names the actual type of a value, for error messages.
fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SECTION: Type Keyword
// ============================================================================

/// Builds [`TypeKeyword`] handlers from `type`.
#[derive(Debug, Clone, Copy)]
pub struct TypeFactory;

impl KeywordFactory for TypeFactory {
    fn keyword(&self) -> &str {
        "type"
    }

    fn rank(&self) -> u8 {
        rank::GENERAL
    }

    fn parse(
        &self,
        node: &Map<String, Value>,
        _scope: &ParseScope,
        _compiler: &Compiler<'_>,
    ) -> Result<Option<Box<dyn Keyword>>, ParseError> {
        let Some(raw) = node.get("type") else {
            return Ok(None);
        };
        let names: Vec<&str> = match raw {
            Value::String(name) => vec![name.as_str()],
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        if names.is_empty() {
            return Err(ParseError::Keyword {
                keyword: "type".to_string(),
                detail: "value must be a type name or an array of type names".to_string(),
            });
        }
        let mut allowed = Vec::with_capacity(names.len());
        for name in names {
            allowed.push(TypeName::parse(name).ok_or_else(|| ParseError::Keyword {
                keyword: "type".to_string(),
                detail: format!("unknown type name {name:?}"),
            })?);
        }
        Ok(Some(Box::new(TypeKeyword {
            allowed,
            raw: raw.clone(),
        })))
    }
}

/// Checks the current value against the admissible types.
struct TypeKeyword {
    /// Admissible types.
    allowed: Vec<TypeName>,
    /// The configured keyword value, for rule matching.
    raw: Value,
}

impl Keyword for TypeKeyword {
    fn name(&self) -> &str {
        "type"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let Some(value) = ctx.current() else {
            return Verdict::pass();
        };
        if self.allowed.iter().any(|name| name.matches(value)) {
            return Verdict::pass();
        }
        let actual = type_of(value);
        Verdict::fail(
            ValidationError::new("type", ctx.path().clone(), "value has the wrong type")
                .with_keyword_value(self.raw.clone())
                .with_arg("actual", json!(actual)),
        )
    }
}

// ============================================================================
// SECTION: Enum Keyword
// ============================================================================

/// Builds [`EnumKeyword`] handlers from `enum`.
#[derive(Debug, Clone, Copy)]
pub struct EnumFactory;

impl KeywordFactory for EnumFactory {
    fn keyword(&self) -> &str {
        "enum"
    }

    fn rank(&self) -> u8 {
        rank::GENERAL
    }

    fn parse(
        &self,
        node: &Map<String, Value>,
        _scope: &ParseScope,
        _compiler: &Compiler<'_>,
    ) -> Result<Option<Box<dyn Keyword>>, ParseError> {
        let Some(raw) = node.get("enum") else {
            return Ok(None);
        };
        let Value::Array(options) = raw else {
            return Err(ParseError::Keyword {
                keyword: "enum".to_string(),
                detail: "value must be an array of admissible values".to_string(),
            });
        };
        Ok(Some(Box::new(EnumKeyword {
            options: options.clone(),
        })))
    }
}

/// Checks the current value against an explicit admissible set.
struct EnumKeyword {
    /// Admissible values.
    options: Vec<Value>,
}

impl Keyword for EnumKeyword {
    fn name(&self) -> &str {
        "enum"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let Some(value) = ctx.current() else {
            return Verdict::pass();
        };
        if self.options.iter().any(|option| json_equal(option, value)) {
            return Verdict::pass();
        }
        Verdict::fail(
            ValidationError::new("enum", ctx.path().clone(), "value is not one of the admissible values")
                .with_keyword_value(Value::Array(self.options.clone())),
        )
    }
}

// ============================================================================
// SECTION: Const Keyword
// ============================================================================

/// Builds [`ConstKeyword`] handlers from `const`.
#[derive(Debug, Clone, Copy)]
pub struct ConstFactory;

impl KeywordFactory for ConstFactory {
    fn keyword(&self) -> &str {
        "const"
    }

    fn rank(&self) -> u8 {
        rank::GENERAL
    }

    fn parse(
        &self,
        node: &Map<String, Value>,
        _scope: &ParseScope,
        _compiler: &Compiler<'_>,
    ) -> Result<Option<Box<dyn Keyword>>, ParseError> {
        let Some(raw) = node.get("const") else {
            return Ok(None);
        };
        Ok(Some(Box::new(ConstKeyword {
            expected: raw.clone(),
        })))
    }
}

/// Checks the current value against one expected value.
struct ConstKeyword {
    /// The expected value.
    expected: Value,
}

impl Keyword for ConstKeyword {
    fn name(&self) -> &str {
        "const"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let Some(value) = ctx.current() else {
            return Verdict::pass();
        };
        if json_equal(&self.expected, value) {
            return Verdict::pass();
        }
        Verdict::fail(
            ValidationError::new("const", ctx.path().clone(), "value does not equal the expected value")
                .with_keyword_value(self.expected.clone()),
        )
    }
}
