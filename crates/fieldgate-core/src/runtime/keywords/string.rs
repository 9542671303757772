// crates/fieldgate-core/src/runtime/keywords/string.rs
// ============================================================================
// Module: String Keywords
// Description: `minLength`, `maxLength`, and `pattern` checks.
// Purpose: Bound and shape string values.
// Dependencies: crate::core, crate::runtime::{context, keywords, schema},
//               regex, serde_json.
// ============================================================================

//! ## Overview
//! Lengths count Unicode scalar values, not bytes. Patterns compile at
//! schema-parse time so a malformed regex fails the schema, not the data.
//! Non-string values pass; the `type` keyword owns type mismatches.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
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

// ============================================================================
// SECTION: Length Keywords
// ============================================================================

/// Builds one string length handler; instantiated once per keyword.
#[derive(Debug, Clone, Copy)]
pub struct LengthFactory {
    /// The keyword this instance recognizes.
    name: &'static str,
    /// `true` for `minLength`, `false` for `maxLength`.
    lower: bool,
}

impl LengthFactory {
    /// The `minLength` keyword.
    #[must_use]
    pub const fn min_length() -> Self {
        Self {
            name: "minLength",
            lower: true,
        }
    }

    /// The `maxLength` keyword.
    #[must_use]
    pub const fn max_length() -> Self {
        Self {
            name: "maxLength",
            lower: false,
        }
    }
}

impl KeywordFactory for LengthFactory {
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
                detail: "length bound must be a non-negative integer".to_string(),
            });
        };
        Ok(Some(Box::new(LengthKeyword {
            name: self.name,
            lower: self.lower,
            limit,
        })))
    }
}

/// Checks a string length bound.
struct LengthKeyword {
    /// The keyword name reported on failure.
    name: &'static str,
    /// `true` for lower bounds.
    lower: bool,
    /// The configured limit, in Unicode scalar values.
    limit: u64,
}

impl Keyword for LengthKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let Some(Value::String(text)) = ctx.current() else {
            return Verdict::pass();
        };
        let length = u64::try_from(text.chars().count()).unwrap_or(u64::MAX);
        let violated = if self.lower { length < self.limit } else { length > self.limit };
        if !violated {
            return Verdict::pass();
        }
        let message = if self.lower {
            "string is shorter than allowed"
        } else {
            "string is longer than allowed"
        };
        Verdict::fail(
            ValidationError::new(self.name, ctx.path().clone(), message)
                .with_keyword_value(json!(self.limit))
                .with_arg("actual", json!(length)),
        )
    }
}

// ============================================================================
// SECTION: Pattern Keyword
// ============================================================================

/// Builds [`PatternKeyword`] handlers from `pattern`.
#[derive(Debug, Clone, Copy)]
pub struct PatternFactory;

impl KeywordFactory for PatternFactory {
    fn keyword(&self) -> &str {
        "pattern"
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
        let Some(raw) = node.get("pattern") else {
            return Ok(None);
        };
        let Some(pattern) = raw.as_str() else {
            return Err(ParseError::Keyword {
                keyword: "pattern".to_string(),
                detail: "pattern must be a string".to_string(),
            });
        };
        let regex = Regex::new(pattern).map_err(|err| ParseError::Keyword {
            keyword: "pattern".to_string(),
            detail: err.to_string(),
        })?;
        Ok(Some(Box::new(PatternKeyword {
            pattern: pattern.to_string(),
            regex,
        })))
    }
}

/// Checks a string against a compiled regular expression.
struct PatternKeyword {
    /// The configured pattern text, for rule matching.
    pattern: String,
    /// The compiled expression.
    regex: Regex,
}

impl Keyword for PatternKeyword {
    fn name(&self) -> &str {
        "pattern"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        let Some(Value::String(text)) = ctx.current() else {
            return Verdict::pass();
        };
        if self.regex.is_match(text) {
            return Verdict::pass();
        }
        Verdict::fail(
            ValidationError::new("pattern", ctx.path().clone(), "string does not match the pattern")
                .with_keyword_value(json!(self.pattern)),
        )
    }
}
