// crates/fieldgate-core/src/runtime/keywords/tag.rs
// ============================================================================
// Module: Tag Keyword
// Description: The `$tag` keyword: record observations at the current path.
// Purpose: Feed the deferred tag collector during traversal.
// Dependencies: crate::core, crate::runtime::{context, keywords, schema},
//               serde_json.
// ============================================================================

//! ## Overview
//! `$tag` takes a tag name or an array of names and records an observation
//! for each at the current data path. Values are not read here; the tag
//! collector resolves them against the final document after traversal, so
//! injected values are reflected. Tagging never fails validation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::error::ParseError;
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

/// Builds [`TagKeyword`] handlers from `$tag`.
#[derive(Debug, Clone, Copy)]
pub struct TagFactory;

impl KeywordFactory for TagFactory {
    fn keyword(&self) -> &str {
        "$tag"
    }

    fn rank(&self) -> u8 {
        rank::TAG
    }

    fn parse(
        &self,
        node: &Map<String, Value>,
        _scope: &ParseScope,
        _compiler: &Compiler<'_>,
    ) -> Result<Option<Box<dyn Keyword>>, ParseError> {
        let Some(raw) = node.get("$tag") else {
            return Ok(None);
        };
        let tags = match raw {
            Value::String(tag) => vec![tag.clone()],
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(ToString::to_string).ok_or_else(|| ParseError::Keyword {
                        keyword: "$tag".to_string(),
                        detail: "tags must be strings".to_string(),
                    })
                })
                .collect::<Result<Vec<String>, ParseError>>()?,
            _ => {
                return Err(ParseError::Keyword {
                    keyword: "$tag".to_string(),
                    detail: "value must be a tag name or an array of tag names".to_string(),
                });
            }
        };
        Ok(Some(Box::new(TagKeyword {
            tags,
        })))
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Records observations for each configured tag.
struct TagKeyword {
    /// Tag names recorded at the current path.
    tags: Vec<String>,
}

impl Keyword for TagKeyword {
    fn name(&self) -> &str {
        "$tag"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict {
        for tag in &self.tags {
            ctx.record_tag(tag);
        }
        Verdict::pass()
    }
}
