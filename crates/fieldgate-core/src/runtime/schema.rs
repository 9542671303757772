// crates/fieldgate-core/src/runtime/schema.rs
// ============================================================================
// Module: Schema Compilation and Node Loop
// Description: Compile raw JSON schema fragments into executable schemas and
//              drive the per-node handler loop.
// Purpose: Split parse-time work (fail fast on broken schemas) from
//          validation-time work (walk data, collect errors).
// Dependencies: crate::core, crate::interfaces, crate::runtime::{context,
//               keywords, limit}, serde_json.
// ============================================================================

//! ## Overview
//! A [`Schema`] is either a boolean (accept or reject everything) or a
//! compiled node: the rank-ordered handler list plus an optional limit gate
//! from `$limitValidation`. Compilation happens once per schema document;
//! validation runs against data with no further parsing.
//!
//! The node loop runs handlers in order, collecting their errors. Two or
//! more sibling failures are wrapped as a fan-out node (empty keyword). The
//! node's final error tree is recorded into the collector as the node
//! completes, so downstream path-reference variables observe violations from
//! already-completed nodes.
//!
//! Invariants:
//! - Unknown keys in a schema object are ignored.
//! - A node with a gate delegates its entire handler run to the gate while
//!   suppression is enabled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::error::ParseError;
use crate::core::error::SCHEMA_KEYWORD;
use crate::core::error::ValidationError;
use crate::interfaces::ExpressionEvaluator;
use crate::runtime::context::ValidationContext;
use crate::runtime::keywords::Keyword;
use crate::runtime::keywords::KeywordRegistry;
use crate::runtime::keywords::ParseScope;
use crate::runtime::limit::LimitGate;

// ============================================================================
// SECTION: Compiler
// ============================================================================

/// Compiles raw JSON schema fragments against a keyword registry.
#[derive(Clone, Copy)]
pub struct Compiler<'a> {
    /// Factories consulted for each node.
    registry: &'a KeywordRegistry,
    /// Evaluator used for eager expression checking, when present.
    evaluator: Option<&'a dyn ExpressionEvaluator>,
}

impl std::fmt::Debug for Compiler<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Compiler")
            .field("evaluator", &self.evaluator.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> Compiler<'a> {
    /// Constructs a compiler.
    #[must_use]
    pub fn new(
        registry: &'a KeywordRegistry,
        evaluator: Option<&'a dyn ExpressionEvaluator>,
    ) -> Self {
        Self {
            registry,
            evaluator,
        }
    }

    /// Returns the evaluator handed to expression-dependent factories.
    #[must_use]
    pub fn evaluator(&self) -> Option<&'a dyn ExpressionEvaluator> {
        self.evaluator
    }

    /// Compiles a boolean-or-object schema fragment.
    ///
    /// # Errors
    /// Returns [`ParseError`] for non-schema JSON and for any keyword
    /// defect a factory reports.
    pub fn compile(&self, raw: &Value) -> Result<Schema, ParseError> {
        self.compile_member(raw, false)
    }

    /// Compiles a `properties` member sub-schema, carrying whether the
    /// enclosing node lists the member as required.
    ///
    /// # Errors
    /// See [`Compiler::compile`].
    pub fn compile_member(&self, raw: &Value, required: bool) -> Result<Schema, ParseError> {
        match raw {
            Value::Bool(accept) => Ok(Schema::Bool(*accept)),
            Value::Object(map) => {
                let scope = ParseScope {
                    required_member: required,
                };
                let handlers = self.registry.compile_node(map, &scope, self)?;
                let gate = map
                    .get("$limitValidation")
                    .map(|raw_gate| LimitGate::parse(raw_gate, self))
                    .transpose()?;
                let derives = handlers.iter().any(|handler| handler.name() == "$calculate");
                Ok(Schema::Node(Box::new(SchemaNode {
                    handlers,
                    gate,
                    derives,
                })))
            }
            _ => Err(ParseError::Schema {
                detail: "schema must be a boolean or an object".to_string(),
            }),
        }
    }
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// An executable schema fragment.
pub enum Schema {
    /// `true` accepts everything, `false` rejects everything.
    Bool(bool),
    /// A compiled object schema.
    Node(Box<SchemaNode>),
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(accept) => formatter.debug_tuple("Bool").field(accept).finish(),
            Self::Node(node) => formatter
                .debug_struct("Node")
                .field("handlers", &node.handlers.len())
                .field("gated", &node.gate.is_some())
                .field("derives", &node.derives)
                .finish(),
        }
    }
}

impl Schema {
    /// Validates the current value, returning the node's final error tree.
    #[must_use]
    pub fn validate(&self, ctx: &mut ValidationContext<'_>) -> Option<ValidationError> {
        match self {
            Self::Bool(true) => None,
            Self::Bool(false) => {
                let error = ValidationError::new(
                    SCHEMA_KEYWORD,
                    ctx.path().clone(),
                    "value is not allowed here",
                );
                ctx.record(&error);
                Some(error)
            }
            Self::Node(node) => node.validate(ctx),
        }
    }

    /// Returns `true` when this schema derives a value for the location it
    /// is applied to (it carries an active `$calculate`).
    #[must_use]
    pub fn derives(&self) -> bool {
        match self {
            Self::Bool(_) => false,
            Self::Node(node) => node.derives,
        }
    }
}

// ============================================================================
// SECTION: Schema Node
// ============================================================================

/// One compiled object schema: handlers plus an optional limit gate.
pub struct SchemaNode {
    /// Handlers in execution order.
    handlers: Vec<Box<dyn Keyword>>,
    /// Gate compiled from `$limitValidation`, when present.
    gate: Option<LimitGate>,
    /// The node carries an active `$calculate`.
    derives: bool,
}

impl SchemaNode {
    /// Validates the current value through the gate, then records the
    /// final tree.
    ///
    /// Every node is gated while suppression is enabled: a node without an
    /// explicit `$limitValidation` runs under the implicit gate, which
    /// inherits the nearest enclosing decision and the default rules. With
    /// no enclosing decision that degenerates to the plain handler loop.
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Option<ValidationError> {
        if ctx.budget_exhausted() {
            return None;
        }
        let error = if ctx.suppression_enabled() {
            self.gate.as_ref().unwrap_or(&LimitGate::INHERIT).apply(self, ctx)
        } else {
            self.run_handlers(ctx)
        };
        if let Some(error) = &error {
            ctx.record(error);
        }
        error
    }

    /// Runs the handler list, combining sibling errors.
    pub(crate) fn run_handlers(&self, ctx: &mut ValidationContext<'_>) -> Option<ValidationError> {
        let mut errors = Vec::new();
        for handler in &self.handlers {
            let verdict = handler.validate(ctx);
            if let Some(error) = verdict.error {
                errors.push(error);
            }
            if verdict.halt {
                break;
            }
        }
        combine_errors(ctx, errors)
    }
}

/// Combines sibling errors: none, one, or a fan-out wrapper.
pub(crate) fn combine_errors(
    ctx: &ValidationContext<'_>,
    mut errors: Vec<ValidationError>,
) -> Option<ValidationError> {
    match errors.len() {
        0 => None,
        1 => Some(errors.remove(0)),
        _ => Some(ValidationError::fan_out(ctx.path().clone(), errors)),
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
        clippy::use_debug,
        reason = "Test-only assertions."
    )]

    use super::Compiler;
    use super::KeywordRegistry;

    #[test]
    fn compiler_debug_reports_evaluator_presence_only() {
        let registry = KeywordRegistry::standard();
        let compiler = Compiler::new(&registry, None);
        let rendered = format!("{compiler:?}");
        assert!(rendered.starts_with("Compiler"));
        assert!(rendered.contains("evaluator: false"));
    }
}
