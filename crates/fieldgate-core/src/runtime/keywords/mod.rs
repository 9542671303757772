// crates/fieldgate-core/src/runtime/keywords/mod.rs
// ============================================================================
// Module: Keyword Handlers
// Description: Handler and factory traits, execution ranks, and the registry
//              of built-in keyword families.
// Purpose: Define the extension points through which schema keywords plug
//          into the node loop, and the order they execute in.
// Dependencies: crate::core, crate::runtime::{context, schema}, serde_json.
// ============================================================================

//! ## Overview
//! Each schema node owns an ordered list of [`Keyword`] handlers built at
//! compile time by [`KeywordFactory`] implementations. A factory inspects the
//! raw node and either declines or returns a handler; the node loop then
//! invokes the handlers rank by rank, registry order within a rank. The
//! chain-of-responsibility of the handler model is expressed as this owned
//! list rather than self-referential `next` links.
//!
//! Ranks place derivation first (so later keywords observe computed values),
//! structural checks in the middle, `required` after `properties` has had a
//! chance to materialize derived members, and assertions last.
//!
//! Invariants:
//! - A handler that returns `halt` stops the node's remaining handlers.
//! - Factories for expression-dependent keywords decline when no evaluator
//!   is configured.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod array;
pub mod assert;
pub mod composite;
pub mod derive;
pub mod general;
pub mod number;
pub mod object;
pub mod string;
pub mod tag;

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::error::ParseError;
use crate::core::error::ValidationError;
use crate::runtime::context::ValidationContext;
use crate::runtime::schema::Compiler;

// ============================================================================
// SECTION: Execution Ranks
// ============================================================================

/// Handler execution ranks; lower runs earlier.
pub mod rank {
    /// Value derivation (`$calculate`).
    pub const DERIVE: u8 = 10;
    /// Tag observation (`$tag`).
    pub const TAG: u8 = 20;
    /// Type and equality checks (`type`, `enum`, `const`).
    pub const GENERAL: u8 = 30;
    /// Scalar bounds (`minimum`, `maxLength`, `pattern`, ...).
    pub const BOUNDS: u8 = 40;
    /// Sub-schema applicators (`properties`, `items`, `allOf`, ...).
    pub const APPLICATOR: u8 = 50;
    /// Presence checks (`required`), after applicators materialize
    /// derived members.
    pub const REQUIRED: u8 = 60;
    /// Boolean assertions (`$evaluate`, `$validations`).
    pub const ASSERT: u8 = 70;
}

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Outcome of one handler at one node.
#[derive(Debug)]
pub struct Verdict {
    /// The error to report, if any.
    pub error: Option<ValidationError>,
    /// Stop the node's remaining handlers.
    pub halt: bool,
}

impl Verdict {
    /// The handler found nothing to report.
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            error: None,
            halt: false,
        }
    }

    /// The handler reports one error; later handlers still run.
    #[must_use]
    pub const fn fail(error: ValidationError) -> Self {
        Self {
            error: Some(error),
            halt: false,
        }
    }

    /// The handler stops the node without reporting anything.
    #[must_use]
    pub const fn halt() -> Self {
        Self {
            error: None,
            halt: true,
        }
    }

    /// The handler reports one error and stops the node.
    #[must_use]
    pub const fn halt_with(error: ValidationError) -> Self {
        Self {
            error: Some(error),
            halt: true,
        }
    }
}

// ============================================================================
// SECTION: Handler Traits
// ============================================================================

/// One compiled keyword handler at one schema node.
pub trait Keyword {
    /// The keyword name this handler reports under.
    fn name(&self) -> &str;

    /// Validates the current value.
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Verdict;
}

/// Compile-time hints about the node being compiled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseScope {
    /// The node is a `properties` member listed in the enclosing node's
    /// `required` array. Composition keywords do not propagate this.
    pub required_member: bool,
}

/// Parse extension point: constructs a handler from a raw schema node.
pub trait KeywordFactory {
    /// The keyword this factory recognizes.
    fn keyword(&self) -> &str;

    /// Execution rank of the handlers this factory produces.
    fn rank(&self) -> u8;

    /// Inspects the raw node and either declines (`Ok(None)`) or returns a
    /// constructed handler.
    ///
    /// # Errors
    /// Returns [`ParseError`] when the keyword is present but its
    /// configured value is invalid.
    fn parse(
        &self,
        node: &Map<String, Value>,
        scope: &ParseScope,
        compiler: &Compiler<'_>,
    ) -> Result<Option<Box<dyn Keyword>>, ParseError>;
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Ordered collection of keyword factories consulted at compile time.
pub struct KeywordRegistry {
    /// Factories in registration order.
    factories: Vec<Box<dyn KeywordFactory>>,
}

impl std::fmt::Debug for KeywordRegistry {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.factories.iter().map(|factory| factory.keyword()).collect();
        formatter.debug_struct("KeywordRegistry").field("factories", &names).finish()
    }
}

impl Default for KeywordRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl KeywordRegistry {
    /// Constructs an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Constructs the registry of built-in keyword families.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(derive::CalculateFactory));
        registry.register(Box::new(tag::TagFactory));
        registry.register(Box::new(general::TypeFactory));
        registry.register(Box::new(general::EnumFactory));
        registry.register(Box::new(general::ConstFactory));
        registry.register(Box::new(number::BoundFactory::minimum()));
        registry.register(Box::new(number::BoundFactory::maximum()));
        registry.register(Box::new(number::BoundFactory::exclusive_minimum()));
        registry.register(Box::new(number::BoundFactory::exclusive_maximum()));
        registry.register(Box::new(string::LengthFactory::min_length()));
        registry.register(Box::new(string::LengthFactory::max_length()));
        registry.register(Box::new(string::PatternFactory));
        registry.register(Box::new(array::ItemsFactory));
        registry.register(Box::new(array::CountFactory::min_items()));
        registry.register(Box::new(array::CountFactory::max_items()));
        registry.register(Box::new(array::UniqueItemsFactory));
        registry.register(Box::new(object::PropertiesFactory));
        registry.register(Box::new(object::AdditionalPropertiesFactory));
        registry.register(Box::new(object::RequiredFactory));
        registry.register(Box::new(composite::AllOfFactory));
        registry.register(Box::new(composite::AnyOfFactory));
        registry.register(Box::new(composite::OneOfFactory));
        registry.register(Box::new(composite::NotFactory));
        registry.register(Box::new(assert::EvaluateFactory));
        registry.register(Box::new(assert::ValidationsFactory));
        registry
    }

    /// Appends a factory; later registrations run later within their rank.
    pub fn register(&mut self, factory: Box<dyn KeywordFactory>) {
        self.factories.push(factory);
    }

    /// Builds the rank-ordered handler list for one raw node.
    ///
    /// # Errors
    /// Propagates the first [`ParseError`] any factory reports.
    pub fn compile_node(
        &self,
        node: &Map<String, Value>,
        scope: &ParseScope,
        compiler: &Compiler<'_>,
    ) -> Result<Vec<Box<dyn Keyword>>, ParseError> {
        let mut ranked: Vec<(u8, Box<dyn Keyword>)> = Vec::new();
        for factory in &self.factories {
            if let Some(handler) = factory.parse(node, scope, compiler)? {
                ranked.push((factory.rank(), handler));
            }
        }
        ranked.sort_by_key(|(rank, _)| *rank);
        Ok(ranked.into_iter().map(|(_, handler)| handler).collect())
    }
}
