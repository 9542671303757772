// crates/fieldgate-core/src/runtime/mod.rs
// ============================================================================
// Module: Fieldgate Runtime
// Description: Schema compilation, keyword handlers, the traversal context,
//              and the validator facade.
// Purpose: Execute compiled schemas against documents, deriving values and
//          filtering errors per limit-validation decisions.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the validation engine proper. Every public
//! entry point (`Validator`, the CLI, embedders with custom registries)
//! drives the same node loop through the same context, so invariants hold
//! regardless of how validation is invoked.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod context;
pub mod injector;
pub mod keywords;
pub mod limit;
pub mod schema;
pub mod validator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::Decision;
pub use context::SuppressionMode;
pub use context::ValidationContext;
pub use injector::InjectError;
pub use keywords::Keyword;
pub use keywords::KeywordFactory;
pub use keywords::KeywordRegistry;
pub use keywords::ParseScope;
pub use keywords::Verdict;
pub use limit::LimitGate;
pub use limit::LimitRule;
pub use limit::default_rule_set;
pub use limit::filter_error;
pub use schema::Compiler;
pub use schema::Schema;
pub use validator::DEFAULT_MAX_ERRORS;
pub use validator::ValidationOutcome;
pub use validator::Validator;
pub use validator::ValidatorOptions;
