// crates/fieldgate-core/src/core/mod.rs
// ============================================================================
// Module: Fieldgate Core Types
// Description: Paths, errors, variables, and the per-call collectors.
// Purpose: House the data model shared by the runtime and by embedders.
// Dependencies: serde, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! Core types are runtime-agnostic: they carry no traversal state and no
//! keyword logic. The runtime module builds on them to drive validation.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod collector;
pub mod error;
pub mod path;
pub mod tags;
pub mod variable;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use collector::ErrorCollector;
pub use error::ParseError;
pub use error::ResolveError;
pub use error::SCHEMA_KEYWORD;
pub use error::ValidationError;
pub use path::DataPath;
pub use path::PathError;
pub use path::ValueReference;
pub use tags::TagCollector;
pub use tags::TagEntry;
pub use variable::Calculation;
pub use variable::Evaluation;
pub use variable::PathReference;
pub use variable::ResolveFlags;
pub use variable::ResolveScope;
pub use variable::Variable;
