// crates/fieldgate-eval/src/lib.rs
// ============================================================================
// Module: Fieldgate Jaq Evaluator
// Description: jq expression evaluation behind the Fieldgate evaluator
//              interface, backed by the jaq toolchain.
// Purpose: Give `$calculate`, `$evaluate`, and `$validations` a concrete
//          expression language without coupling the engine to one.
// Dependencies: fieldgate-core, jaq-core, jaq-json, jaq-std, serde_json.
// ============================================================================

//! ## Overview
//! [`JaqEvaluator`] compiles each expression as a jq filter with one `$name`
//! global per declared variable, the full jaq-std and jaq-json definition
//! sets loaded. Evaluation runs the filter against `null` input with the
//! bound values and takes the first output; an empty output stream is
//! `null`, which the engine treats as "no value" and routes through
//! fallback chains.
//!
//! Compilation failures (syntax errors, undefined names) surface as
//! [`ExpressionError::Invalid`] so schema construction fails fast; runtime
//! failures surface as [`ExpressionError::Failed`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use jaq_core::Compiler;
use jaq_core::Ctx;
use jaq_core::Filter;
use jaq_core::Native;
use jaq_core::RcIter;
use jaq_core::load;
use jaq_core::load::Arena;
use jaq_core::load::Loader;
use jaq_json::Val;
use serde_json::Value;

use fieldgate_core::interfaces::ExpressionError;
use fieldgate_core::interfaces::ExpressionEvaluator;

// ============================================================================
// SECTION: Jaq Evaluator
// ============================================================================

/// Expression evaluator backed by the jaq jq implementation.
///
/// Stateless; each call compiles the expression against the standard
/// definition sets. Clone-free and shareable across validators.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaqEvaluator;

impl JaqEvaluator {
    /// Constructs the evaluator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Compiles an expression with one `$name` global per variable.
    ///
    /// # Errors
    /// Returns [`ExpressionError::Invalid`] for syntax errors and undefined
    /// names.
    fn compile(
        expression: &str,
        variables: &[String],
    ) -> Result<Filter<Native<Val>>, ExpressionError> {
        let loader = Loader::new(jaq_std::defs().chain(jaq_json::defs()));
        let arena = Arena::default();
        let program = load::File {
            code: expression,
            path: (),
        };
        let modules = loader.load(&arena, program).map_err(|errs| format_load_errors(&errs))?;
        let globals: Vec<String> =
            variables.iter().map(|name| format!("${name}")).collect();
        Compiler::default()
            .with_funs(jaq_std::funs().chain(jaq_json::funs()))
            .with_global_vars(globals.iter().map(String::as_str))
            .compile(modules)
            .map_err(|errs| format_compile_errors(&errs))
    }
}

impl ExpressionEvaluator for JaqEvaluator {
    fn check(&self, expression: &str, variables: &[String]) -> Result<(), ExpressionError> {
        Self::compile(expression, variables).map(|_| ())
    }

    fn evaluate(
        &self,
        expression: &str,
        bindings: &BTreeMap<String, Value>,
    ) -> Result<Value, ExpressionError> {
        let names: Vec<String> = bindings.keys().cloned().collect();
        let filter = Self::compile(expression, &names)?;
        let values: Vec<Val> = bindings.values().map(|value| Val::from(value.clone())).collect();
        let inputs = RcIter::new(core::iter::empty());
        let mut outputs = filter.run((Ctx::new(values, &inputs), Val::from(Value::Null)));
        match outputs.next() {
            None => Ok(Value::Null),
            Some(Ok(output)) => Ok(Value::from(output)),
            #[allow(clippy::use_debug, reason = "Jaq errors only implement Debug usefully.")]
            Some(Err(err)) => Err(ExpressionError::Failed {
                detail: format!("{err:?}"),
            }),
        }
    }
}

// ============================================================================
// SECTION: Error Formatting
// ============================================================================

/// Renders loader (parse) failures into one invalid-expression error.
#[allow(clippy::use_debug, reason = "Jaq errors only implement Debug usefully.")]
fn format_load_errors(errs: &[(load::File<&str, ()>, load::Error<&str>)]) -> ExpressionError {
    let mut detail = String::new();
    for (file, err) in errs {
        detail.push_str(&format!("parse error: {err:?} in `{}`\n", file.code));
    }
    ExpressionError::Invalid {
        detail,
    }
}

/// Renders compiler (undefined-name) failures into one invalid-expression
/// error.
#[allow(clippy::use_debug, reason = "Jaq errors only implement Debug usefully.")]
fn format_compile_errors(
    errs: &[(load::File<&str, ()>, Vec<(&str, jaq_core::compile::Undefined)>)],
) -> ExpressionError {
    let mut detail = String::new();
    for (file, list) in errs {
        for (name, undefined) in list {
            detail.push_str(&format!("undefined `{name}`: {undefined:?} in `{}`\n", file.code));
        }
    }
    ExpressionError::Invalid {
        detail,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
