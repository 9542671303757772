// crates/fieldgate-core/src/runtime/context.rs
// ============================================================================
// Module: Validation Context
// Description: Per-call traversal state: document cursor, collectors, limit
//              decision, suppression mode, and the error budget.
// Purpose: Thread all shared validation state through the traversal as one
//          typed value with scoped save/restore disciplines.
// Dependencies: crate::core, crate::interfaces, crate::runtime::{injector,
//               limit}, serde_json.
// ============================================================================

//! ## Overview
//! One [`ValidationContext`] lives for one validation call. It owns the
//! error and tag collectors, borrows the mutable document, and carries the
//! limit-validation decision and suppression mode that would otherwise be
//! dynamic-scope globals. Every piece of state that a nested evaluation may
//! change is altered only through a scoped helper that restores the previous
//! value on the way out, so re-entrant validation nests correctly.
//!
//! The current value is re-resolved from the document on every access; no
//! cursor cache survives a value injection.
//!
//! Invariants:
//! - `speculative` discards every collector and tag mutation made inside it.
//! - `with_decision` and `unfiltered` restore the previous state on exit.
//! - The path always names the location the traversal is visiting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::collector::ErrorCollector;
use crate::core::error::ValidationError;
use crate::core::path::DataPath;
use crate::core::tags::TagCollector;
use crate::core::variable::ResolveScope;
use crate::interfaces::ExpressionEvaluator;
use crate::runtime::injector;
use crate::runtime::injector::InjectError;
use crate::runtime::limit::LimitRule;

// ============================================================================
// SECTION: Modes
// ============================================================================

/// Matched state of the nearest enclosing limit gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The enclosing condition matched; suppression rules apply.
    Matched,
    /// No enclosing condition matched; errors pass through unfiltered.
    Unmatched,
}

/// Whether limit-validation gates are active for the current evaluation.
///
/// Disabled while evaluating condition schemas and rule predicate schemas,
/// so filtering never applies to the validation calls the filter itself
/// issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionMode {
    /// Gates evaluate their conditions and filter errors.
    Enabled,
    /// Gates are skipped entirely.
    Disabled,
}

// ============================================================================
// SECTION: Validation Context
// ============================================================================

/// Shared state for one validation call.
///
/// # Invariants
/// - The document is the single mutable resource; only value injection
///   writes to it.
/// - `truncated` never reverts inside one non-speculative run.
pub struct ValidationContext<'a> {
    /// The document under validation, mutated in place by injection.
    document: &'a mut Value,
    /// Full current data path from the document root.
    path: DataPath,
    /// Error index for this call.
    collector: ErrorCollector,
    /// Tag observations for this call.
    tags: TagCollector,
    /// Configured expression evaluator, when present.
    evaluator: Option<&'a dyn ExpressionEvaluator>,
    /// Rule set used by gates that do not declare their own.
    default_rules: &'a [LimitRule],
    /// Decision of the nearest enclosing limit gate.
    decision: Option<Decision>,
    /// Whether gates are active for the current evaluation.
    suppression: SuppressionMode,
    /// Leaf-error budget; descent stops once the collector reaches it.
    max_errors: usize,
    /// Set once the budget is exhausted.
    truncated: bool,
}

impl std::fmt::Debug for ValidationContext<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ValidationContext")
            .field("path", &self.path.canonical())
            .field("decision", &self.decision)
            .field("suppression", &self.suppression)
            .field("truncated", &self.truncated)
            .finish_non_exhaustive()
    }
}

impl<'a> ValidationContext<'a> {
    /// Constructs the context for one validation call.
    #[must_use]
    pub fn new(
        document: &'a mut Value,
        evaluator: Option<&'a dyn ExpressionEvaluator>,
        default_rules: &'a [LimitRule],
        collector: ErrorCollector,
        max_errors: usize,
    ) -> Self {
        Self {
            document,
            path: DataPath::root(),
            collector,
            tags: TagCollector::new(),
            evaluator,
            default_rules,
            decision: None,
            suppression: SuppressionMode::Enabled,
            max_errors,
            truncated: false,
        }
    }

    /// Constructs a detached context over a standalone value, used to
    /// evaluate rule predicate schemas without touching the real call
    /// state. Gates are disabled inside it.
    #[must_use]
    pub fn probe(
        document: &'a mut Value,
        evaluator: Option<&'a dyn ExpressionEvaluator>,
    ) -> Self {
        const NO_RULES: &[LimitRule] = &[];
        let mut context =
            Self::new(document, evaluator, NO_RULES, ErrorCollector::new(), usize::MAX);
        context.suppression = SuppressionMode::Disabled;
        context
    }

    // ------------------------------------------------------------------
    // Document cursor
    // ------------------------------------------------------------------

    /// Returns the full document.
    #[must_use]
    pub fn document(&self) -> &Value {
        self.document
    }

    /// Returns the full current data path.
    #[must_use]
    pub fn path(&self) -> &DataPath {
        &self.path
    }

    /// Resolves the current path against the document.
    ///
    /// Returns `None` when the location does not exist (it may have been
    /// unset mid-traversal).
    #[must_use]
    pub fn current(&self) -> Option<&Value> {
        self.path.lookup(self.document)
    }

    /// Descends into an object member for the duration of `body`.
    pub fn scoped_member<T>(&mut self, name: &str, body: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push_member(name);
        let out = body(self);
        self.path.pop();
        out
    }

    /// Descends into an array element for the duration of `body`.
    pub fn scoped_index<T>(&mut self, index: usize, body: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push_index(index);
        let out = body(self);
        self.path.pop();
        out
    }

    /// Writes a derived value at the current location.
    ///
    /// # Errors
    /// Propagates [`InjectError`] from the injector.
    pub fn set_current(
        &mut self,
        transform: impl FnOnce(Option<Value>) -> Value,
    ) -> Result<(), InjectError> {
        injector::set_value(self.document, &self.path, transform)
    }

    /// Removes the value at the current location entirely.
    ///
    /// # Errors
    /// Propagates [`InjectError`] from the injector.
    pub fn unset_current(&mut self) -> Result<(), InjectError> {
        injector::unset_value(self.document, &self.path)
    }

    // ------------------------------------------------------------------
    // Collectors and budget
    // ------------------------------------------------------------------

    /// Records an error into the collector and charges the budget.
    pub fn record(&mut self, error: &ValidationError) {
        self.collector.add_error(error);
        if self.collector.leaf_count() >= self.max_errors {
            self.truncated = true;
        }
    }

    /// Returns the error collector.
    #[must_use]
    pub fn collector(&self) -> &ErrorCollector {
        &self.collector
    }

    /// Records a tag observation at the current location.
    pub fn record_tag(&mut self, tag: &str) {
        let path = self.path.clone();
        self.tags.record(tag, path);
    }

    /// Returns `true` once the error budget is exhausted.
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.truncated
    }

    /// Runs a speculative sub-validation: collector, tags, and budget state
    /// are restored afterwards so side effects never land in the real call.
    pub fn speculative<T>(&mut self, body: impl FnOnce(&mut Self) -> T) -> T {
        let saved_collector = self.collector.clone();
        let saved_tags = self.tags.clone();
        let saved_truncated = self.truncated;
        let out = body(self);
        self.collector = saved_collector;
        self.tags = saved_tags;
        self.truncated = saved_truncated;
        out
    }

    // ------------------------------------------------------------------
    // Limit-validation state
    // ------------------------------------------------------------------

    /// Returns the nearest enclosing decision, defaulting to unmatched.
    #[must_use]
    pub fn decision(&self) -> Decision {
        self.decision.unwrap_or(Decision::Unmatched)
    }

    /// Sets the enclosing decision for the duration of `body`.
    pub fn with_decision<T>(
        &mut self,
        decision: Decision,
        body: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let saved = self.decision;
        self.decision = Some(decision);
        let out = body(self);
        self.decision = saved;
        out
    }

    /// Returns `true` when limit gates are active.
    #[must_use]
    pub fn suppression_enabled(&self) -> bool {
        self.suppression == SuppressionMode::Enabled
    }

    /// Disables limit gates for the duration of `body`.
    pub fn unfiltered<T>(&mut self, body: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.suppression;
        self.suppression = SuppressionMode::Disabled;
        let out = body(self);
        self.suppression = saved;
        out
    }

    // ------------------------------------------------------------------
    // Collaborators
    // ------------------------------------------------------------------

    /// Returns the configured expression evaluator, when present.
    #[must_use]
    pub fn evaluator(&self) -> Option<&'a dyn ExpressionEvaluator> {
        self.evaluator
    }

    /// Returns the default suppression rule set.
    #[must_use]
    pub fn default_rules(&self) -> &'a [LimitRule] {
        self.default_rules
    }

    /// Borrows the context as a read-only variable-resolution scope.
    #[must_use]
    pub fn resolve_scope(&self) -> ResolveScope<'_> {
        ResolveScope {
            document: self.document,
            path: &self.path,
            collector: &self.collector,
            evaluator: self.evaluator,
        }
    }

    /// Consumes the context, releasing the collectors and the truncation
    /// flag for outcome assembly.
    #[must_use]
    pub fn into_parts(self) -> (ErrorCollector, TagCollector, bool) {
        (self.collector, self.tags, self.truncated)
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
        reason = "Test-only assertions."
    )]

    use serde_json::json;

    use super::Decision;
    use super::ErrorCollector;
    use super::ValidationContext;
    use crate::core::error::ValidationError;
    use crate::core::path::DataPath;

    fn context(document: &mut serde_json::Value) -> ValidationContext<'_> {
        ValidationContext::new(document, None, &[], ErrorCollector::new(), 128)
    }

    #[test]
    fn speculative_mutations_are_discarded() {
        let mut document = json!({});
        let mut ctx = context(&mut document);
        ctx.record(&ValidationError::new("type", DataPath::root(), "wrong type"));
        ctx.speculative(|ctx| {
            ctx.record(&ValidationError::new("minimum", DataPath::root(), "too small"));
            ctx.record_tag("inner");
            assert_eq!(ctx.collector().leaf_count(), 2);
        });
        assert_eq!(ctx.collector().leaf_count(), 1);
        let (_, tags, _) = ctx.into_parts();
        assert!(tags.is_empty());
    }

    #[test]
    fn decision_restores_on_exit() {
        let mut document = json!({});
        let mut ctx = context(&mut document);
        assert_eq!(ctx.decision(), Decision::Unmatched);
        ctx.with_decision(Decision::Matched, |ctx| {
            assert_eq!(ctx.decision(), Decision::Matched);
            ctx.with_decision(Decision::Unmatched, |ctx| {
                assert_eq!(ctx.decision(), Decision::Unmatched);
            });
            assert_eq!(ctx.decision(), Decision::Matched);
        });
        assert_eq!(ctx.decision(), Decision::Unmatched);
    }

    #[test]
    fn current_observes_injected_values() {
        let mut document = json!({"a": {}});
        let mut ctx = context(&mut document);
        ctx.scoped_member("a", |ctx| {
            ctx.scoped_member("b", |ctx| {
                assert!(ctx.current().is_none());
                ctx.set_current(|_| json!(6)).unwrap();
                assert_eq!(ctx.current(), Some(&json!(6)));
            });
        });
        assert_eq!(document, json!({"a": {"b": 6}}));
    }

    #[test]
    fn budget_truncates_once_reached() {
        let mut document = json!({});
        let mut ctx = ValidationContext::new(&mut document, None, &[], ErrorCollector::new(), 1);
        assert!(!ctx.budget_exhausted());
        ctx.record(&ValidationError::new("type", DataPath::root(), "wrong type"));
        assert!(ctx.budget_exhausted());
    }
}
