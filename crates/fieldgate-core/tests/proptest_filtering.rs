// crates/fieldgate-core/tests/proptest_filtering.rs
// ============================================================================
// Module: Error-Filtering Property-Based Tests
// Description: Property tests for suppression-rule filtering invariants.
// Purpose: Detect panics and shape violations across generated error trees.
// Dependencies: fieldgate-core, proptest, serde_json
// ============================================================================

//! Property-based tests for [`filter_error`] invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use fieldgate_core::Compiler;
use fieldgate_core::DataPath;
use fieldgate_core::KeywordRegistry;
use fieldgate_core::LimitRule;
use fieldgate_core::ValidationContext;
use fieldgate_core::ValidationError;
use fieldgate_core::filter_error;
use proptest::prelude::*;
use serde_json::Value;
use serde_json::json;

/// Compiles a rule-set literal against the standard registry.
fn rules(raw: &Value) -> Vec<LimitRule> {
    let registry = KeywordRegistry::standard();
    let compiler = Compiler::new(&registry, None);
    LimitRule::parse_set(raw, &compiler).unwrap()
}

/// Runs the filter over a detached empty document.
fn filter(error: ValidationError, rules: &[LimitRule]) -> Option<ValidationError> {
    let mut document = json!({});
    let ctx = ValidationContext::probe(&mut document, None);
    filter_error(error, rules, &ctx)
}

/// Every fan-out node in a filtered tree must hold two or more survivors.
fn shape_holds(error: &ValidationError) -> bool {
    if error.is_fan_out() && error.sub_errors.len() < 2 {
        return false;
    }
    error.sub_errors.iter().all(shape_holds)
}

/// Whether any node in the tree blames the `required` keyword.
fn mentions_required(error: &ValidationError) -> bool {
    error.keyword == "required" || error.sub_errors.iter().any(mentions_required)
}

fn leaf_strategy() -> impl Strategy<Value = ValidationError> {
    let keyword = prop_oneof![
        Just("type"),
        Just("required"),
        Just("minimum"),
        Just("pattern"),
        Just("$evaluate"),
    ];
    let pointer = prop::collection::vec("[a-z]{1,3}", 0 .. 3);
    (keyword, pointer, any::<i32>()).prop_map(|(keyword, segments, configured)| {
        let mut path = DataPath::root();
        for segment in &segments {
            path.push_member(segment);
        }
        ValidationError::new(keyword, path, "generated failure")
            .with_keyword_value(json!(configured))
    })
}

fn error_tree_strategy() -> impl Strategy<Value = ValidationError> {
    leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 2 .. 4)
            .prop_map(|subs| ValidationError::fan_out(DataPath::root(), subs))
    })
}

proptest! {
    #[test]
    fn filtering_is_idempotent(error in error_tree_strategy()) {
        let rule_set = rules(&json!([
            {"keyword": {"const": "required"}, "keep": false},
            {"keyword": {"const": "minimum"}, "keep": true},
        ]));
        if let Some(once) = filter(error, &rule_set) {
            let twice = filter(once.clone(), &rule_set);
            prop_assert_eq!(twice, Some(once));
        }
    }

    #[test]
    fn filtering_preserves_the_fan_out_shape(error in error_tree_strategy()) {
        let rule_set = rules(&json!([
            {"keyword": {"const": "required"}, "keep": false},
            {"keyword": {"const": "type"}, "keep": false},
        ]));
        if let Some(filtered) = filter(error, &rule_set) {
            prop_assert!(shape_holds(&filtered));
        }
    }

    #[test]
    fn an_empty_rule_set_keeps_every_tree_intact(error in error_tree_strategy()) {
        let filtered = filter(error.clone(), &[]);
        prop_assert_eq!(filtered, Some(error));
    }

    #[test]
    fn an_unconditional_discard_rule_empties_every_tree(error in error_tree_strategy()) {
        let rule_set = rules(&json!([{"keep": false}]));
        prop_assert_eq!(filter(error, &rule_set), None);
    }

    #[test]
    fn discarded_keywords_never_survive(error in error_tree_strategy()) {
        let rule_set = rules(&json!([{"keyword": {"const": "required"}, "keep": false}]));
        if let Some(filtered) = filter(error, &rule_set) {
            prop_assert!(!mentions_required(&filtered));
        }
    }

    #[test]
    fn narrowed_rules_spare_other_keyword_values(configured in any::<i32>()) {
        let rule_set = rules(&json!([
            {"keyword": {"const": "minimum"}, "keywordValue": {"const": 10}, "keep": false}
        ]));
        let error = ValidationError::new("minimum", DataPath::root(), "too small")
            .with_keyword_value(json!(configured));
        let filtered = filter(error.clone(), &rule_set);
        if configured == 10 {
            prop_assert_eq!(filtered, None);
        } else {
            prop_assert_eq!(filtered, Some(error));
        }
    }
}
