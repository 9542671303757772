// crates/fieldgate-core/tests/limit_validation_unit.rs
// ============================================================================
// Module: Limit-Validation Tests
// Description: Validate conditional error suppression end to end.
// Purpose: Ensure gate decisions, rule matching, inheritance, and the extra
//          schema behave per the documented semantics.
// Dependencies: fieldgate-core, serde_json
// ============================================================================

//! Limit-validation behavior through the public `Validator` facade.

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

use fieldgate_core::ValidationOutcome;
use fieldgate_core::Validator;
use fieldgate_core::ValidatorOptions;
use serde_json::Value;
use serde_json::json;

fn validate(schema: &Value, document: &Value) -> ValidationOutcome {
    let validator = Validator::new(schema, ValidatorOptions::new()).unwrap();
    let mut document = document.clone();
    validator.validate(&mut document)
}

fn gated_schema() -> Value {
    json!({
        "type": "object",
        "$limitValidation": true,
        "required": ["foo"],
        "properties": {"a": {"type": "integer"}}
    })
}

#[test]
fn matched_gate_discards_sentinel_errors() {
    // `required` and type-on-null are the "still computing" cases the
    // default rules protect.
    let outcome = validate(&gated_schema(), &json!({"a": null}));
    assert!(outcome.valid);
    assert!(outcome.error.is_none());
}

#[test]
fn matched_gate_keeps_real_type_mismatches() {
    let outcome = validate(&gated_schema(), &json!({"a": "x"}));
    assert!(!outcome.valid);
    let leaves = outcome.errors.leaf_errors();
    assert_eq!(leaves["/a"].len(), 1);
    assert_eq!(leaves["/a"][0].keyword, "type");
    // The required error was discarded, not merely hidden from the tree.
    assert!(!leaves.contains_key(""));
}

#[test]
fn without_a_gate_sentinel_errors_are_reported() {
    let schema = json!({
        "type": "object",
        "required": ["foo"],
        "properties": {"a": {"type": "integer"}}
    });
    let outcome = validate(&schema, &json!({"a": null}));
    assert!(!outcome.valid);
}

#[test]
fn unmatched_condition_passes_errors_through() {
    let schema = json!({
        "type": "object",
        "$limitValidation": {"condition": {"required": ["draft"]}},
        "required": ["foo"]
    });
    let outcome = validate(&schema, &json!({}));
    assert!(!outcome.valid);
    assert_eq!(outcome.error.unwrap().keyword, "required");
}

#[test]
fn matched_condition_object_form_filters() {
    let schema = json!({
        "type": "object",
        "$limitValidation": {"condition": {"required": ["draft"]}},
        "required": ["foo"]
    });
    let outcome = validate(&schema, &json!({"draft": true}));
    assert!(outcome.valid);
}

#[test]
fn condition_evaluation_leaves_no_collector_trace() {
    let schema = json!({
        "type": "object",
        "$limitValidation": {"condition": {"required": ["draft"]}},
    });
    let outcome = validate(&schema, &json!({}));
    // The condition's own required failure must not leak.
    assert!(outcome.valid);
    assert!(outcome.errors.is_empty());
}

#[test]
fn gate_local_rules_override_the_defaults() {
    // Gate rules protect nothing, so the required error survives even
    // though the condition matched.
    let schema = json!({
        "type": "object",
        "$limitValidation": {"condition": true, "rules": []},
        "required": ["foo"]
    });
    let outcome = validate(&schema, &json!({}));
    assert!(!outcome.valid);
    assert_eq!(outcome.error.unwrap().keyword, "required");
}

#[test]
fn first_matching_rule_wins() {
    let schema = json!({
        "type": "object",
        "$limitValidation": {
            "condition": true,
            "rules": [
                {"keyword": {"const": "required"}, "keep": true},
                {"keyword": {"const": "required"}, "keep": false}
            ]
        },
        "required": ["foo"]
    });
    let outcome = validate(&schema, &json!({}));
    assert!(!outcome.valid);
    assert_eq!(outcome.error.unwrap().keyword, "required");
}

#[test]
fn keyword_value_predicates_narrow_a_rule() {
    // Discard only the `minimum: 10` failure; the sibling enum failure
    // at the same node stays.
    let schema = json!({
        "$limitValidation": {
            "condition": true,
            "rules": [
                {"keyword": {"const": "minimum"}, "keywordValue": {"const": 10}, "keep": false}
            ]
        },
        "minimum": 10,
        "enum": [2, 3]
    });
    let outcome = validate(&schema, &json!(1));
    assert!(!outcome.valid);
    let error = outcome.error.unwrap();
    assert_eq!(error.keyword, "enum");
}

#[test]
fn extra_schema_applies_when_the_condition_matches() {
    let schema = json!({
        "type": "object",
        "$limitValidation": {
            "condition": true,
            "schema": {"properties": {"a": {"type": "string"}}}
        }
    });
    let outcome = validate(&schema, &json!({"a": 7}));
    assert!(!outcome.valid);
    assert_eq!(outcome.errors.leaf_errors()["/a"][0].keyword, "type");
}

#[test]
fn decision_is_inherited_across_nesting_depth() {
    // The gate sits two levels above the failing member.
    let schema = json!({
        "type": "object",
        "$limitValidation": true,
        "properties": {
            "outer": {
                "type": "object",
                "properties": {
                    "inner": {"type": "object", "required": ["leaf"]}
                }
            }
        }
    });
    let outcome = validate(&schema, &json!({"outer": {"inner": {}}}));
    assert!(outcome.valid);
}

#[test]
fn sibling_gates_scope_their_own_decisions() {
    // Only `gated` carries a gate; `plain` keeps its errors.
    let schema = json!({
        "type": "object",
        "properties": {
            "gated": {"type": "object", "$limitValidation": true, "required": ["x"]},
            "plain": {"type": "object", "required": ["x"]}
        }
    });
    let outcome = validate(&schema, &json!({"gated": {}, "plain": {}}));
    assert!(!outcome.valid);
    let leaves = outcome.errors.leaf_errors();
    assert!(!leaves.contains_key("/gated"));
    assert_eq!(leaves["/plain"][0].keyword, "required");
}

#[test]
fn validator_level_default_rules_are_overridable() {
    // Replace the defaults with an empty set: the gate then keeps
    // everything.
    let options = ValidatorOptions::new().with_default_rules(json!([]));
    let validator = Validator::new(&gated_schema(), options).unwrap();
    let mut document = json!({"a": null});
    let outcome = validator.validate(&mut document);
    assert!(!outcome.valid);
}

#[test]
fn filtering_promotes_a_single_fan_out_survivor() {
    // Two sibling failures, one protected: the survivor replaces the
    // fan-out wrapper instead of staying wrapped.
    let schema = json!({
        "type": "object",
        "$limitValidation": true,
        "required": ["foo"],
        "properties": {"a": {"minimum": 10}}
    });
    let outcome = validate(&schema, &json!({"a": 1}));
    assert!(!outcome.valid);
    let error = outcome.error.unwrap();
    assert!(!error.is_fan_out());
    assert_eq!(error.keyword, "properties");
}
