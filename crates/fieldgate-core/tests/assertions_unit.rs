// crates/fieldgate-core/tests/assertions_unit.rs
// ============================================================================
// Module: Assertion Keyword Tests
// Description: Validate `$evaluate` and `$validations` behavior.
// Purpose: Ensure boolean assertions pass vacuously on unresolvable inputs
//          and fail closed on evaluator faults.
// Dependencies: fieldgate-core, serde_json
// ============================================================================

//! Assertion behavior through the public `Validator` facade with the stub
//! evaluator.

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

mod common;

use std::sync::Arc;

use common::StubEvaluator;
use fieldgate_core::ValidationOutcome;
use fieldgate_core::Validator;
use fieldgate_core::ValidatorOptions;
use serde_json::Value;
use serde_json::json;

fn validate(schema: &Value, document: &Value) -> ValidationOutcome {
    let options = ValidatorOptions::new().with_evaluator(Arc::new(StubEvaluator));
    let validator = Validator::new(schema, options).unwrap();
    let mut document = document.clone();
    validator.validate(&mut document)
}

fn threshold_schema() -> Value {
    json!({
        "$evaluate": {
            "$expression": "$x > 1",
            "$variables": {"x": {"$data": "/x"}}
        }
    })
}

#[test]
fn satisfied_expressions_pass() {
    assert!(validate(&threshold_schema(), &json!({"x": 5})).valid);
}

#[test]
fn refuted_expressions_report_an_error() {
    let outcome = validate(&threshold_schema(), &json!({"x": 0}));
    assert!(!outcome.valid);
    let error = outcome.error.unwrap();
    assert_eq!(error.keyword, "$evaluate");
    assert_eq!(error.keyword_value, json!("$x > 1"));
}

#[test]
fn unresolvable_inputs_pass_vacuously() {
    // No /x in the document and no fallback: nothing to judge.
    assert!(validate(&threshold_schema(), &json!({})).valid);
}

#[test]
fn violated_inputs_pass_vacuously() {
    // /x fails its own sub-schema first; the assertion then has nothing
    // trustworthy to judge.
    let schema = json!({
        "properties": {"x": {"type": "integer"}},
        "$evaluate": {
            "$expression": "$x > 1",
            "$variables": {"x": {"$data": "/x"}}
        }
    });
    let outcome = validate(&schema, &json!({"x": "not a number"}));
    assert!(!outcome.valid);
    let leaves = outcome.errors.leaf_errors();
    assert_eq!(leaves["/x"].len(), 1);
    assert_eq!(leaves["/x"][0].keyword, "type");
    assert!(!leaves.contains_key(""));
}

#[test]
fn evaluator_faults_fail_closed() {
    let schema = json!({"$evaluate": "boom"});
    let outcome = validate(&schema, &json!({}));
    assert!(!outcome.valid);
    let error = outcome.error.unwrap();
    assert_eq!(error.keyword, "$evaluate");
    assert!(error.args.contains_key("reason"));
}

#[test]
fn fallback_on_an_evaluation_is_a_parse_error() {
    let schema = json!({
        "$evaluate": {"$expression": "$x > 1", "$variables": {"x": 2}, "$fallback": true}
    });
    let options = ValidatorOptions::new().with_evaluator(Arc::new(StubEvaluator));
    assert!(Validator::new(&schema, options).is_err());
}

#[test]
fn validations_report_their_declared_messages() {
    let schema = json!({
        "$validations": [
            {
                "$evaluate": {
                    "$expression": "$total >= $paid",
                    "$variables": {"total": {"$data": "/total"}, "paid": {"$data": "/paid"}}
                },
                "message": "paid amount exceeds the total"
            }
        ]
    });
    let outcome = validate(&schema, &json!({"total": 10, "paid": 12}));
    assert!(!outcome.valid);
    let error = outcome.error.unwrap();
    assert_eq!(error.keyword, "$validations");
    assert_eq!(error.message, "paid amount exceeds the total");
}

#[test]
fn multiple_failed_validations_fan_out() {
    let schema = json!({
        "$validations": [
            {"$evaluate": {"$expression": "$x > 1", "$variables": {"x": 0}}},
            {"$evaluate": {"$expression": "$x > 1", "$variables": {"x": 1}}}
        ]
    });
    let outcome = validate(&schema, &json!({}));
    assert!(!outcome.valid);
    let error = outcome.error.unwrap();
    assert!(error.is_fan_out());
    assert_eq!(error.sub_errors.len(), 2);
}

#[test]
fn passing_entries_do_not_mask_failing_ones() {
    let schema = json!({
        "$validations": [
            {"$evaluate": {"$expression": "$x > 1", "$variables": {"x": 5}}},
            {"$evaluate": {"$expression": "$x > 1", "$variables": {"x": 0}}}
        ]
    });
    let outcome = validate(&schema, &json!({}));
    assert!(!outcome.valid);
    assert_eq!(outcome.error.unwrap().keyword, "$validations");
}

#[test]
fn assertions_are_inert_without_an_evaluator() {
    let schema = json!({"$evaluate": "boom", "$validations": [{"$evaluate": "boom"}]});
    let validator = Validator::new(&schema, ValidatorOptions::new()).unwrap();
    let mut document = json!({});
    assert!(validator.validate(&mut document).valid);
}
