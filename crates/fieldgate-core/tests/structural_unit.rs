// crates/fieldgate-core/tests/structural_unit.rs
// ============================================================================
// Module: Structural Keyword Tests
// Description: Validate the structural keyword families end to end.
// Purpose: Ensure type, bounds, object, array, and composition keywords
//          report the documented error shapes at the right paths.
// Dependencies: fieldgate-core, serde_json
// ============================================================================

//! Structural validation behavior through the public `Validator` facade.

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

#[test]
fn type_keyword_accepts_matching_values() {
    let schema = json!({"type": "object"});
    assert!(validate(&schema, &json!({})).valid);
    assert!(!validate(&schema, &json!(7)).valid);
}

#[test]
fn type_keyword_accepts_any_of_listed_names() {
    let schema = json!({"type": ["integer", "string"]});
    assert!(validate(&schema, &json!(3)).valid);
    assert!(validate(&schema, &json!("three")).valid);
    assert!(!validate(&schema, &json!(3.5)).valid);
}

#[test]
fn integer_accepts_zero_fraction_floats() {
    let schema = json!({"type": "integer"});
    assert!(validate(&schema, &json!(3.0)).valid);
    assert!(!validate(&schema, &json!(3.5)).valid);
}

#[test]
fn numeric_bounds_are_decimal_aware() {
    let schema = json!({"minimum": 0.1, "maximum": 0.3});
    assert!(validate(&schema, &json!(0.2)).valid);
    assert!(!validate(&schema, &json!(0.30000000000000004)).valid);
}

#[test]
fn exclusive_bounds_reject_the_limit_itself() {
    let schema = json!({"exclusiveMinimum": 5});
    assert!(!validate(&schema, &json!(5)).valid);
    assert!(validate(&schema, &json!(6)).valid);
}

#[test]
fn enum_equality_is_decimal_aware() {
    let schema = json!({"enum": [1.0, "a"]});
    assert!(validate(&schema, &json!(1)).valid);
    assert!(validate(&schema, &json!("a")).valid);
    assert!(!validate(&schema, &json!(2)).valid);
}

#[test]
fn const_matches_structured_values() {
    let schema = json!({"const": {"a": [1, 2]}});
    assert!(validate(&schema, &json!({"a": [1, 2]})).valid);
    assert!(!validate(&schema, &json!({"a": [1]})).valid);
}

#[test]
fn string_lengths_count_scalar_values() {
    let schema = json!({"minLength": 2, "maxLength": 3});
    assert!(validate(&schema, &json!("héé")).valid);
    assert!(!validate(&schema, &json!("h")).valid);
    assert!(!validate(&schema, &json!("hhhh")).valid);
}

#[test]
fn pattern_rejects_non_matching_strings() {
    let schema = json!({"pattern": "^[a-z]+$"});
    assert!(validate(&schema, &json!("abc")).valid);
    let outcome = validate(&schema, &json!("ABC"));
    assert!(!outcome.valid);
    assert_eq!(outcome.error.unwrap().keyword, "pattern");
}

#[test]
fn malformed_patterns_fail_schema_compilation() {
    let result = Validator::new(&json!({"pattern": "["}), ValidatorOptions::new());
    assert!(result.is_err());
}

#[test]
fn items_reports_element_errors_at_their_index() {
    let schema = json!({"items": {"type": "integer"}});
    let outcome = validate(&schema, &json!([1, "two", 3]));
    assert!(!outcome.valid);
    assert!(outcome.errors.has_error_at_pointer("/1"));
    assert!(!outcome.errors.has_error_at_pointer("/0"));
    let wrapper = outcome.error.unwrap();
    assert_eq!(wrapper.keyword, "items");
    assert_eq!(wrapper.sub_errors.len(), 1);
}

#[test]
fn array_cardinality_bounds_apply() {
    let schema = json!({"minItems": 1, "maxItems": 2});
    assert!(!validate(&schema, &json!([])).valid);
    assert!(validate(&schema, &json!([1, 2])).valid);
    assert!(!validate(&schema, &json!([1, 2, 3])).valid);
}

#[test]
fn unique_items_spots_decimal_equal_duplicates() {
    let schema = json!({"uniqueItems": true});
    let outcome = validate(&schema, &json!([1, 2.0, 1.0]));
    assert!(!outcome.valid);
    assert_eq!(outcome.error.unwrap().args["duplicateIndex"], json!(2));
}

#[test]
fn properties_descends_into_present_members_only() {
    let schema = json!({"properties": {"a": {"type": "integer"}, "b": {"type": "string"}}});
    assert!(validate(&schema, &json!({"a": 1})).valid);
    let outcome = validate(&schema, &json!({"a": "one"}));
    assert!(!outcome.valid);
    assert!(outcome.errors.has_error_at_pointer("/a"));
}

#[test]
fn additional_properties_police_undeclared_members() {
    let schema = json!({
        "properties": {"a": {"type": "integer"}},
        "additionalProperties": false
    });
    assert!(validate(&schema, &json!({"a": 1})).valid);
    let outcome = validate(&schema, &json!({"a": 1, "b": 2}));
    assert!(!outcome.valid);
    assert!(outcome.errors.has_error_at_pointer("/b"));
}

#[test]
fn required_reports_all_missing_members_in_one_error() {
    let schema = json!({"required": ["a", "b", "c"]});
    let outcome = validate(&schema, &json!({"b": 1}));
    assert!(!outcome.valid);
    let error = outcome.error.unwrap();
    assert_eq!(error.keyword, "required");
    assert_eq!(error.args["missing"], json!(["a", "c"]));
}

#[test]
fn required_is_inert_on_non_objects() {
    let schema = json!({"required": ["a"]});
    assert!(validate(&schema, &json!(7)).valid);
}

#[test]
fn boolean_false_schema_rejects_everything() {
    let outcome = validate(&json!(false), &json!({"any": "thing"}));
    assert!(!outcome.valid);
    assert_eq!(outcome.error.unwrap().keyword, "schema");
}

#[test]
fn all_of_requires_every_branch() {
    let schema = json!({"allOf": [{"minimum": 0}, {"maximum": 10}]});
    assert!(validate(&schema, &json!(5)).valid);
    let outcome = validate(&schema, &json!(11));
    assert!(!outcome.valid);
    assert_eq!(outcome.error.unwrap().keyword, "allOf");
}

#[test]
fn any_of_passes_on_the_first_accepting_branch() {
    let schema = json!({"anyOf": [{"type": "integer"}, {"type": "string"}]});
    assert!(validate(&schema, &json!("text")).valid);
    let outcome = validate(&schema, &json!(1.5));
    assert!(!outcome.valid);
    let error = outcome.error.unwrap();
    assert_eq!(error.keyword, "anyOf");
    assert_eq!(error.sub_errors.len(), 2);
    // anyOf is an extra-leaf keyword: the rejected-branch details do not
    // become standalone collector entries.
    assert!(outcome.errors.leaf_errors().contains_key(""));
}

#[test]
fn one_of_requires_exactly_one_match() {
    let schema = json!({"oneOf": [{"minimum": 0}, {"maximum": 10}]});
    let outcome = validate(&schema, &json!(5));
    assert!(!outcome.valid);
    assert_eq!(outcome.error.as_ref().unwrap().args["matched"], json!(2));
    assert!(validate(&schema, &json!(-1)).valid);
    assert!(validate(&schema, &json!(11)).valid);
}

#[test]
fn not_inverts_the_inner_schema() {
    let schema = json!({"not": {"type": "string"}});
    assert!(validate(&schema, &json!(1)).valid);
    assert!(!validate(&schema, &json!("s")).valid);
}

#[test]
fn speculative_branches_leave_no_collector_trace() {
    let schema = json!({"anyOf": [{"type": "integer"}, {"type": "string"}]});
    let outcome = validate(&schema, &json!("text"));
    assert!(outcome.valid);
    assert!(outcome.errors.is_empty());
}

#[test]
fn sibling_failures_combine_as_a_fan_out() {
    let schema = json!({"type": "string", "minimum": 5});
    let outcome = validate(&schema, &json!(2));
    assert!(!outcome.valid);
    let error = outcome.error.unwrap();
    assert!(error.is_fan_out());
    assert_eq!(error.sub_errors.len(), 2);
}

#[test]
fn error_budget_truncates_descent() {
    let schema = json!({"items": {"type": "integer"}});
    let validator = Validator::new(
        &schema,
        ValidatorOptions::new().with_max_errors(1),
    )
    .unwrap();
    let mut document = json!(["a", "b", "c", "d"]);
    let outcome = validator.validate(&mut document);
    assert!(!outcome.valid);
    assert!(outcome.truncated);
    assert!(outcome.errors.leaf_errors().len() < 4);
}

#[test]
fn nested_paths_reach_the_collector() {
    let schema = json!({
        "properties": {
            "order": {
                "properties": {
                    "lines": {"items": {"properties": {"qty": {"minimum": 1}}}}
                }
            }
        }
    });
    let document = json!({"order": {"lines": [{"qty": 2}, {"qty": 0}]}});
    let outcome = validate(&schema, &document);
    assert!(!outcome.valid);
    assert!(outcome.errors.has_error_at_pointer("/order/lines/1/qty"));
}
