// crates/fieldgate-core/tests/proptest_paths.rs
// ============================================================================
// Module: Path and Injector Property-Based Tests
// Description: Property tests for pointer rendering and in-place writes.
// Purpose: Detect escaping drift and lost writes across generated paths.
// Dependencies: fieldgate-core, proptest, serde_json
// ============================================================================

//! Property-based tests over [`DataPath`] rendering and the value injector.

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

use fieldgate_core::DataPath;
use fieldgate_core::runtime::injector::set_value;
use fieldgate_core::runtime::injector::unset_value;
use proptest::prelude::*;
use serde_json::json;

/// Member-name segments, including the two characters JSON Pointer escapes.
fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-z~/]{1,4}"
}

/// Non-root paths built from generated member names.
fn path_strategy() -> impl Strategy<Value = DataPath> {
    prop::collection::vec(segment_strategy(), 1 .. 4).prop_map(|segments| {
        let mut path = DataPath::root();
        for segment in &segments {
            path.push_member(segment);
        }
        path
    })
}

proptest! {
    #[test]
    fn canonical_pointers_parse_back_to_the_same_path(path in path_strategy()) {
        let parsed = DataPath::parse_absolute(&path.canonical()).unwrap();
        prop_assert_eq!(parsed, path);
    }

    #[test]
    fn written_values_are_found_at_their_canonical_pointer(
        path in path_strategy(),
        marker in any::<i32>(),
    ) {
        let mut document = json!({});
        set_value(&mut document, &path, |_| json!(marker)).unwrap();
        prop_assert_eq!(document.pointer(&path.canonical()), Some(&json!(marker)));
    }

    #[test]
    fn unset_after_set_leaves_the_location_absent(
        path in path_strategy(),
        marker in any::<i32>(),
    ) {
        let mut document = json!({});
        set_value(&mut document, &path, |_| json!(marker)).unwrap();
        unset_value(&mut document, &path).unwrap();
        prop_assert_eq!(document.pointer(&path.canonical()), None);
    }

    #[test]
    fn transforms_observe_the_previously_written_value(
        path in path_strategy(),
        first in any::<i32>(),
        second in any::<i32>(),
    ) {
        let mut document = json!({});
        set_value(&mut document, &path, |_| json!(first)).unwrap();
        let mut observed = None;
        set_value(&mut document, &path, |old| {
            observed = old;
            json!(second)
        })
        .unwrap();
        prop_assert_eq!(observed, Some(json!(first)));
        prop_assert_eq!(document.pointer(&path.canonical()), Some(&json!(second)));
    }
}
