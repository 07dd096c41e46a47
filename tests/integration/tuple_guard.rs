//! Fixed-arity sequences refuse length changes

use crate::integration::test_utils::{pair_schema, store_with};
use serde_json::json;
use treelens::{Node, Outcome, StoreError, StoreOptions};

fn is_structural(result: Result<Outcome, StoreError>) -> bool {
    matches!(result, Err(StoreError::StructuralViolation(_)))
}

#[test]
fn test_length_changes_fail_and_leave_state() {
    let (store, dispatcher) = store_with(pair_schema(), Some(json!([1, "a"])), StoreOptions::default());
    let before = store.state();
    let pair = store.instance().as_sequence().unwrap();

    assert!(is_structural(pair.push([2])));
    assert!(is_structural(pair.unshift([0])));
    assert!(is_structural(pair.splice(0, Some(1), Vec::<Node>::new())));
    assert!(is_structural(pair.splice(1, Some(0), [Node::from("b")])));
    assert!(is_structural(pair.set_len(3)));
    assert!(is_structural(pair.set_len(2)));

    assert!(store.state().same(&before));
    assert_eq!(dispatcher.commits(), 0);
}

#[test]
fn test_same_length_splice_is_allowed() {
    let (store, _) = store_with(pair_schema(), Some(json!([1, "a"])), StoreOptions::default());
    let pair = store.instance().as_sequence().unwrap();

    let removed = pair.splice(1, Some(1), ["b"]).unwrap();
    assert_eq!(removed, Outcome::Value(Node::from(json!(["a"]))));
    assert_eq!(store.state(), Node::from(json!([1, "b"])));
}

#[test]
fn test_reordering_is_allowed() {
    let (store, _) = store_with(pair_schema(), Some(json!([1, "a"])), StoreOptions::default());
    let pair = store.instance().as_sequence().unwrap();

    pair.reverse().unwrap();
    assert_eq!(store.state(), Node::from(json!(["a", 1])));
}

#[test]
fn test_pop_is_caught_by_validation() {
    let options = StoreOptions {
        validate: true,
        ..Default::default()
    };
    let (store, _) = store_with(pair_schema(), Some(json!([1, "a"])), options);
    let before = store.state();
    let pair = store.instance().as_sequence().unwrap();

    let err = pair.pop().unwrap_err();
    assert!(matches!(err, StoreError::InvalidState(_)));
    assert!(store.state().same(&before));
}

#[test]
fn test_operations_work_after_a_violation() {
    let (store, _) = store_with(pair_schema(), Some(json!([2, "x"])), StoreOptions::default());
    let pair = store.instance().as_sequence().unwrap();

    assert!(pair.push([3]).is_err());
    pair.fill(7, Some(0), Some(1)).unwrap();
    assert_eq!(store.state(), Node::from(json!([7, "x"])));
}
