//! View cache bound, recency and moniker-sensitive reuse

use crate::integration::test_utils::{matrix_schema, numbers_schema, store_with};
use serde_json::json;
use std::rc::Rc;
use treelens::schema::{ArrayType, ScalarType, SchemaRef};
use treelens::{Path, StoreOptions};

fn small_cache() -> StoreOptions {
    StoreOptions {
        max_cache: 3,
        ..Default::default()
    }
}

#[test]
fn test_lru_eviction_and_recency() {
    let (store, _) = store_with(matrix_schema(), Some(json!([[1], [2], [3], [4]])), small_cache());
    let seq = store.instance().as_sequence().unwrap();
    let a = seq.get(0).as_view().cloned().unwrap();
    let b = seq.get(1).as_view().cloned().unwrap();
    assert_eq!(store.cache_len(), 3);

    // touching [0] makes the root the least recent entry
    assert!(Rc::ptr_eq(&a, seq.get(0).as_view().unwrap()));
    seq.get(2);
    assert_eq!(store.cache_len(), 3);
    assert!(store.cached_view(&Path::root()).is_none());

    // [1] was never touched again, so it goes before [0]
    seq.get(3);
    assert!(store.cached_view(&Path::parse("1")).is_none());
    assert!(store.cached_view(&Path::parse("0")).is_some());

    let b2 = seq.get(1).as_view().cloned().unwrap();
    assert!(!Rc::ptr_eq(&b, &b2));
    assert_eq!(b.value(), b2.value());
    assert_eq!(
        store.cached_paths(),
        vec![Path::parse("1"), Path::parse("3"), Path::parse("2")]
    );
}

#[test]
fn test_cache_never_exceeds_capacity() {
    let rows: Vec<serde_json::Value> = (0..20).map(|i| json!([i])).collect();
    let (store, _) = store_with(matrix_schema(), Some(json!(rows)), small_cache());
    let seq = store.instance().as_sequence().unwrap();
    for ix in 0..20 {
        seq.get(ix);
        assert!(store.cache_len() <= store.cache_capacity());
    }
    assert_eq!(store.cache_capacity(), 3);
}

#[test]
fn test_moniker_mismatch_replaces_entry() {
    let (store, _) = store_with(numbers_schema(), Some(json!([])), StoreOptions::default());
    let numbers: SchemaRef = ArrayType::of(ScalarType::number());
    let strings: SchemaRef = ArrayType::of(ScalarType::string());
    let path = Path::parse("list");

    let first = store
        .unpack(numbers.clone(), path.clone(), path.clone(), None, None)
        .as_view()
        .cloned()
        .unwrap();
    let same = store
        .unpack(numbers.clone(), path.clone(), path.clone(), None, None)
        .as_view()
        .cloned()
        .unwrap();
    assert!(Rc::ptr_eq(&first, &same));

    let other = store
        .unpack(strings, path.clone(), path.clone(), None, None)
        .as_view()
        .cloned()
        .unwrap();
    assert!(!Rc::ptr_eq(&first, &other));
    assert!(Rc::ptr_eq(&store.cached_view(&path).unwrap(), &other));

    // a supplied view with a matching moniker is installed as-is
    let restored = store
        .unpack(numbers, path.clone(), path.clone(), Some(first.clone()), None)
        .as_view()
        .cloned()
        .unwrap();
    assert!(Rc::ptr_eq(&restored, &first));
    assert!(Rc::ptr_eq(&store.cached_view(&path).unwrap(), &first));
}

#[test]
fn test_scalars_are_not_cached() {
    let (store, _) = store_with(numbers_schema(), Some(json!([1, 2])), StoreOptions::default());
    let seq = store.instance().as_sequence().unwrap();
    let before = store.cache_len();
    assert!(seq.get(0).as_node().is_some());
    assert_eq!(store.cache_len(), before);
}

#[test]
fn test_child_views_know_their_parent() {
    let (store, _) = store_with(matrix_schema(), Some(json!([[1]])), StoreOptions::default());
    let root = store.instance().as_view().cloned().unwrap();
    let row = root.as_sequence().unwrap().get(0).as_view().cloned().unwrap();
    assert!(Rc::ptr_eq(&row.parent().unwrap(), &root));
    assert_eq!(row.view_path(), &Path::parse("0"));
}
