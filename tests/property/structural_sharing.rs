//! Property-based tests for structural sharing and cache bounds

use proptest::prelude::*;
use serde_json::json;
use treelens::schema::{ArrayType, ScalarType};
use treelens::tree::update::update_at;
use treelens::{InMemoryDispatcher, Key, Node, Store, StoreOptions};

fn grid(rows: &[Vec<i64>]) -> Node {
    Node::seq(rows.iter().map(|row| Node::seq(row.iter().copied().map(Node::from))))
}

fn rows_strategy() -> impl Strategy<Value = Vec<Vec<i64>>> {
    prop::collection::vec(prop::collection::vec(-100i64..100, 1..6), 1..8)
}

/// Writing one row leaves every other row as the same allocation
#[test]
fn test_update_shares_off_path_siblings() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(rows_strategy(), any::<prop::sample::Index>(), any::<i64>()), |(rows, pick, value)| {
            let state = grid(&rows);
            let ix = pick.index(rows.len());
            let next = update_at(&state, &[Key::Index(ix), Key::Index(0)], Node::from(value)).unwrap();

            for j in 0..rows.len() {
                let key = Key::Index(j);
                if j != ix {
                    prop_assert!(next.child(&key).same(&state.child(&key)));
                }
            }
            prop_assert_eq!(next.get_in(&[Key::Index(ix), Key::Index(0)]), Node::from(value));
            Ok(())
        })
        .unwrap();
}

/// Writing back the current value returns the original root
#[test]
fn test_noop_update_returns_same_root() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(rows_strategy(), any::<prop::sample::Index>(), any::<prop::sample::Index>()), |(rows, row, col)| {
            let state = grid(&rows);
            let ix = row.index(rows.len());
            let jx = col.index(rows[ix].len());
            let path = [Key::Index(ix), Key::Index(jx)];

            let next = update_at(&state, &path, state.get_in(&path)).unwrap();
            prop_assert!(next.same(&state));
            Ok(())
        })
        .unwrap();
}

/// Comparator sort through a view matches a stable sort of the same data
#[test]
fn test_sort_matches_stable_model() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(-50i64..50, 0..20), |values| {
            let store = Store::new(Some(ArrayType::of(ScalarType::number())), StoreOptions::default()).unwrap();
            InMemoryDispatcher::attach(&store, Some(Node::from(json!(values)))).unwrap();
            let seq = store.instance().as_sequence().unwrap();

            let bucket = |node: &Node| (node.as_f64().unwrap_or(0.0) as i64).rem_euclid(5);
            seq.sort_by(move |a, b| bucket(a).cmp(&bucket(b))).unwrap();

            let mut model = values.clone();
            model.sort_by_key(|v| v.rem_euclid(5));
            prop_assert_eq!(store.state(), Node::from(json!(model)));
            Ok(())
        })
        .unwrap();
}

/// Random view access never grows the cache past its capacity
#[test]
fn test_cache_len_bounded_by_capacity() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(1usize..5, prop::collection::vec(0usize..12, 0..40)), |(capacity, accesses)| {
            let options = StoreOptions {
                max_cache: capacity,
                ..Default::default()
            };
            let schema = ArrayType::of(ArrayType::of(ScalarType::number()));
            let store = Store::new(Some(schema), options).unwrap();
            let rows: Vec<serde_json::Value> = (0..12).map(|i| json!([i])).collect();
            InMemoryDispatcher::attach(&store, Some(Node::from(json!(rows)))).unwrap();
            let seq = store.instance().as_sequence().unwrap();

            for ix in accesses {
                let row = seq.get(ix);
                prop_assert!(row.as_view().is_some());
                prop_assert!(store.cache_len() <= capacity);
            }
            Ok(())
        })
        .unwrap();
}
