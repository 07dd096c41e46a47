//! Pending arguments: suspension, leftmost-first resolution and rejection

use crate::integration::test_utils::numbers_store;
use serde_json::json;
use tokio::sync::oneshot;
use treelens::{AsyncArg, Node, Outcome, StoreError};

fn pending_from(rx: oneshot::Receiver<i64>) -> AsyncArg {
    AsyncArg::pending(async move { rx.await.map(Node::from).map_err(|e| e.to_string()) })
}

#[tokio::test]
async fn test_push_async_resolves_in_position() {
    let (store, dispatcher) = numbers_store(json!([0]));
    let seq = store.instance().as_sequence().unwrap();
    let (tx1, rx1) = oneshot::channel();
    let (tx2, rx2) = oneshot::channel();

    let args = vec![pending_from(rx1), AsyncArg::value(3), pending_from(rx2)];
    let (outcome, _) = tokio::join!(seq.push_async(args), async {
        // settling the rightmost value first does not unblock the call
        let _ = tx2.send(2);
        tokio::task::yield_now().await;
        assert_eq!(store.state(), Node::from(json!([0])));
        let _ = tx1.send(1);
    });

    assert_eq!(outcome.unwrap(), Outcome::Value(Node::from(4)));
    assert_eq!(store.state(), Node::from(json!([0, 1, 3, 2])));
    assert_eq!(dispatcher.commits(), 1);
}

#[tokio::test]
async fn test_call_suspends_until_value_settles() {
    let (store, dispatcher) = numbers_store(json!([]));
    let seq = store.instance().as_sequence().unwrap();
    let (tx, rx) = oneshot::channel();

    let (outcome, _) = tokio::join!(seq.push_async(vec![pending_from(rx)]), async {
        tokio::task::yield_now().await;
        assert_eq!(dispatcher.commits(), 0);
        let _ = tx.send(5);
    });

    outcome.unwrap();
    assert_eq!(store.state(), Node::from(json!([5])));
}

#[tokio::test]
async fn test_ready_values_need_no_suspension() {
    let (store, _) = numbers_store(json!([1]));
    let seq = store.instance().as_sequence().unwrap();

    seq.push_async(vec![AsyncArg::value(2)]).await.unwrap();
    assert_eq!(store.state(), Node::from(json!([1, 2])));
}

#[tokio::test]
async fn test_rejection_propagates_without_commit() {
    let (store, dispatcher) = numbers_store(json!([1]));
    let before = store.state();
    let seq = store.instance().as_sequence().unwrap();

    let args = vec![
        AsyncArg::value(2),
        AsyncArg::pending(async { Err::<Node, _>("offline".to_string()) }),
    ];
    let err = seq.push_async(args).await.unwrap_err();

    match err {
        StoreError::Rejected(reason) => assert_eq!(reason, "offline"),
        other => panic!("expected rejection, got {:?}", other),
    }
    assert!(store.state().same(&before));
    assert_eq!(dispatcher.commits(), 0);
}

#[tokio::test]
async fn test_splice_auto_resolves() {
    let (store, _) = numbers_store(json!([1, 2, 3]));
    let view = store.instance().as_view().cloned().unwrap();
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(9);

    let args = vec![AsyncArg::value(1), AsyncArg::value(1), pending_from(rx)];
    let removed = view.call_async("splice", args).await.unwrap();

    assert_eq!(removed, Outcome::Value(Node::from(json!([2]))));
    assert_eq!(store.state(), Node::from(json!([1, 9, 3])));
}

#[test]
fn test_sync_call_refuses_pending_values() {
    let (store, _) = numbers_store(json!([]));
    let view = store.instance().as_view().cloned().unwrap();
    let (_tx, rx) = oneshot::channel();

    let err = view.call("push", vec![pending_from(rx)]).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_operations_without_auto_resolve_refuse_pending_values() {
    let (store, dispatcher) = numbers_store(json!([2, 1]));
    let view = store.instance().as_view().cloned().unwrap();
    let (_tx, rx) = oneshot::channel();

    let err = view.call_async("sort", vec![pending_from(rx)]).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
    assert_eq!(dispatcher.commits(), 0);
}
