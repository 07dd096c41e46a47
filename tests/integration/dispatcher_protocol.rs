//! Action round-trips through a host dispatcher

use crate::integration::test_utils::{app_schema, numbers_store};
use serde_json::json;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use treelens::{
    Action, Arg, Dispatcher, Node, Outcome, Path, Store, StoreError, StoreOptions, WireAction,
};

/// Dispatcher that keeps a log of every action it reduces.
struct Recorder {
    store: Weak<Store>,
    state: RefCell<Node>,
    seen: RefCell<Vec<(String, Option<Path>)>>,
}

impl Recorder {
    fn attach(store: &Rc<Store>) -> Rc<Self> {
        let recorder = Rc::new(Recorder {
            store: Rc::downgrade(store),
            state: RefCell::new(Node::UNDEFINED),
            seen: RefCell::new(Vec::new()),
        });
        recorder.dispatch(Action::init()).unwrap();
        store.set_dispatcher(recorder.clone());
        recorder
    }

    fn types(&self) -> Vec<String> {
        self.seen.borrow().iter().map(|(t, _)| t.clone()).collect()
    }
}

impl Dispatcher for Recorder {
    fn dispatch(&self, action: Action) -> Result<(), StoreError> {
        let store = self.store.upgrade().ok_or(StoreError::NoDispatcher)?;
        self.seen
            .borrow_mut()
            .push((action.action_type.clone(), action.path.clone()));
        let current = self.state.borrow().clone();
        let next = store.reduce(current, &action)?;
        *self.state.borrow_mut() = next;
        Ok(())
    }

    fn get_state(&self) -> Node {
        self.state.borrow().clone()
    }
}

fn recorded_app() -> (Rc<Store>, Rc<Recorder>) {
    let store = Store::new(Some(app_schema()), StoreOptions::default()).unwrap();
    let recorder = Recorder::attach(&store);
    (store, recorder)
}

#[test]
fn test_action_types_and_paths() {
    let (store, recorder) = recorded_app();
    let root = store.instance().as_map().unwrap();
    let todos = root.get("todos").as_sequence().unwrap();

    todos.push([json!({"title": "a"})]).unwrap();
    todos.get(0).as_map().unwrap().set("title", "b").unwrap();
    todos.set_len(0).unwrap();
    root.set("filter", "all").unwrap();

    assert_eq!(
        recorder.types(),
        vec![
            "@@treelens/INIT",
            "PUSH_TODOS",
            "SET_TODOS_TITLE",
            "ASSIGN_LENGTH_TODOS",
            "SET_FILTER",
        ]
    );
    let seen = recorder.seen.borrow();
    assert_eq!(seen[0].1, None);
    assert_eq!(seen[1].1, Some(Path::parse("todos.push")));
    assert_eq!(seen[2].1, Some(Path::parse("todos.0.title")));
    assert_eq!(seen[3].1, Some(Path::parse("todos.length")));
    assert_eq!(store.state(), Node::from(json!({"todos": [], "filter": "all"})));
}

#[test]
fn test_seeding_uses_schema_default() {
    let (store, _) = recorded_app();
    assert_eq!(store.state(), Node::from(json!({"todos": [], "filter": ""})));
}

#[test]
fn test_hand_built_action_runs_operation() {
    let (store, _) = numbers_store(json!([1]));
    let action = Action::method("PUSH_ROOT", Path::parse("push"), vec![Arg::value(2)]);

    let outcome = store.dispatch(action).unwrap();
    assert_eq!(outcome, Outcome::Value(Node::from(2)));
    assert_eq!(store.state(), Node::from(json!([1, 2])));
}

#[test]
fn test_mismatched_action_type_does_nothing() {
    let (store, dispatcher) = numbers_store(json!([1]));
    let before = store.state();
    let action = Action::method("SORT_ROOT", Path::parse("push"), vec![Arg::value(2)]);

    let outcome = store.dispatch(action).unwrap();
    assert!(outcome.is_nothing());
    assert!(store.state().same(&before));
    assert_eq!(dispatcher.commits(), 0);
}

#[test]
fn test_wire_actions_reach_the_reducer() {
    let (store, _) = numbers_store(json!([3, 1]));
    let sort: WireAction = serde_json::from_value(json!({"path": ["sort"], "args": []})).unwrap();
    let set: WireAction = serde_json::from_value(json!({"path": [0], "value": 7})).unwrap();

    store.dispatch(sort.into_action()).unwrap();
    store.dispatch(set.into_action()).unwrap();
    assert_eq!(store.state(), Node::from(json!([7, 3])));
}

#[test]
fn test_unknown_view_path_is_reported() {
    let (store, recorder) = recorded_app();
    let action = Action::method("PUSH_MISSING", Path::parse("missing.push"), Vec::new());

    let err = store.dispatch(action).unwrap_err();
    assert!(matches!(err, StoreError::PathNotFound(_)));
    assert_eq!(err.to_string(), "Path \"missing\" not found in state.");
    assert!(!store.in_reduction());
    assert_eq!(recorder.types().len(), 2);
}

#[test]
fn test_mutation_without_dispatcher_fails() {
    let store = Store::with_schema(app_schema()).unwrap();
    assert!(store.state().is_undefined());

    let err = store.put(&Path::parse("filter"), Node::from("x")).unwrap_err();
    assert!(matches!(err, StoreError::NoDispatcher));

    let root = store.instance().as_view().cloned().unwrap();
    let err = root.set(&"filter".into(), Node::from("x")).unwrap_err();
    assert!(matches!(err, StoreError::NoDispatcher));
}

#[test]
fn test_pathless_actions_pass_through() {
    let store = Store::with_schema(app_schema()).unwrap();
    let state = Node::from(json!({"todos": [], "filter": "x"}));
    let action = Action {
        action_type: "host/PING".to_string(),
        path: None,
        value: None,
        args: None,
    };

    let next = store.reduce(state.clone(), &action).unwrap();
    assert!(next.same(&state));
}
