//! Shared test utilities for integration tests
//!
//! Schemas and store setup used across the integration modules.

use serde_json::Value;
use std::rc::Rc;
use treelens::schema::{ArrayType, ObjectType, ScalarType, SchemaRef, TupleType};
use treelens::{InMemoryDispatcher, Node, Store, StoreOptions};

/// `App { todos: [Todo { title, done }], filter }`
pub fn app_schema() -> SchemaRef {
    let todo = ObjectType::named("Todo")
        .field("title", ScalarType::string())
        .field("done", ScalarType::boolean())
        .build();
    ObjectType::named("App")
        .field("todos", ArrayType::of(todo))
        .field("filter", ScalarType::string())
        .build()
}

pub fn numbers_schema() -> SchemaRef {
    ArrayType::of(ScalarType::number())
}

pub fn matrix_schema() -> SchemaRef {
    ArrayType::of(ArrayType::of(ScalarType::number()))
}

pub fn pair_schema() -> SchemaRef {
    TupleType::new(vec![ScalarType::number(), ScalarType::string()])
}

/// Store with an in-memory dispatcher seeded with `state` (or the schema default).
pub fn store_with(
    schema: SchemaRef,
    state: Option<Value>,
    options: StoreOptions,
) -> (Rc<Store>, Rc<InMemoryDispatcher>) {
    let store = Store::new(Some(schema), options).unwrap();
    let dispatcher = InMemoryDispatcher::attach(&store, state.map(Node::from)).unwrap();
    (store, dispatcher)
}

pub fn app_store() -> (Rc<Store>, Rc<InMemoryDispatcher>) {
    store_with(app_schema(), None, StoreOptions::default())
}

pub fn numbers_store(values: Value) -> (Rc<Store>, Rc<InMemoryDispatcher>) {
    store_with(numbers_schema(), Some(values), StoreOptions::default())
}

pub fn numeric(a: &Node, b: &Node) -> std::cmp::Ordering {
    a.as_f64().unwrap_or(0.0).total_cmp(&b.as_f64().unwrap_or(0.0))
}
