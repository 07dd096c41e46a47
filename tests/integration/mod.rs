//! Integration tests for the treelens state container

pub mod test_utils;

mod async_resolution;
mod dispatcher_protocol;
mod replay_cli;
mod tuple_guard;
mod view_cache;
