//! Property-based tests for persistence and view caching

mod structural_sharing;
