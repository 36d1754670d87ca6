//! R*-tree integration test module.
//!
//! These tests drive the tree through its public API on a real directory
//! store and compare every answer with a linear scan.

mod insert_test;
mod search_test;
mod persistence_test;
