//! Deterministic, pure logic shared by the scaffolder.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod budget;
pub mod catalog;
pub mod classifier;
pub mod command_policy;
pub mod completion;
pub mod features;
pub mod results;
pub mod state;
pub mod types;
