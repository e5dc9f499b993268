//! Search over the in-memory task list.
//!
//! # Responsibility
//! - Expose literal, case-insensitive term matching and highlighting.

pub mod term;
