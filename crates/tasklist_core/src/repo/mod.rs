//! Storage layer: key-value slots and the task list persisted into them.
//!
//! # Responsibility
//! - Define the slot storage contract and its SQLite/in-memory backends.
//! - Keep serialization of the task list out of the service layer.
//!
//! # Invariants
//! - Storage failures are returned as errors, never swallowed.

pub mod slot_repo;
pub mod task_persistence;
