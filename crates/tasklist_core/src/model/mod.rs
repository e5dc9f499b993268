//! Task domain model.
//!
//! # Responsibility
//! - Define the single `Task` entity and its persisted wire shape.
//! - Own the text-length and due-date rules applied at create/edit time.
//!
//! # Invariants
//! - Tasks have no identity beyond their fields and collection position.
//! - Validation never reads the clock itself; callers pass one `now` per call.

pub mod due;
pub mod task;
