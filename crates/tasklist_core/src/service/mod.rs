//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, mutation and persistence for UI callers.
//! - Keep presentation layers decoupled from storage details.

pub mod task_store;
