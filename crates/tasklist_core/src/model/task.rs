//! Task entity and its validation rules.
//!
//! # Responsibility
//! - Define the persisted task record (`text`, `date`, `completed`).
//! - Validate text length and due dates before any mutation happens.
//!
//! # Invariants
//! - Text length is counted in characters after trimming and must be
//!   strictly between `TEXT_MIN_EXCLUSIVE` and `TEXT_MAX_EXCLUSIVE`.
//! - A due date must be strictly later than the `now` passed by the caller.
//! - Stored tasks are never re-validated against the clock.

use crate::model::due::{self, DueAt};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Trimmed text must be longer than this many characters.
pub const TEXT_MIN_EXCLUSIVE: usize = 3;
/// Trimmed text must be shorter than this many characters.
pub const TEXT_MAX_EXCLUSIVE: usize = 255;

/// Which user-facing constraint a validation failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCategory {
    TextLength,
    DueDate,
}

/// Validation failures for task create/edit input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    TextTooShort { len: usize },
    TextTooLong { len: usize },
    DueDateNotInFuture { due_at: DueAt, now: DueAt },
    /// Raw due-date input that could not be parsed.
    InvalidDueDate { input: String },
}

impl TaskValidationError {
    pub fn category(&self) -> ValidationCategory {
        match self {
            Self::TextTooShort { .. } | Self::TextTooLong { .. } => ValidationCategory::TextLength,
            Self::DueDateNotInFuture { .. } | Self::InvalidDueDate { .. } => {
                ValidationCategory::DueDate
            }
        }
    }

    /// Stable machine-readable code for logs and UI mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TextTooShort { .. } => "text_too_short",
            Self::TextTooLong { .. } => "text_too_long",
            Self::DueDateNotInFuture { .. } => "due_date_not_in_future",
            Self::InvalidDueDate { .. } => "due_date_invalid",
        }
    }
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TextTooShort { len } => write!(
                f,
                "task text has {len} characters; must be more than {TEXT_MIN_EXCLUSIVE}"
            ),
            Self::TextTooLong { len } => write!(
                f,
                "task text has {len} characters; must be fewer than {TEXT_MAX_EXCLUSIVE}"
            ),
            Self::DueDateNotInFuture { due_at, now } => write!(
                f,
                "due date {} is not after {}",
                due::format_due_at(due_at),
                due::format_due_at(now)
            ),
            Self::InvalidDueDate { input } => write!(f, "invalid due date `{input}`"),
        }
    }
}

impl Error for TaskValidationError {}

/// One entry of the task list.
///
/// Serialized as `{"text": .., "date": .., "completed": ..}`; `date` is always
/// written, as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub text: String,
    #[serde(rename = "date", with = "due::wire", default)]
    pub due_at: Option<DueAt>,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Creates an open task without a due date. Does not validate.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            due_at: None,
            completed: false,
        }
    }

    /// Validates raw input and builds a new open task.
    ///
    /// # Errors
    /// - Text-length or due-date violations, checked in that order.
    pub fn validated(
        raw_text: &str,
        due_at: Option<DueAt>,
        now: DueAt,
    ) -> Result<Self, TaskValidationError> {
        let text = normalize_text(raw_text)?;
        validate_due_at(due_at, now)?;
        Ok(Self {
            text,
            due_at,
            completed: false,
        })
    }

    pub fn toggle_completed(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }
}

/// Trims `raw` and checks the exclusive length bounds.
///
/// Returns the trimmed text that should be stored.
pub fn normalize_text(raw: &str) -> Result<String, TaskValidationError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();

    if len <= TEXT_MIN_EXCLUSIVE {
        return Err(TaskValidationError::TextTooShort { len });
    }
    if len >= TEXT_MAX_EXCLUSIVE {
        return Err(TaskValidationError::TextTooLong { len });
    }

    Ok(trimmed.to_string())
}

/// Rejects a due date that is not strictly after `now`.
pub fn validate_due_at(due_at: Option<DueAt>, now: DueAt) -> Result<(), TaskValidationError> {
    match due_at {
        Some(due_at) if due_at <= now => {
            Err(TaskValidationError::DueDateNotInFuture { due_at, now })
        }
        _ => Ok(()),
    }
}
