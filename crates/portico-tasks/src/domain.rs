//! The task domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum accepted title length in characters.
pub const MAX_TITLE_LEN: usize = 100;

/// Maximum accepted description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// A tracked unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable identifier, time-ordered.
    pub id: Uuid,
    /// Short summary, 1 to 100 characters.
    pub title: String,
    /// Optional longer text, up to 500 characters.
    pub description: Option<String>,
    /// Workflow state.
    pub status: TaskStatus,
    /// Scheduling weight.
    pub priority: TaskPriority,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task was last modified.
    pub updated_at: DateTime<Utc>,
}

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Pending,
    /// Being worked on.
    InProgress,
    /// Finished.
    Completed,
}

impl TaskStatus {
    /// Parses the wire spelling, e.g. `"in_progress"`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Returns the wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling weight of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Can wait.
    Low,
    /// Normal.
    Medium,
    /// Urgent.
    High,
}

impl TaskPriority {
    /// Parses the wire spelling, e.g. `"medium"`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Returns the wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain failures with a fixed identity, matched by value in the error
/// mappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The referenced task does not exist.
    #[error("task not found")]
    NotFound,

    /// An unknown workflow state was supplied.
    #[error("invalid status: must be pending, in_progress, or completed")]
    InvalidStatus,

    /// An unknown priority was supplied.
    #[error("invalid priority: must be low, medium, or high")]
    InvalidPriority,

    /// The title breaks the length limits.
    #[error("invalid title: must be between 1 and 100 characters")]
    InvalidTitle,

    /// The description breaks the length limit.
    #[error("invalid description: must be at most 500 characters")]
    InvalidDescription,

    /// The id path parameter is not a UUID.
    #[error("invalid id: must be a valid UUID")]
    InvalidId,

    /// An update carried no fields to change.
    #[error("update request must contain at least one field")]
    EmptyUpdate,
}

/// A rejected request body, matched by type in the error mappers. Unlike
/// [`TaskError`] it carries the decoder's message, so it cannot be a value
/// sentinel.
#[derive(Debug, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// The offending field.
    pub field: &'static str,
    /// Why it was rejected.
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error for a field.
    #[must_use]
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Checks a title against the domain limits.
pub(crate) fn validate_title(title: &str) -> Result<(), TaskError> {
    if title.trim().is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(TaskError::InvalidTitle);
    }
    Ok(())
}

/// Checks a description against the domain limits.
pub(crate) fn validate_description(description: &str) -> Result<(), TaskError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(TaskError::InvalidDescription);
    }
    Ok(())
}
