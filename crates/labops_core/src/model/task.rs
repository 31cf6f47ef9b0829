//! Assigned task model.
//!
//! # Invariants
//! - `status` only moves forward for assignees (`pending -> in_progress ->
//!   completed`); admins may set any status.

use super::user::UserId;
use super::validation::{require_text, validate_calendar_date, ModelValidationError};
use super::Scoped;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Whether moving to `next` keeps or advances progress.
    pub fn can_advance_to(self, next: Self) -> bool {
        next >= self
    }
}

/// Persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub assignee: UserId,
    pub creator: UserId,
    pub status: TaskStatus,
    pub due_date: Option<String>,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms.
    pub updated_at: i64,
}

impl Task {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("title", &self.title)?;
        if let Some(due_date) = &self.due_date {
            validate_calendar_date("due_date", due_date)?;
        }
        Ok(())
    }
}

impl Scoped for Task {
    fn scope_owner(&self) -> UserId {
        self.assignee
    }
}

/// Input for task creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    /// Required; `None` is rejected as invalid input.
    pub assignee: Option<UserId>,
    pub due_date: Option<String>,
    pub status: TaskStatus,
}
