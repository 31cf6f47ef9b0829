//! Daily report model.
//!
//! # Invariants
//! - `title` is never blank; `report_date` is `YYYY-MM-DD`.
//! - A report leaves storage only through archival.

use super::user::UserId;
use super::validation::{require_text, validate_calendar_date, ModelValidationError};
use super::Scoped;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ReportId = Uuid;

/// Persisted daily report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub report_date: String,
    /// Optional link to an uploaded file.
    pub attachment_url: Option<String>,
    /// Epoch ms. Drives the mutable window.
    pub created_at: i64,
    /// Epoch ms.
    pub updated_at: i64,
}

impl Report {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("title", &self.title)?;
        validate_calendar_date("report_date", &self.report_date)?;
        Ok(())
    }

    /// Applies a partial update in place.
    pub fn apply(&mut self, patch: &ReportPatch) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(report_date) = &patch.report_date {
            self.report_date = report_date.clone();
        }
        if let Some(attachment_url) = &patch.attachment_url {
            self.attachment_url = attachment_url.clone();
        }
    }
}

impl Scoped for Report {
    fn scope_owner(&self) -> UserId {
        self.owner
    }
}

/// Input for report creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub title: String,
    pub description: String,
    pub report_date: String,
    pub attachment_url: Option<String>,
}

/// Partial report update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub report_date: Option<String>,
    /// `Some(None)` clears the attachment.
    pub attachment_url: Option<Option<String>>,
}

impl ReportPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.report_date.is_none()
            && self.attachment_url.is_none()
    }
}
