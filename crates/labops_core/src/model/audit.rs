//! Append-only history records.
//!
//! # Invariants
//! - `AuditTrailEntry` rows are written once by archival and never mutated.
//! - At most one `AuditTrailEntry` exists per `report_id`.
//! - `ActivityLogEntry` rows are written once by the activity recorder.

use super::report::{Report, ReportId};
use super::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AuditEntryId = Uuid;
pub type ActivityEntryId = Uuid;

/// Snapshot of a deleted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrailEntry {
    pub id: AuditEntryId,
    pub report_id: ReportId,
    pub report_title: String,
    pub report_description: String,
    pub report_date: String,
    pub report_attachment_url: Option<String>,
    pub original_owner: UserId,
    pub deleted_by: UserId,
    /// Epoch ms.
    pub deleted_at: i64,
}

impl AuditTrailEntry {
    /// Builds the archive copy of `report` attributed to `deleted_by`.
    pub fn snapshot(report: &Report, deleted_by: UserId, deleted_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            report_id: report.id,
            report_title: report.title.clone(),
            report_description: report.description.clone(),
            report_date: report.report_date.clone(),
            report_attachment_url: report.attachment_url.clone(),
            original_owner: report.owner,
            deleted_by,
            deleted_at,
        }
    }
}

/// Stable label for a state-changing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    SignIn,
    ReportCreated,
    ReportUpdated,
    ReportDeleted,
    TaskAssigned,
    TaskStatusUpdated,
    TaskDeleted,
    InventoryAdded,
}

impl ActivityAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::SignIn => "sign_in",
            Self::ReportCreated => "report_created",
            Self::ReportUpdated => "report_updated",
            Self::ReportDeleted => "report_deleted",
            Self::TaskAssigned => "task_assigned",
            Self::TaskStatusUpdated => "task_status_updated",
            Self::TaskDeleted => "task_deleted",
            Self::InventoryAdded => "inventory_added",
        }
    }
}

/// One recorded activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: ActivityEntryId,
    pub actor: UserId,
    pub action: String,
    pub origin_address: Option<String>,
    /// Epoch ms.
    pub created_at: i64,
}
