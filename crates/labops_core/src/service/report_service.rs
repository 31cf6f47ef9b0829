//! Daily report use-cases.
//!
//! # Responsibility
//! - List, create, update and delete reports within the caller's scope.
//! - Route deletion through archival.
//!
//! # Invariants
//! - Mutations check `NotFound`, then `Forbidden`, then `WindowExpired`.
//! - The mutable window applies to admins as well.
//! - A report whose snapshot is already archived may finish deletion even
//!   after its window closed, and may no longer be edited.

use super::archive::ArchiveManager;
use super::{with_store_retry, NotFoundTarget, ServiceContext, ServiceError, ServiceResult};
use crate::access::{resolve_scope, AccessScope, MutableWindow, ResourceKind};
use crate::model::audit::{ActivityAction, AuditTrailEntry};
use crate::model::report::{NewReport, Report, ReportId, ReportPatch};
use crate::model::user::Caller;
use crate::repo::audit_repo::{AuditTrailRepository, SqliteArchiveStore, SqliteAuditTrailRepository};
use crate::repo::report_repo::{ReportRepository, SqliteReportRepository};
use log::{info, warn};
use uuid::Uuid;

/// Report service bound to one connection.
pub struct ReportService<'a> {
    ctx: ServiceContext<'a>,
    reports: SqliteReportRepository<'a>,
}

impl<'a> ReportService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self {
            ctx,
            reports: SqliteReportRepository::new(ctx.conn),
        }
    }

    /// Lists reports visible to `caller`, newest first.
    pub fn list_reports(&self, caller: &Caller) -> ServiceResult<Vec<Report>> {
        let caller = &self.ctx.authorize(caller)?;
        let scope = resolve_scope(caller, ResourceKind::Report);
        let reports = with_store_retry(self.ctx.config, "report_list", || {
            self.reports.list_reports(&scope.visibility)
        })?;
        Ok(reports)
    }

    /// Creates a report owned by `caller`.
    pub fn create_report(&self, caller: &Caller, input: NewReport) -> ServiceResult<Report> {
        let caller = &self.ctx.authorize(caller)?;
        let scope = resolve_scope(caller, ResourceKind::Report);
        if !scope.may_create {
            return Err(ServiceError::forbidden(ResourceKind::Report, "create"));
        }

        let now = self.ctx.clock.now_ms();
        let report = Report {
            id: Uuid::new_v4(),
            owner: caller.user_id,
            title: input.title.trim().to_string(),
            description: input.description,
            report_date: input.report_date,
            attachment_url: input.attachment_url,
            created_at: now,
            updated_at: now,
        };
        report.validate()?;

        with_store_retry(self.ctx.config, "report_create", || {
            self.reports.insert_report(&report)
        })?;
        info!(
            "event=report_create module=report_service status=ok report_id={} owner={}",
            report.id, report.owner
        );
        self.ctx.record_activity(caller, ActivityAction::ReportCreated);
        Ok(report)
    }

    /// Applies `patch` to a report inside its mutable window.
    pub fn update_report(
        &self,
        caller: &Caller,
        id: ReportId,
        patch: ReportPatch,
    ) -> ServiceResult<Report> {
        let caller = &self.ctx.authorize(caller)?;
        let scope = resolve_scope(caller, ResourceKind::Report);
        let mut report = self.load_mutable(caller, &scope, id, "update", false)?;
        if self.archived_entry_exists(id)? {
            warn!(
                "event=report_update module=report_service status=error code=deletion_pending report_id={} actor={}",
                id, caller.user_id
            );
            return Err(ServiceError::DeletionPending(id));
        }
        if patch.is_empty() {
            return Err(ServiceError::InvalidInput(
                "report update carries no fields".to_string(),
            ));
        }

        report.apply(&patch);
        report.updated_at = self.ctx.clock.now_ms();
        report.validate()?;

        with_store_retry(self.ctx.config, "report_update", || {
            self.reports.update_report(&report)
        })
        .map_err(|err| match ServiceError::from(err) {
            ServiceError::NotFound(_) => ServiceError::NotFound(NotFoundTarget::Report(id)),
            other => other,
        })?;
        info!(
            "event=report_update module=report_service status=ok report_id={} actor={}",
            id, caller.user_id
        );
        self.ctx.record_activity(caller, ActivityAction::ReportUpdated);
        Ok(report)
    }

    /// Archives and removes a report. Returns the audit entry.
    pub fn delete_report(&self, caller: &Caller, id: ReportId) -> ServiceResult<AuditTrailEntry> {
        let caller = &self.ctx.authorize(caller)?;
        let scope = resolve_scope(caller, ResourceKind::Report);
        let already_archived = self.archived_entry_exists(id)?;
        self.load_mutable(caller, &scope, id, "delete", already_archived)?;

        let manager = ArchiveManager::new(
            SqliteArchiveStore::new(self.ctx.conn),
            self.ctx.clock,
            self.ctx.config.archive_delete_attempts,
        );
        let outcome = manager
            .archive_and_delete(id, caller.user_id)
            .map_err(|err| {
                warn!(
                    "event=report_delete module=report_service status=error report_id={} error={}",
                    id, err
                );
                ServiceError::from(err)
            })?;

        info!(
            "event=report_delete module=report_service status=ok report_id={} actor={} resumed={}",
            id, caller.user_id, outcome.resumed
        );
        self.ctx.record_activity(caller, ActivityAction::ReportDeleted);
        Ok(outcome.entry)
    }

    fn archived_entry_exists(&self, id: ReportId) -> ServiceResult<bool> {
        let audit = SqliteAuditTrailRepository::new(self.ctx.conn);
        let entry = with_store_retry(self.ctx.config, "audit_lookup", || {
            audit.entry_for_report(id)
        })?;
        Ok(entry.is_some())
    }

    fn load_mutable(
        &self,
        caller: &Caller,
        scope: &AccessScope,
        id: ReportId,
        action: &'static str,
        skip_window: bool,
    ) -> ServiceResult<Report> {
        let report = with_store_retry(self.ctx.config, "report_get", || {
            self.reports.get_report(id)
        })?
        .ok_or(ServiceError::NotFound(NotFoundTarget::Report(id)))?;

        if !scope.visibility.permits(&report) {
            warn!(
                "event=report_{} module=report_service status=error code=forbidden report_id={} actor={}",
                action, id, caller.user_id
            );
            return Err(ServiceError::forbidden(ResourceKind::Report, action));
        }
        if action == "delete" && !scope.may_delete {
            return Err(ServiceError::forbidden(ResourceKind::Report, action));
        }

        if !skip_window {
            MutableWindow::from(self.ctx.config).check(report.created_at, self.ctx.clock.now_ms())?;
        }
        Ok(report)
    }
}
