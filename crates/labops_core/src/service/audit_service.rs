//! Audit trail and activity history reads.
//!
//! # Invariants
//! - Non-admin callers receive an empty list, never an error, and no history
//!   query is issued on their behalf.

use super::{with_store_retry, ServiceContext, ServiceResult};
use crate::access::{resolve_scope, ResourceKind, Visibility};
use crate::model::audit::{ActivityLogEntry, AuditTrailEntry};
use crate::model::user::Caller;
use crate::repo::activity_repo::{ActivityLogRepository, SqliteActivityLogRepository};
use crate::repo::audit_repo::{AuditTrailRepository, SqliteAuditTrailRepository};

pub struct AuditService<'a> {
    ctx: ServiceContext<'a>,
    audit: SqliteAuditTrailRepository<'a>,
    activity: SqliteActivityLogRepository<'a>,
}

impl<'a> AuditService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self {
            ctx,
            audit: SqliteAuditTrailRepository::new(ctx.conn),
            activity: SqliteActivityLogRepository::new(ctx.conn),
        }
    }

    /// Archived report snapshots, most recently deleted first.
    pub fn list_audit_trail(&self, caller: &Caller) -> ServiceResult<Vec<AuditTrailEntry>> {
        let caller = &self.ctx.authorize(caller)?;
        let scope = resolve_scope(caller, ResourceKind::AuditTrail);
        let entries = with_store_retry(self.ctx.config, "audit_list", || {
            self.audit.list_entries(&scope.visibility)
        })?;
        Ok(entries)
    }

    /// Most recent activity, capped at `activity_list_limit`.
    pub fn list_activity(&self, caller: &Caller) -> ServiceResult<Vec<ActivityLogEntry>> {
        let caller = &self.ctx.authorize(caller)?;
        let scope = resolve_scope(caller, ResourceKind::ActivityLog);
        if scope.visibility == Visibility::Nothing {
            return Ok(Vec::new());
        }
        let limit = self.ctx.config.activity_list_limit;
        let entries = with_store_retry(self.ctx.config, "activity_list", || {
            self.activity.list_recent(limit)
        })?;
        Ok(entries)
    }
}
