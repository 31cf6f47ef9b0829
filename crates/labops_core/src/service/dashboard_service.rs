//! Per-caller landing summary.

use super::{with_store_retry, NotFoundTarget, ServiceContext, ServiceError, ServiceResult};
use crate::access::Visibility;
use crate::model::user::{Caller, Role};
use crate::repo::inventory_repo::{InventoryRepository, SqliteInventoryRepository};
use crate::repo::report_repo::{ReportRepository, SqliteReportRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};

/// Counts of the caller's own records.
///
/// Counts are personal for every role; admins see their own figures too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub display_name: String,
    pub role: Role,
    pub report_count: u64,
    pub assigned_task_count: u64,
    pub inventory_count: u64,
}

pub struct DashboardService<'a> {
    ctx: ServiceContext<'a>,
}

impl<'a> DashboardService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn dashboard(&self, caller: &Caller) -> ServiceResult<DashboardSummary> {
        let caller = &self.ctx.authorize(caller)?;
        let conn = self.ctx.conn;
        let config = self.ctx.config;
        let own = Visibility::OwnedBy(caller.user_id);

        let user = with_store_retry(config, "user_get", || {
            SqliteUserRepository::new(conn).get_user(caller.user_id)
        })?
        .ok_or(ServiceError::NotFound(NotFoundTarget::User(caller.user_id)))?;
        let report_count = with_store_retry(config, "report_count", || {
            SqliteReportRepository::new(conn).count_reports(&own)
        })?;
        let assigned_task_count = with_store_retry(config, "task_count", || {
            SqliteTaskRepository::new(conn).count_tasks(&own)
        })?;
        let inventory_count = with_store_retry(config, "inventory_count", || {
            SqliteInventoryRepository::new(conn).count_items(&own)
        })?;

        Ok(DashboardSummary {
            display_name: user.display_name,
            role: caller.role,
            report_count,
            assigned_task_count,
            inventory_count,
        })
    }
}
