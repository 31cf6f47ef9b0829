//! Core domain logic for LabOps.
//!
//! Access scoping, the report mutable window and report archival live here;
//! hosts call the services in [`service`] with a `Caller` produced by an
//! [`identity::IdentityProvider`].

pub mod access;
pub mod clock;
pub mod config;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::{resolve_scope, AccessScope, MutableWindow, ResourceKind, Visibility};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, open_db_with_options, DbError, StoreOptions};
pub use identity::{DirectoryIdentityProvider, IdentityProvider};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::audit::{ActivityAction, ActivityLogEntry, AuditTrailEntry};
pub use model::inventory::{InventoryItem, NewInventoryItem};
pub use model::report::{NewReport, Report, ReportPatch};
pub use model::task::{NewTask, Task, TaskStatus};
pub use model::user::{Caller, Role, User, UserId};
pub use repo::{RepoError, RepoResult};
pub use service::audit_service::AuditService;
pub use service::dashboard_service::{DashboardService, DashboardSummary};
pub use service::directory_service::DirectoryService;
pub use service::inventory_service::InventoryService;
pub use service::report_service::ReportService;
pub use service::session_service::SessionService;
pub use service::task_service::TaskService;
pub use service::{NotFoundTarget, ServiceContext, ServiceError, ServiceResult};

/// Minimal health-check API for host wiring.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
