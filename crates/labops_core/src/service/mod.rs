//! Core use-case services.
//!
//! # Responsibility
//! - Resolve caller scope before any record is returned or accepted.
//! - Enforce the report mutable window and task assignment rules.
//! - Delegate report deletion to archival.
//! - Record activity after every successful state change.
//!
//! # Invariants
//! - Services never bypass repository validation/persistence contracts.
//! - Every call re-resolves the caller's role from the directory; the role a
//!   `Caller` carries in is never trusted.
//! - Activity-recording failures never change an operation's result.

use crate::access::{ResourceKind, WindowExpired};
use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::identity::{DirectoryIdentityProvider, IdentityProvider};
use crate::model::audit::ActivityAction;
use crate::model::user::Caller;
use crate::model::ModelValidationError;
use crate::repo::activity_repo::SqliteActivityLogRepository;
use crate::repo::RepoError;
use activity::ActivityRecorder;
use archive::ArchiveError;
use log::warn;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod activity;
pub mod archive;
pub mod audit_service;
pub mod dashboard_service;
pub mod directory_service;
pub mod inventory_service;
pub mod report_service;
mod retry;
pub mod session_service;
pub mod task_service;

pub(crate) use retry::with_store_retry;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Shared dependencies handed to every service.
#[derive(Clone, Copy)]
pub struct ServiceContext<'a> {
    pub conn: &'a Connection,
    pub clock: &'a dyn Clock,
    pub config: &'a CoreConfig,
}

impl<'a> ServiceContext<'a> {
    pub fn new(conn: &'a Connection, clock: &'a dyn Clock, config: &'a CoreConfig) -> Self {
        Self {
            conn,
            clock,
            config,
        }
    }

    /// Re-reads `caller`'s role from the directory for the current call.
    ///
    /// The origin address is kept. A user missing from the directory is
    /// `NotFound(User)`.
    pub(crate) fn authorize(&self, caller: &Caller) -> ServiceResult<Caller> {
        let provider = DirectoryIdentityProvider::new(self.conn);
        let resolved = with_store_retry(self.config, "caller_resolve", || {
            provider.resolve(caller.user_id)
        })?
        .ok_or(ServiceError::NotFound(NotFoundTarget::User(caller.user_id)))?;
        if resolved.role != caller.role {
            warn!(
                "event=caller_resolve module=service status=stale user_id={} held_role={} stored_role={}",
                caller.user_id,
                caller.role.as_str(),
                resolved.role.as_str()
            );
        }
        Ok(Caller {
            origin_address: caller.origin_address.clone(),
            ..resolved
        })
    }

    /// Records a best-effort activity entry for `caller`.
    pub(crate) fn record_activity(&self, caller: &Caller, action: ActivityAction) {
        ActivityRecorder::new(SqliteActivityLogRepository::new(self.conn), self.clock).record(
            caller.user_id,
            action,
            caller.origin_address.as_deref(),
        );
    }
}

/// Missing record referenced by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundTarget {
    Report(Uuid),
    Task(Uuid),
    User(Uuid),
    /// Task assignee that does not exist.
    Assignee(Uuid),
    Record(Uuid),
}

impl Display for NotFoundTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Report(id) => write!(f, "report {id}"),
            Self::Task(id) => write!(f, "task {id}"),
            Self::User(id) => write!(f, "user {id}"),
            Self::Assignee(id) => write!(f, "assignee {id}"),
            Self::Record(id) => write!(f, "record {id}"),
        }
    }
}

/// Error taxonomy surfaced to callers.
#[derive(Debug)]
pub enum ServiceError {
    /// Target lies outside the caller's resolved scope.
    Forbidden {
        kind: ResourceKind,
        action: &'static str,
    },
    /// Report mutation after its mutable window closed.
    WindowExpired(WindowExpired),
    NotFound(NotFoundTarget),
    InvalidInput(String),
    /// Store failure; the request may be retried.
    StoreUnavailable(RepoError),
    /// Archive write failed; the report was not deleted.
    ArchiveWriteFailed(RepoError),
    /// Report snapshot is archived but the report is not yet removed; only
    /// a repeated delete may touch it.
    DeletionPending(Uuid),
}

impl ServiceError {
    pub(crate) fn forbidden(kind: ResourceKind, action: &'static str) -> Self {
        Self::Forbidden { kind, action }
    }

    /// Whether repeating the same request may succeed without changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Stable short code for logs and transports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Forbidden { .. } => "forbidden",
            Self::WindowExpired(_) => "window_expired",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::ArchiveWriteFailed(_) => "archive_write_failed",
            Self::DeletionPending(_) => "deletion_pending",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden { kind, action } => write!(f, "forbidden: {action} on {kind:?}"),
            Self::WindowExpired(err) => write!(f, "window expired: {err}"),
            Self::NotFound(target) => write!(f, "not found: {target}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::ArchiveWriteFailed(err) => {
                write!(f, "archive write failed, report kept: {err}")
            }
            Self::DeletionPending(id) => write!(f, "report {id} is pending deletion"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::WindowExpired(err) => Some(err),
            Self::StoreUnavailable(err) => Some(err),
            Self::ArchiveWriteFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidInput(err.to_string()),
            RepoError::NotFound(id) => Self::NotFound(NotFoundTarget::Record(id)),
            other => Self::StoreUnavailable(other),
        }
    }
}

impl From<WindowExpired> for ServiceError {
    fn from(value: WindowExpired) -> Self {
        Self::WindowExpired(value)
    }
}

impl From<ArchiveError> for ServiceError {
    fn from(value: ArchiveError) -> Self {
        match value {
            ArchiveError::NotFound(id) => Self::NotFound(NotFoundTarget::Report(id)),
            ArchiveError::Store(err) => Self::StoreUnavailable(err),
            ArchiveError::ArchiveWriteFailed(err) => Self::ArchiveWriteFailed(err),
            ArchiveError::DeletePending { source, .. } => Self::StoreUnavailable(source),
        }
    }
}

impl From<ModelValidationError> for ServiceError {
    fn from(value: ModelValidationError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}
