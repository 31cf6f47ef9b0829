//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//! - Translate a resolved `Visibility` into a row filter, so scoping is
//!   enforced by the query and not by post-filtering.
//!
//! # Invariants
//! - Repository writes call the model `validate()` before persistence.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `Visibility::Nothing` never reaches SQL; it yields an empty result.

use crate::access::Visibility;
use crate::db::DbError;
use crate::model::ModelValidationError;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod activity_repo;
pub mod audit_repo;
pub mod inventory_repo;
pub mod report_repo;
pub mod task_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all record kinds.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    NotFound(Uuid),
    /// A uniqueness constraint rejected the write.
    Conflict(String),
    InvalidData(String),
}

impl RepoError {
    /// Returns whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Db(err) => err.is_transient(),
            _ => false,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::Conflict(message) => write!(f, "conflicting write: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Conflict(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// SQL fragment plus bindings derived from a visibility predicate.
pub(crate) struct ScopeFilter {
    pub clause: String,
    pub binds: Vec<Value>,
}

/// Builds a `WHERE` clause for `owner_column`.
///
/// Returns `None` when the visibility admits no rows.
pub(crate) fn scope_filter(visibility: &Visibility, owner_column: &str) -> Option<ScopeFilter> {
    match visibility {
        Visibility::All => Some(ScopeFilter {
            clause: String::new(),
            binds: Vec::new(),
        }),
        Visibility::OwnedBy(user_id) => Some(ScopeFilter {
            clause: format!(" WHERE {owner_column} = ?"),
            binds: vec![Value::Text(user_id.to_string())],
        }),
        Visibility::Nothing => None,
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
