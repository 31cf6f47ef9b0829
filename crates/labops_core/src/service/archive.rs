//! Report archival state machine.
//!
//! # Responsibility
//! - Relocate a report into the audit trail, then remove it, as one unit.
//!
//! # Invariants
//! - A report is never removed before its snapshot is persisted.
//! - An existing snapshot is reused: archival resumes at the delete step and
//!   never writes a second entry for the same report.
//! - A failed snapshot write rolls back and leaves the report untouched.
//! - An exhausted delete commits the snapshot and surfaces `DeletePending`.

use crate::clock::Clock;
use crate::model::audit::AuditTrailEntry;
use crate::model::report::ReportId;
use crate::model::user::UserId;
use crate::repo::audit_repo::ArchiveStore;
use crate::repo::RepoError;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Progress of one archival run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchivalState {
    /// Report loaded, snapshot not yet persisted.
    Pending,
    /// Snapshot persisted, report still present.
    Archived,
    /// Snapshot persisted and report removed.
    Deleted,
}

impl ArchivalState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
        }
    }
}

/// Result of a completed archival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutcome {
    pub entry: AuditTrailEntry,
    /// True when an earlier run had already persisted the snapshot.
    pub resumed: bool,
}

#[derive(Debug)]
pub enum ArchiveError {
    NotFound(ReportId),
    /// Transaction control or report read failed; nothing changed.
    Store(RepoError),
    /// Snapshot write failed and was rolled back.
    ArchiveWriteFailed(RepoError),
    /// Snapshot committed, report delete still outstanding.
    DeletePending {
        report_id: ReportId,
        source: RepoError,
    },
}

impl Display for ArchiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "report {id} not found"),
            Self::Store(err) => write!(f, "archive store error: {err}"),
            Self::ArchiveWriteFailed(err) => write!(f, "archive write failed: {err}"),
            Self::DeletePending { report_id, source } => {
                write!(f, "report {report_id} archived but not yet deleted: {source}")
            }
        }
    }
}

impl Error for ArchiveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Store(err) => Some(err),
            Self::ArchiveWriteFailed(err) => Some(err),
            Self::DeletePending { source, .. } => Some(source),
        }
    }
}

/// Drives `Pending -> Archived -> Deleted` over an `ArchiveStore`.
pub struct ArchiveManager<'a, S: ArchiveStore> {
    store: S,
    clock: &'a dyn Clock,
    delete_attempts: u32,
}

impl<'a, S: ArchiveStore> ArchiveManager<'a, S> {
    pub fn new(store: S, clock: &'a dyn Clock, delete_attempts: u32) -> Self {
        Self {
            store,
            clock,
            delete_attempts: delete_attempts.max(1),
        }
    }

    /// Archives `report_id` on behalf of `acting_user` and removes it.
    pub fn archive_and_delete(
        &self,
        report_id: ReportId,
        acting_user: UserId,
    ) -> Result<ArchiveOutcome, ArchiveError> {
        self.store.begin_exclusive().map_err(ArchiveError::Store)?;

        let report = match self.store.find_report(report_id) {
            Ok(Some(report)) => report,
            Ok(None) => {
                self.rollback_quietly(report_id);
                return Err(ArchiveError::NotFound(report_id));
            }
            Err(err) => {
                self.rollback_quietly(report_id);
                return Err(ArchiveError::Store(err));
            }
        };

        let existing = match self.store.find_archive_entry(report_id) {
            Ok(existing) => existing,
            Err(err) => {
                self.rollback_quietly(report_id);
                return Err(ArchiveError::Store(err));
            }
        };

        let mut state = ArchivalState::Pending;
        let resumed = existing.is_some();
        let entry = match existing {
            Some(entry) => {
                info!(
                    "event=archive_resume module=archive status=ok report_id={} entry_id={}",
                    report_id, entry.id
                );
                entry
            }
            None => {
                let entry = AuditTrailEntry::snapshot(&report, acting_user, self.clock.now_ms());
                if let Err(err) = self.store.insert_archive_entry(&entry) {
                    error!(
                        "event=archive_write module=archive status=error report_id={} state={} error={}",
                        report_id,
                        state.as_str(),
                        err
                    );
                    self.rollback_quietly(report_id);
                    return Err(ArchiveError::ArchiveWriteFailed(err));
                }
                entry
            }
        };
        state = ArchivalState::Archived;

        if let Err(err) = self.delete_with_retry(report_id) {
            warn!(
                "event=archive_delete module=archive status=error report_id={} state={} attempts={} error={}",
                report_id,
                state.as_str(),
                self.delete_attempts,
                err
            );
            if let Err(commit_err) = self.store.commit() {
                self.rollback_quietly(report_id);
                return Err(ArchiveError::Store(commit_err));
            }
            return Err(ArchiveError::DeletePending {
                report_id,
                source: err,
            });
        }

        if let Err(err) = self.store.commit() {
            self.rollback_quietly(report_id);
            return Err(ArchiveError::Store(err));
        }
        state = ArchivalState::Deleted;

        info!(
            "event=archive_delete module=archive status=ok report_id={} entry_id={} state={} resumed={}",
            report_id,
            entry.id,
            state.as_str(),
            resumed
        );
        Ok(ArchiveOutcome { entry, resumed })
    }

    fn delete_with_retry(&self, report_id: ReportId) -> Result<(), RepoError> {
        let mut attempt = 1;
        loop {
            match self.store.delete_report(report_id) {
                Ok(_) => return Ok(()),
                Err(err) if attempt < self.delete_attempts => {
                    warn!(
                        "event=archive_delete module=archive status=retry report_id={} attempt={} error={}",
                        report_id, attempt, err
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn rollback_quietly(&self, report_id: ReportId) {
        if let Err(err) = self.store.rollback() {
            error!(
                "event=archive_rollback module=archive status=error report_id={} error={}",
                report_id, err
            );
        }
    }
}
