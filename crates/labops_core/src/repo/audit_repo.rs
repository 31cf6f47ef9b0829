//! Audit trail persistence and the archival unit-of-work contract.
//!
//! # Responsibility
//! - Read the append-only `audit_trail`.
//! - Expose `ArchiveStore`: the primitives archival needs (exclusive unit of
//!   work, report read, archive insert, report delete).
//!
//! # Invariants
//! - `audit_trail.report_id` is UNIQUE; a second insert for the same report
//!   fails with `RepoError::Conflict`.
//! - `delete_report` is idempotent: deleting a missing report reports
//!   `false` instead of failing.
//! - `SqliteArchiveStore::begin_exclusive` takes the database write lock
//!   (`BEGIN IMMEDIATE`), so concurrent archivals of one report serialize.

use super::report_repo::load_report;
use super::{is_constraint_violation, parse_uuid, scope_filter, RepoError, RepoResult};
use crate::access::Visibility;
use crate::model::audit::AuditTrailEntry;
use crate::model::report::{Report, ReportId};
use rusqlite::{params, params_from_iter, Connection, Row};

const AUDIT_SELECT_SQL: &str = "SELECT
    id,
    report_id,
    report_title,
    report_description,
    report_date,
    report_attachment_url,
    original_owner_id,
    deleted_by,
    deleted_at
FROM audit_trail";

/// Read access to archived report snapshots.
pub trait AuditTrailRepository {
    /// Lists entries ordered `deleted_at DESC, id ASC`.
    fn list_entries(&self, visibility: &Visibility) -> RepoResult<Vec<AuditTrailEntry>>;
    fn entry_for_report(&self, report_id: ReportId) -> RepoResult<Option<AuditTrailEntry>>;
}

/// Storage primitives used by the archival state machine.
///
/// Calls between `begin_exclusive` and `commit`/`rollback` form one
/// all-or-nothing unit of work that excludes other writers.
pub trait ArchiveStore {
    fn begin_exclusive(&self) -> RepoResult<()>;
    fn commit(&self) -> RepoResult<()>;
    fn rollback(&self) -> RepoResult<()>;
    fn find_report(&self, id: ReportId) -> RepoResult<Option<Report>>;
    fn find_archive_entry(&self, report_id: ReportId) -> RepoResult<Option<AuditTrailEntry>>;
    fn insert_archive_entry(&self, entry: &AuditTrailEntry) -> RepoResult<()>;
    /// Returns `false` when the report was already gone.
    fn delete_report(&self, id: ReportId) -> RepoResult<bool>;
}

pub struct SqliteAuditTrailRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuditTrailRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AuditTrailRepository for SqliteAuditTrailRepository<'_> {
    fn list_entries(&self, visibility: &Visibility) -> RepoResult<Vec<AuditTrailEntry>> {
        let Some(filter) = scope_filter(visibility, "original_owner_id") else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "{AUDIT_SELECT_SQL}{} ORDER BY deleted_at DESC, id ASC;",
            filter.clause
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(filter.binds))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_audit_row(row)?);
        }
        Ok(entries)
    }

    fn entry_for_report(&self, report_id: ReportId) -> RepoResult<Option<AuditTrailEntry>> {
        load_entry_for_report(self.conn, report_id)
    }
}

/// SQLite implementation of `ArchiveStore`.
pub struct SqliteArchiveStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArchiveStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ArchiveStore for SqliteArchiveStore<'_> {
    fn begin_exclusive(&self) -> RepoResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        Ok(())
    }

    fn commit(&self) -> RepoResult<()> {
        self.conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    fn rollback(&self) -> RepoResult<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK;")?;
        Ok(())
    }

    fn find_report(&self, id: ReportId) -> RepoResult<Option<Report>> {
        load_report(self.conn, id)
    }

    fn find_archive_entry(&self, report_id: ReportId) -> RepoResult<Option<AuditTrailEntry>> {
        load_entry_for_report(self.conn, report_id)
    }

    fn insert_archive_entry(&self, entry: &AuditTrailEntry) -> RepoResult<()> {
        let result = self.conn.execute(
            "INSERT INTO audit_trail (
                id,
                report_id,
                report_title,
                report_description,
                report_date,
                report_attachment_url,
                original_owner_id,
                deleted_by,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                entry.id.to_string(),
                entry.report_id.to_string(),
                entry.report_title.as_str(),
                entry.report_description.as_str(),
                entry.report_date.as_str(),
                entry.report_attachment_url.as_deref(),
                entry.original_owner.to_string(),
                entry.deleted_by.to_string(),
                entry.deleted_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_constraint_violation(&err) => Err(RepoError::Conflict(format!(
                "report {} already archived ({err})",
                entry.report_id
            ))),
            Err(err) => Err(err.into()),
        }
    }

    fn delete_report(&self, id: ReportId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM reports WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

fn load_entry_for_report(
    conn: &Connection,
    report_id: ReportId,
) -> RepoResult<Option<AuditTrailEntry>> {
    let mut stmt = conn.prepare(&format!("{AUDIT_SELECT_SQL} WHERE report_id = ?1;"))?;
    let mut rows = stmt.query([report_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_audit_row(row)?));
    }
    Ok(None)
}

fn parse_audit_row(row: &Row<'_>) -> RepoResult<AuditTrailEntry> {
    let id_text: String = row.get("id")?;
    let report_text: String = row.get("report_id")?;
    let owner_text: String = row.get("original_owner_id")?;
    let deleter_text: String = row.get("deleted_by")?;
    Ok(AuditTrailEntry {
        id: parse_uuid(&id_text, "audit_trail.id")?,
        report_id: parse_uuid(&report_text, "audit_trail.report_id")?,
        report_title: row.get("report_title")?,
        report_description: row.get("report_description")?,
        report_date: row.get("report_date")?,
        report_attachment_url: row.get("report_attachment_url")?,
        original_owner: parse_uuid(&owner_text, "audit_trail.original_owner_id")?,
        deleted_by: parse_uuid(&deleter_text, "audit_trail.deleted_by")?,
        deleted_at: row.get("deleted_at")?,
    })
}
