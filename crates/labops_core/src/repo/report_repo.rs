//! Report repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/update/read/list APIs over `reports`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - This repository has no delete path. Reports are removed only by the
//!   archival store in `audit_repo`.
//! - Listing order is `created_at DESC, id ASC`.

use super::{parse_uuid, scope_filter, RepoError, RepoResult};
use crate::access::Visibility;
use crate::model::report::{Report, ReportId};
use rusqlite::{params, params_from_iter, Connection, Row};

pub(crate) const REPORT_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    title,
    description,
    report_date,
    attachment_url,
    created_at,
    updated_at
FROM reports";

/// Repository interface for report persistence.
pub trait ReportRepository {
    fn insert_report(&self, report: &Report) -> RepoResult<ReportId>;
    /// Full-row replacement of mutable fields.
    fn update_report(&self, report: &Report) -> RepoResult<()>;
    fn get_report(&self, id: ReportId) -> RepoResult<Option<Report>>;
    fn list_reports(&self, visibility: &Visibility) -> RepoResult<Vec<Report>>;
    fn count_reports(&self, visibility: &Visibility) -> RepoResult<u64>;
}

/// SQLite-backed report repository.
pub struct SqliteReportRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReportRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReportRepository for SqliteReportRepository<'_> {
    fn insert_report(&self, report: &Report) -> RepoResult<ReportId> {
        report.validate()?;

        self.conn.execute(
            "INSERT INTO reports (
                id,
                owner_id,
                title,
                description,
                report_date,
                attachment_url,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                report.id.to_string(),
                report.owner.to_string(),
                report.title.as_str(),
                report.description.as_str(),
                report.report_date.as_str(),
                report.attachment_url.as_deref(),
                report.created_at,
                report.updated_at,
            ],
        )?;

        Ok(report.id)
    }

    fn update_report(&self, report: &Report) -> RepoResult<()> {
        report.validate()?;

        let changed = self.conn.execute(
            "UPDATE reports
             SET
                title = ?1,
                description = ?2,
                report_date = ?3,
                attachment_url = ?4,
                updated_at = ?5
             WHERE id = ?6;",
            params![
                report.title.as_str(),
                report.description.as_str(),
                report.report_date.as_str(),
                report.attachment_url.as_deref(),
                report.updated_at,
                report.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(report.id));
        }

        Ok(())
    }

    fn get_report(&self, id: ReportId) -> RepoResult<Option<Report>> {
        load_report(self.conn, id)
    }

    fn list_reports(&self, visibility: &Visibility) -> RepoResult<Vec<Report>> {
        let Some(filter) = scope_filter(visibility, "owner_id") else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "{REPORT_SELECT_SQL}{} ORDER BY created_at DESC, id ASC;",
            filter.clause
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(filter.binds))?;
        let mut reports = Vec::new();
        while let Some(row) = rows.next()? {
            reports.push(parse_report_row(row)?);
        }
        Ok(reports)
    }

    fn count_reports(&self, visibility: &Visibility) -> RepoResult<u64> {
        let Some(filter) = scope_filter(visibility, "owner_id") else {
            return Ok(0);
        };
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM reports{};", filter.clause),
            params_from_iter(filter.binds),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

/// Loads one report on any connection or open transaction.
pub(crate) fn load_report(conn: &Connection, id: ReportId) -> RepoResult<Option<Report>> {
    let mut stmt = conn.prepare(&format!("{REPORT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_report_row(row)?));
    }
    Ok(None)
}

fn parse_report_row(row: &Row<'_>) -> RepoResult<Report> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_id")?;

    let report = Report {
        id: parse_uuid(&id_text, "reports.id")?,
        owner: parse_uuid(&owner_text, "reports.owner_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        report_date: row.get("report_date")?,
        attachment_url: row.get("attachment_url")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    report
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("reports.{}: {err}", report.id)))?;
    Ok(report)
}
