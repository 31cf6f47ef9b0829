//! Activity log repository.
//!
//! # Invariants
//! - Append-only: no update or delete path exists.
//! - Reads are ordered `created_at DESC`, ties in insertion order (`seq ASC`).

use super::{parse_uuid, RepoResult};
use crate::model::audit::{ActivityEntryId, ActivityLogEntry};
use rusqlite::{params, Connection, Row};

pub trait ActivityLogRepository {
    fn append(&self, entry: &ActivityLogEntry) -> RepoResult<ActivityEntryId>;
    fn list_recent(&self, limit: u32) -> RepoResult<Vec<ActivityLogEntry>>;
}

pub struct SqliteActivityLogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityLogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ActivityLogRepository for SqliteActivityLogRepository<'_> {
    fn append(&self, entry: &ActivityLogEntry) -> RepoResult<ActivityEntryId> {
        self.conn.execute(
            "INSERT INTO activity_logs (id, actor_id, action, origin_address, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                entry.id.to_string(),
                entry.actor.to_string(),
                entry.action.as_str(),
                entry.origin_address.as_deref(),
                entry.created_at,
            ],
        )?;
        Ok(entry.id)
    }

    fn list_recent(&self, limit: u32) -> RepoResult<Vec<ActivityLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, actor_id, action, origin_address, created_at
             FROM activity_logs
             ORDER BY created_at DESC, seq ASC
             LIMIT ?1;",
        )?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_activity_row(row)?);
        }
        Ok(entries)
    }
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<ActivityLogEntry> {
    let id_text: String = row.get("id")?;
    let actor_text: String = row.get("actor_id")?;
    Ok(ActivityLogEntry {
        id: parse_uuid(&id_text, "activity_logs.id")?,
        actor: parse_uuid(&actor_text, "activity_logs.actor_id")?,
        action: row.get("action")?,
        origin_address: row.get("origin_address")?,
        created_at: row.get("created_at")?,
    })
}
