//! User directory repository.
//!
//! # Invariants
//! - Users are never deleted by core code.
//! - Stored role text is decoded leniently (`Role::from_db`); it is never a
//!   reason to fail a read.

use super::{parse_uuid, RepoResult};
use crate::model::user::{Role, User, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, display_name, role, created_at FROM users";

/// Repository interface for the user directory.
pub trait UserRepository {
    fn insert_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn user_exists(&self, id: UserId) -> RepoResult<bool>;
    /// Lists all users ordered by display name.
    fn list_users(&self) -> RepoResult<Vec<User>>;
}

/// SQLite-backed user directory.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn insert_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;
        self.conn.execute(
            "INSERT INTO users (id, display_name, role, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user.id.to_string(),
                user.display_name.trim(),
                user.role.as_str(),
                user.created_at,
            ],
        )?;
        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn user_exists(&self, id: UserId) -> RepoResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM users WHERE id = ?1;",
                [id.to_string()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL} ORDER BY display_name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let role_text: Option<String> = row.get("role")?;
    Ok(User {
        id: parse_uuid(&id_text, "users.id")?,
        display_name: row.get("display_name")?,
        role: Role::from_db(role_text.as_deref()),
        created_at: row.get("created_at")?,
    })
}
