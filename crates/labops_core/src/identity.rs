//! Caller identity resolution.
//!
//! # Invariants
//! - The role on a resolved `Caller` comes from the directory, never from
//!   request input.

use crate::model::user::{Caller, UserId};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::RepoResult;
use rusqlite::Connection;

/// Maps an authenticated user id to a `Caller`.
pub trait IdentityProvider {
    /// Returns `None` for unknown users.
    fn resolve(&self, user_id: UserId) -> RepoResult<Option<Caller>>;
}

/// Resolves callers from the `users` table on every call.
pub struct DirectoryIdentityProvider<'conn> {
    users: SqliteUserRepository<'conn>,
}

impl<'conn> DirectoryIdentityProvider<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            users: SqliteUserRepository::new(conn),
        }
    }
}

impl IdentityProvider for DirectoryIdentityProvider<'_> {
    fn resolve(&self, user_id: UserId) -> RepoResult<Option<Caller>> {
        Ok(self.users.get_user(user_id)?.as_ref().map(Caller::from_user))
    }
}

impl<P: IdentityProvider + ?Sized> IdentityProvider for &P {
    fn resolve(&self, user_id: UserId) -> RepoResult<Option<Caller>> {
        (**self).resolve(user_id)
    }
}
