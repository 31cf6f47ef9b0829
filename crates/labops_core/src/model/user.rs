//! User and caller identity model.
//!
//! # Invariants
//! - `Role::from_db` never yields `Admin` for a value it does not recognise.
//! - A `Caller` carries the role as resolved by the identity provider, never
//!   a role supplied by the client.

use super::validation::{require_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable user identifier.
pub type UserId = Uuid;

/// Authorization role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    /// Parses a stored role, falling back to least privilege.
    ///
    /// Missing, empty or unknown values resolve to `Member`.
    pub fn from_db(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("admin") => Self::Admin,
            _ => Self::Member,
        }
    }

    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }
}

/// Directory record for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub role: Role,
    /// Epoch ms.
    pub created_at: i64,
}

impl User {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("display_name", &self.display_name)
    }
}

/// Authenticated identity attached to one request.
///
/// Only an `IdentityProvider` inside this crate builds one. Services
/// re-resolve the role from the directory on every call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Caller {
    pub(crate) user_id: UserId,
    pub(crate) role: Role,
    /// Network origin of the request, when the transport knows it.
    pub(crate) origin_address: Option<String>,
}

impl Caller {
    pub(crate) fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            origin_address: None,
        }
    }

    pub(crate) fn from_user(user: &User) -> Self {
        Self::new(user.id, user.role)
    }

    pub fn with_origin(mut self, origin_address: impl Into<String>) -> Self {
        self.origin_address = Some(origin_address.into());
        self
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Role as resolved when this caller was built.
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn origin_address(&self) -> Option<&str> {
        self.origin_address.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn unknown_or_missing_role_is_member() {
        assert_eq!(Role::from_db(None), Role::Member);
        assert_eq!(Role::from_db(Some("")), Role::Member);
        assert_eq!(Role::from_db(Some("superuser")), Role::Member);
        assert_eq!(Role::from_db(Some("ADMIN")), Role::Member);
        assert_eq!(Role::from_db(Some("admin")), Role::Admin);
    }
}
