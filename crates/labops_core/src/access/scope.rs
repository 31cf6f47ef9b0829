//! Authorization scope resolver.

use crate::model::user::{Caller, UserId};
use crate::model::Scoped;

/// Resource families guarded by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Report,
    Task,
    Inventory,
    AuditTrail,
    ActivityLog,
}

/// Row-level read predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Every record of the kind.
    All,
    /// Records whose scope owner is this user.
    OwnedBy(UserId),
    /// No records. Listings return empty rather than failing.
    Nothing,
}

impl Visibility {
    pub fn permits_owner(&self, owner: UserId) -> bool {
        match self {
            Self::All => true,
            Self::OwnedBy(user_id) => *user_id == owner,
            Self::Nothing => false,
        }
    }

    pub fn permits<T: Scoped>(&self, record: &T) -> bool {
        self.permits_owner(record.scope_owner())
    }
}

/// Resolved permissions of one caller over one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessScope {
    pub kind: ResourceKind,
    /// Records the caller may read, and the only records it may mutate.
    pub visibility: Visibility,
    pub may_create: bool,
    pub may_delete: bool,
}

/// Computes the scope of `caller` over `kind`.
pub fn resolve_scope(caller: &Caller, kind: ResourceKind) -> AccessScope {
    let admin = caller.is_admin();
    let owned = if admin {
        Visibility::All
    } else {
        Visibility::OwnedBy(caller.user_id)
    };

    let (visibility, may_create, may_delete) = match kind {
        ResourceKind::Report => (owned, true, true),
        ResourceKind::Inventory => (owned, true, false),
        ResourceKind::Task => (owned, admin, admin),
        ResourceKind::AuditTrail | ResourceKind::ActivityLog => {
            if admin {
                (Visibility::All, false, false)
            } else {
                (Visibility::Nothing, false, false)
            }
        }
    };

    AccessScope {
        kind,
        visibility,
        may_create,
        may_delete,
    }
}
