//! Domain model for lab-operations records.
//!
//! # Responsibility
//! - Define canonical records for users, reports, tasks, inventory and the
//!   append-only audit/activity history.
//! - Validate field-level constraints before persistence.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - Ownership references (owner, assignee, creator, adder, deleter) are
//!   user ids.
//! - Audit and activity records are append-only.

pub mod audit;
pub mod inventory;
pub mod report;
pub mod task;
pub mod user;
mod validation;

pub use validation::{validate_calendar_date, ModelValidationError};

/// A record that is scoped to one user for non-admin callers.
pub trait Scoped {
    /// User the record belongs to for scope checks.
    fn scope_owner(&self) -> user::UserId;
}
