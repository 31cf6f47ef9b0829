//! Authorization scope and time-window policies.
//!
//! # Responsibility
//! - Decide which records a caller may read or mutate.
//! - Decide whether a report is still inside its mutable window.
//!
//! # Invariants
//! - Both policies are pure functions of their inputs; they never touch the
//!   store.
//! - Unknown roles have already been mapped to `Role::Member` before a
//!   `Caller` reaches this module.

pub mod scope;
pub mod window;

pub use scope::{resolve_scope, AccessScope, ResourceKind, Visibility};
pub use window::{MutableWindow, WindowExpired};
