//! Mutable-window policy for report edit/delete.
//!
//! A report is mutable while `now - created_at < window`: mutable at the
//! creation instant, immutable from exactly `created_at + window` on.

use crate::config::{CoreConfig, DEFAULT_MUTABLE_WINDOW_MS};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raised when a mutation arrives after the window closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowExpired {
    pub created_at: i64,
    pub closed_at: i64,
}

impl Display for WindowExpired {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mutable window closed at {} (created at {})",
            self.closed_at, self.created_at
        )
    }
}

impl Error for WindowExpired {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutableWindow {
    window_ms: i64,
}

impl Default for MutableWindow {
    fn default() -> Self {
        Self::new(DEFAULT_MUTABLE_WINDOW_MS)
    }
}

impl From<&CoreConfig> for MutableWindow {
    fn from(config: &CoreConfig) -> Self {
        Self::new(config.mutable_window_ms)
    }
}

impl MutableWindow {
    pub fn new(window_ms: i64) -> Self {
        Self { window_ms }
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    pub fn is_mutable(&self, created_at: i64, now: i64) -> bool {
        now.saturating_sub(created_at) < self.window_ms
    }

    pub fn check(&self, created_at: i64, now: i64) -> Result<(), WindowExpired> {
        if self.is_mutable(created_at, now) {
            return Ok(());
        }
        Err(WindowExpired {
            created_at,
            closed_at: created_at.saturating_add(self.window_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::MutableWindow;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    #[test]
    fn mutable_at_creation_instant() {
        let window = MutableWindow::default();
        assert!(window.is_mutable(1_000, 1_000));
    }

    #[test]
    fn closes_exactly_at_seven_days() {
        let window = MutableWindow::default();
        let created = 5_000;
        assert!(window.is_mutable(created, created + 7 * DAY_MS - 1));
        assert!(!window.is_mutable(created, created + 7 * DAY_MS));
        let err = window
            .check(created, created + 8 * DAY_MS)
            .expect_err("eight days must be expired");
        assert_eq!(err.closed_at, created + 7 * DAY_MS);
    }

    #[test]
    fn configurable_length() {
        let window = MutableWindow::new(DAY_MS);
        assert!(window.is_mutable(0, DAY_MS - 1));
        assert!(!window.is_mutable(0, DAY_MS));
    }
}
