//! Best-effort activity recorder.
//!
//! # Invariants
//! - `record` never returns an error and never panics on store failure.
//! - A failed append is reported to the operational log only.

use crate::clock::Clock;
use crate::model::audit::{ActivityAction, ActivityLogEntry};
use crate::model::user::UserId;
use crate::repo::activity_repo::ActivityLogRepository;
use log::{debug, warn};
use uuid::Uuid;

pub struct ActivityRecorder<'a, R: ActivityLogRepository> {
    repo: R,
    clock: &'a dyn Clock,
}

impl<'a, R: ActivityLogRepository> ActivityRecorder<'a, R> {
    pub fn new(repo: R, clock: &'a dyn Clock) -> Self {
        Self { repo, clock }
    }

    /// Appends one activity entry; failures are logged and swallowed.
    pub fn record(&self, actor: UserId, action: ActivityAction, origin_address: Option<&str>) {
        let entry = ActivityLogEntry {
            id: Uuid::new_v4(),
            actor,
            action: action.label().to_string(),
            origin_address: origin_address.map(str::to_string),
            created_at: self.clock.now_ms(),
        };

        match self.repo.append(&entry) {
            Ok(_) => debug!(
                "event=activity_record module=activity status=ok action={} actor={}",
                entry.action, actor
            ),
            Err(err) => warn!(
                "event=activity_record module=activity status=error action={} actor={} error={}",
                entry.action, actor, err
            ),
        }
    }
}
