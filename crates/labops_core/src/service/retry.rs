//! Bounded retry for transient store failures.

use crate::config::CoreConfig;
use crate::repo::RepoResult;
use log::warn;
use std::time::Duration;

const MAX_BACKOFF_SHIFT: u32 = 10;

/// Runs `call`, retrying busy/locked failures with exponential backoff.
///
/// Non-transient errors and the last transient error are returned as-is.
pub(crate) fn with_store_retry<T>(
    config: &CoreConfig,
    operation: &'static str,
    mut call: impl FnMut() -> RepoResult<T>,
) -> RepoResult<T> {
    let mut attempt: u32 = 1;
    loop {
        match call() {
            Err(err) if err.is_transient() && attempt < config.store_retry_attempts => {
                let shift = (attempt - 1).min(MAX_BACKOFF_SHIFT);
                let delay_ms = config.store_retry_backoff_ms.saturating_mul(1_u64 << shift);
                warn!(
                    "event=store_retry module=service status=retry operation={} attempt={} delay_ms={} error={}",
                    operation, attempt, delay_ms, err
                );
                std::thread::sleep(Duration::from_millis(delay_ms));
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::with_store_retry;
    use crate::config::CoreConfig;
    use crate::db::DbError;
    use crate::repo::RepoError;
    use rusqlite::ffi;
    use std::cell::Cell;
    use uuid::Uuid;

    fn busy() -> RepoError {
        RepoError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_BUSY),
            None,
        )))
    }

    fn fast_config(attempts: u32) -> CoreConfig {
        CoreConfig {
            store_retry_attempts: attempts,
            store_retry_backoff_ms: 0,
            ..CoreConfig::default()
        }
    }

    #[test]
    fn retries_transient_failures_until_success() {
        let calls = Cell::new(0);
        let result = with_store_retry(&fast_config(3), "test", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(busy())
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.expect("third attempt should succeed"), 7);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn gives_up_after_configured_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_store_retry(&fast_config(2), "test", || {
            calls.set(calls.get() + 1);
            Err(busy())
        });
        assert!(result.expect_err("must fail").is_transient());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn does_not_retry_permanent_failures() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_store_retry(&fast_config(5), "test", || {
            calls.set(calls.get() + 1);
            Err(RepoError::NotFound(Uuid::nil()))
        });
        assert!(matches!(result, Err(RepoError::NotFound(_))));
        assert_eq!(calls.get(), 1);
    }
}
