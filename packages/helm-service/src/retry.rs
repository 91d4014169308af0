use std::time::Duration;

pub(crate) const MAX_ATTEMPTS: u32 = 3;

const BASE_BACKOFF_MS: u64 = 50;

/// Only connectivity-shaped failures qualify for a retry. Constraint violations, bad
/// arguments, and decode errors never do, and non-idempotent writes must not call this at all.
pub(crate) fn is_transient(err: &helm_storage::Error) -> bool {
	match err {
		helm_storage::Error::Sqlx(inner) => matches!(
			inner,
			sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
		),
		_ => false,
	}
}

pub(crate) fn backoff(attempt: u32) -> Duration {
	Duration::from_millis(BASE_BACKOFF_MS << attempt.min(4))
}
