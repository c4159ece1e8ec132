//! Pre-jitter wait computation for admission denials and server rate-limit responses.

// self
use crate::{
	_prelude::*, config::ExecutorConfig, signal::RateLimitSignal, throttle::Acquisition,
};

/// Wait to apply when the limiter denied admission, or `None` to proceed without waiting.
///
/// Priority: the limiter's `retry_after`, then its next-allowed instant when still in the
/// future. Both are capped at [`ExecutorConfig::admission_wait_cap`].
pub fn admission_wait(
	acquisition: &Acquisition,
	now: OffsetDateTime,
	config: &ExecutorConfig,
) -> Option<Duration> {
	if acquisition.can_proceed {
		return None;
	}
	if let Some(retry_after) = acquisition.retry_after {
		return Some(retry_after.min(config.admission_wait_cap));
	}

	let until = acquisition.next_allowed_attempt()? - now;

	until.is_positive().then(|| until.min(config.admission_wait_cap))
}

/// Base wait after the `attempt`-th rate-limited response (zero-based).
///
/// Priority: `Retry-After` (uncapped here), then `max(1s, reset − now)`, then the exponential
/// fallback `min(2^attempt × backoff_base, backoff_wait_cap)`. The reset-derived wait shares
/// the fallback's `backoff_wait_cap`.
pub fn rate_limit_wait(
	signal: &RateLimitSignal,
	attempt: u32,
	now: OffsetDateTime,
	config: &ExecutorConfig,
) -> Duration {
	if let Some(retry_after) = signal.retry_after {
		return retry_after;
	}
	if let Some(reset_at) = signal.reset_at {
		return (reset_at - now).max(Duration::SECOND).min(config.backoff_wait_cap);
	}

	exponential(attempt, config)
}

/// Applies the absolute post-jitter cap.
pub fn cap_final(jittered: Duration, config: &ExecutorConfig) -> Duration {
	jittered.min(config.max_wait)
}

fn exponential(attempt: u32, config: &ExecutorConfig) -> Duration {
	// Exponent stays in `i32` range; the cap makes larger values irrelevant.
	let factor = 2_f64.powi(attempt.min(31) as i32);
	let secs = (config.backoff_base.as_seconds_f64() * factor)
		.min(config.backoff_wait_cap.as_seconds_f64());

	Duration::checked_seconds_f64(secs.max(0.0)).unwrap_or(config.backoff_wait_cap)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	const NOW: OffsetDateTime = datetime!(2025-08-22 12:00 UTC);

	fn signal() -> RateLimitSignal {
		RateLimitSignal { remaining: 0, reset_at: None, retry_after: None }
	}

	#[test]
	fn admitted_calls_never_wait() {
		let config = ExecutorConfig::default();
		let admitted = Acquisition::allow().with_retry_after(Duration::seconds(9));

		assert_eq!(admission_wait(&admitted, NOW, &config), None);
	}

	#[test]
	fn admission_prefers_retry_after_and_caps_it() {
		let config = ExecutorConfig::default();
		let denied = Acquisition::deny()
			.with_retry_after(Duration::seconds(90))
			.with_next_allowed_attempt(NOW + Duration::seconds(5));

		assert_eq!(admission_wait(&denied, NOW, &config), Some(Duration::seconds(60)));
	}

	#[test]
	fn admission_falls_back_to_next_allowed_attempt() {
		let config = ExecutorConfig::default();
		let future = Acquisition::deny().with_next_allowed_attempt(NOW + Duration::seconds(7));
		let past = Acquisition::deny().with_next_allowed_attempt(NOW - Duration::seconds(7));

		assert_eq!(admission_wait(&future, NOW, &config), Some(Duration::seconds(7)));
		assert_eq!(admission_wait(&past, NOW, &config), None);
		assert_eq!(admission_wait(&Acquisition::deny(), NOW, &config), None);
	}

	#[test]
	fn non_positive_admission_hints_do_not_sleep() {
		let config = ExecutorConfig::default();
		let zero = Acquisition::deny().with_retry_after(Duration::ZERO);
		let negative = Acquisition::deny().with_retry_after(Duration::seconds(-4));

		assert_eq!(admission_wait(&zero, NOW, &config), Some(Duration::ZERO));
		assert_eq!(admission_wait(&negative, NOW, &config), Some(Duration::seconds(-4)));
	}

	#[test]
	fn rate_limit_wait_follows_header_priority() {
		let config = ExecutorConfig::default();
		let both = RateLimitSignal {
			retry_after: Some(Duration::seconds(2)),
			reset_at: Some(NOW + Duration::seconds(40)),
			..signal()
		};
		let reset_only = RateLimitSignal { reset_at: Some(NOW + Duration::seconds(5)), ..signal() };
		let stale_reset = RateLimitSignal { reset_at: Some(NOW - Duration::seconds(5)), ..signal() };

		assert_eq!(rate_limit_wait(&both, 0, NOW, &config), Duration::seconds(2));
		assert_eq!(rate_limit_wait(&reset_only, 0, NOW, &config), Duration::seconds(5));
		assert_eq!(rate_limit_wait(&stale_reset, 0, NOW, &config), Duration::SECOND);
	}

	#[test]
	fn reset_wait_is_capped_but_retry_after_is_not() {
		let config = ExecutorConfig::default();
		let far_reset = RateLimitSignal { reset_at: Some(NOW + Duration::minutes(30)), ..signal() };
		let long_retry = RateLimitSignal { retry_after: Some(Duration::seconds(120)), ..signal() };

		assert_eq!(rate_limit_wait(&far_reset, 0, NOW, &config), Duration::seconds(60));
		assert_eq!(rate_limit_wait(&long_retry, 0, NOW, &config), Duration::seconds(120));
	}

	#[test]
	fn exponential_fallback_doubles_then_caps() {
		let config = ExecutorConfig::default();
		let waits = (0..7).map(|attempt| rate_limit_wait(&signal(), attempt, NOW, &config));

		assert_eq!(
			waits.collect::<Vec<_>>(),
			[2, 4, 8, 16, 32, 60, 60].map(Duration::seconds).to_vec()
		);
		assert_eq!(rate_limit_wait(&signal(), u32::MAX, NOW, &config), Duration::seconds(60));
	}

	#[test]
	fn final_cap_bounds_long_server_hints() {
		let config = ExecutorConfig::default();

		assert_eq!(cap_final(Duration::hours(1), &config), Duration::seconds(300));
		assert_eq!(cap_final(Duration::seconds(12), &config), Duration::seconds(12));
	}
}
