//! Admission and pacing contracts consulted before every outbound call.
//!
//! The executor does not own a limiting algorithm. It asks a [`RateLimiter`] whether a call
//! keyed by [`CredentialKey`] may proceed, asks a [`RequestPacer`] for the slot the call should
//! start in, and reports outcomes back through [`RateLimiter::record_success`] and
//! [`RateLimiter::record_failure`]. Implementations share state across concurrent calls and
//! must serialize updates per key (calls with different keys must not contend), without
//! holding locks across the futures they return.

// self
use crate::{
	_prelude::*,
	clock::{Clock, ClockFuture},
	credential::CredentialKey,
};

/// Boxed future returned by [`RateLimiter`] and [`RequestPacer`] methods.
pub type ThrottleFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Sliding-window admission control keyed by credential.
pub trait RateLimiter
where
	Self: Send + Sync,
{
	/// Decides whether the next call for `key` may proceed now.
	///
	/// A denial must carry a positive `retry_after` or a future next-allowed instant, or no hint
	/// at all. A non-positive `retry_after` on a denial makes the executor re-acquire without
	/// sleeping.
	fn acquire<'a>(&'a self, key: &'a CredentialKey) -> ThrottleFuture<'a, Acquisition>;

	/// Records a completed 2xx call. Must never itself cause throttling.
	fn record_success<'a>(&'a self, key: &'a CredentialKey) -> ThrottleFuture<'a, ()>;

	/// Records a rate-limited or failed call so the limiter can back off.
	fn record_failure<'a>(&'a self, key: &'a CredentialKey) -> ThrottleFuture<'a, ()>;
}

/// Steady-rate scheduler keyed by credential.
pub trait RequestPacer
where
	Self: Send + Sync,
{
	/// Reserves the next start slot for `key`.
	fn reserve<'a>(&'a self, key: &'a CredentialKey) -> ThrottleFuture<'a, PacingSlot>;
}

/// Admission decision for a single acquisition attempt. Never stored beyond that attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Acquisition {
	/// Whether the call may proceed immediately.
	pub can_proceed: bool,
	/// Relative wait suggested by the limiter.
	pub retry_after: Option<Duration>,
	/// Window-level detail, when the limiter exposes it.
	pub rate_limit: Option<RateLimitDetail>,
}
impl Acquisition {
	/// Admits the call.
	pub fn allow() -> Self {
		Self { can_proceed: true, retry_after: None, rate_limit: None }
	}

	/// Denies the call without any timing hint.
	pub fn deny() -> Self {
		Self { can_proceed: false, retry_after: None, rate_limit: None }
	}

	/// Adds a relative retry hint.
	pub fn with_retry_after(mut self, wait: Duration) -> Self {
		self.retry_after = Some(wait);

		self
	}

	/// Adds the instant the limiter will next admit the key.
	pub fn with_next_allowed_attempt(mut self, instant: OffsetDateTime) -> Self {
		self.rate_limit = Some(RateLimitDetail { next_allowed_attempt: Some(instant) });

		self
	}

	/// Flattens the nested detail into the next admission instant.
	pub fn next_allowed_attempt(&self) -> Option<OffsetDateTime> {
		self.rate_limit.as_ref().and_then(|detail| detail.next_allowed_attempt)
	}
}

/// Window-level detail attached to an [`Acquisition`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitDetail {
	/// Instant the limiter will next admit the key.
	pub next_allowed_attempt: Option<OffsetDateTime>,
}

/// Start slot assigned by a [`RequestPacer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacingSlot {
	/// Instant the call may start.
	pub ready_at: OffsetDateTime,
}
impl PacingSlot {
	/// Creates a slot starting at `ready_at`.
	pub fn at(ready_at: OffsetDateTime) -> Self {
		Self { ready_at }
	}

	/// Time left until the slot opens, never negative.
	pub fn delay_from(&self, now: OffsetDateTime) -> Duration {
		(self.ready_at - now).max(Duration::ZERO)
	}

	/// Suspends on `clock` until the slot opens.
	pub fn wait_until_ready<'a>(&self, clock: &'a dyn Clock) -> ClockFuture<'a> {
		clock.sleep(self.delay_from(clock.now()))
	}
}

/// Limiter and pacer that admit every call immediately.
///
/// Useful when the caller already enforces budgets upstream, or for tests that only exercise
/// response-driven retries.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unthrottled;
impl RateLimiter for Unthrottled {
	fn acquire<'a>(&'a self, _key: &'a CredentialKey) -> ThrottleFuture<'a, Acquisition> {
		Box::pin(async { Acquisition::allow() })
	}

	fn record_success<'a>(&'a self, _key: &'a CredentialKey) -> ThrottleFuture<'a, ()> {
		Box::pin(async {})
	}

	fn record_failure<'a>(&'a self, _key: &'a CredentialKey) -> ThrottleFuture<'a, ()> {
		Box::pin(async {})
	}
}
impl RequestPacer for Unthrottled {
	fn reserve<'a>(&'a self, _key: &'a CredentialKey) -> ThrottleFuture<'a, PacingSlot> {
		Box::pin(async { PacingSlot::at(OffsetDateTime::UNIX_EPOCH) })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;
	use crate::clock::ManualClock;

	#[test]
	fn acquisition_builders_fill_detail() {
		let instant = datetime!(2025-08-22 12:00 UTC);
		let acquisition =
			Acquisition::deny().with_retry_after(Duration::seconds(3)).with_next_allowed_attempt(instant);

		assert!(!acquisition.can_proceed);
		assert_eq!(acquisition.retry_after, Some(Duration::seconds(3)));
		assert_eq!(acquisition.next_allowed_attempt(), Some(instant));
		assert_eq!(Acquisition::allow().next_allowed_attempt(), None);
	}

	#[tokio::test]
	async fn pacing_slot_waits_only_for_future_slots() {
		let clock = ManualClock::new(datetime!(2025-08-22 12:00 UTC));

		PacingSlot::at(datetime!(2025-08-22 12:00:00.4 UTC)).wait_until_ready(&clock).await;
		PacingSlot::at(datetime!(2025-08-22 11:59 UTC)).wait_until_ready(&clock).await;

		assert_eq!(clock.sleeps(), vec![Duration::milliseconds(400), Duration::ZERO]);
	}

	#[tokio::test]
	async fn unthrottled_admits_everything() {
		let key = CredentialKey::anonymous();

		assert_eq!(Unthrottled.acquire(&key).await, Acquisition::allow());

		Unthrottled.record_success(&key).await;
		Unthrottled.record_failure(&key).await;

		let slot = Unthrottled.reserve(&key).await;

		assert_eq!(slot.delay_from(OffsetDateTime::now_utc()), Duration::ZERO);
	}
}
