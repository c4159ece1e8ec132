//! Time sources used for every wait the executor performs.
//!
//! [`TokioClock`] sleeps on the tokio timer, so any number of concurrent calls can wait
//! independently without blocking a worker thread. [`ManualClock`] is a virtual clock for
//! deterministic tests: sleeps resolve immediately, advance [`Clock::now`], and are recorded.

// self
use crate::_prelude::*;

/// Boxed future returned by [`Clock::sleep`].
pub type ClockFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Wall-clock reads and cooperative sleeps.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Current wall-clock time, used to interpret reset timestamps.
	fn now(&self) -> OffsetDateTime;

	/// Suspends for `duration`; non-positive durations resolve immediately.
	fn sleep(&self, duration: Duration) -> ClockFuture<'_>;
}

/// Real clock backed by [`tokio::time::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;
impl Clock for TokioClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}

	fn sleep(&self, duration: Duration) -> ClockFuture<'_> {
		let duration = std::time::Duration::try_from(duration).unwrap_or_default();

		Box::pin(async move {
			if !duration.is_zero() {
				tokio::time::sleep(duration).await;
			}
		})
	}
}

#[derive(Debug)]
struct ManualState {
	now: OffsetDateTime,
	sleeps: Vec<Duration>,
}

/// Virtual clock whose sleeps complete instantly and advance the current time.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<ManualState>>);
impl ManualClock {
	/// Starts the clock at `now`.
	pub fn new(now: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(ManualState { now, sleeps: Vec::new() })))
	}

	/// Moves the clock forward without recording a sleep.
	pub fn advance(&self, by: Duration) {
		self.0.lock().now += by;
	}

	/// Every sleep requested so far, in order. Zero-length sleeps are included.
	pub fn sleeps(&self) -> Vec<Duration> {
		self.0.lock().sleeps.clone()
	}

	/// Sum of all recorded sleeps.
	pub fn total_slept(&self) -> Duration {
		self.0.lock().sleeps.iter().fold(Duration::ZERO, |acc, value| acc + *value)
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		self.0.lock().now
	}

	fn sleep(&self, duration: Duration) -> ClockFuture<'_> {
		let state = self.0.clone();

		Box::pin(async move {
			let mut guard = state.lock();

			guard.sleeps.push(duration);

			if duration.is_positive() {
				guard.now += duration;
			}
		})
	}
}
