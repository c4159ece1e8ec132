// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

/// Thread-safe counters shared by every call an executor runs.
#[derive(Debug, Default)]
pub struct ExecutorMetrics {
	calls: AtomicU64,
	network_calls: AtomicU64,
	retries: AtomicU64,
	successes: AtomicU64,
	failures: AtomicU64,
	waited_ms: AtomicU64,
}
impl ExecutorMetrics {
	/// Logical calls started.
	pub fn calls(&self) -> u64 {
		self.calls.load(Ordering::Relaxed)
	}

	/// Transport sends performed, retries included.
	pub fn network_calls(&self) -> u64 {
		self.network_calls.load(Ordering::Relaxed)
	}

	/// Counted retries after rate-limit responses.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Successes reported to the limiter.
	pub fn successes(&self) -> u64 {
		self.successes.load(Ordering::Relaxed)
	}

	/// Failures reported to the limiter.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Cumulative admission, pacing, and backoff waits.
	pub fn waited(&self) -> Duration {
		let millis = self.waited_ms.load(Ordering::Relaxed);

		Duration::milliseconds(i64::try_from(millis).unwrap_or(i64::MAX))
	}

	pub(crate) fn record_call(&self) {
		self.calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_network_call(&self) {
		self.network_calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_wait(&self, wait: Duration) {
		let millis = u64::try_from(wait.whole_milliseconds()).unwrap_or(0);

		self.waited_ms.fetch_add(millis, Ordering::Relaxed);
	}
}
