//! Executor settings and the throttle budgets handed to limiter implementations.

// self
use crate::{_prelude::*, error::ConfigError};

/// Retry and wait bounds applied by the executor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
	/// Counted retries allowed after server rate-limit responses.
	pub max_retries: u32,
	/// Cap applied to admission waits before jitter.
	pub admission_wait_cap: Duration,
	/// Ceiling of the exponential fallback used when a response carries no timing header.
	pub backoff_wait_cap: Duration,
	/// Multiplier of the exponential fallback: `2^attempt × backoff_base`.
	pub backoff_base: Duration,
	/// Absolute cap applied to every post-jitter backoff wait.
	pub max_wait: Duration,
}
impl ExecutorConfig {
	/// Overrides the retry budget.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;

		self
	}

	/// Overrides the admission wait cap.
	pub fn with_admission_wait_cap(mut self, cap: Duration) -> Self {
		self.admission_wait_cap = cap;

		self
	}

	/// Overrides the exponential fallback (base and ceiling).
	pub fn with_backoff(mut self, base: Duration, cap: Duration) -> Self {
		self.backoff_base = base;
		self.backoff_wait_cap = cap;

		self
	}

	/// Overrides the absolute backoff cap.
	pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
		self.max_wait = max_wait;

		self
	}

	/// Rejects negative durations.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let durations = [
			("admission_wait_cap", self.admission_wait_cap),
			("backoff_wait_cap", self.backoff_wait_cap),
			("backoff_base", self.backoff_base),
			("max_wait", self.max_wait),
		];

		for (setting, value) in durations {
			if value.is_negative() {
				return Err(ConfigError::InvalidSetting { setting, reason: "must not be negative" });
			}
		}

		Ok(())
	}
}
impl Default for ExecutorConfig {
	fn default() -> Self {
		Self {
			max_retries: 5,
			admission_wait_cap: Duration::seconds(60),
			backoff_wait_cap: Duration::seconds(60),
			backoff_base: Duration::seconds(2),
			max_wait: Duration::seconds(300),
		}
	}
}

/// One sliding window enforced by a limiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateWindow {
	/// Window length.
	pub period: Duration,
	/// Admissions allowed per window.
	pub max_attempts: u32,
}
impl RateWindow {
	/// `max_attempts` per second.
	pub const fn per_second(max_attempts: u32) -> Self {
		Self { period: Duration::SECOND, max_attempts }
	}

	/// `max_attempts` per minute.
	pub const fn per_minute(max_attempts: u32) -> Self {
		Self { period: Duration::MINUTE, max_attempts }
	}

	/// `max_attempts` per hour.
	pub const fn per_hour(max_attempts: u32) -> Self {
		Self { period: Duration::HOUR, max_attempts }
	}
}

/// Budgets for [`RateLimiter`](crate::throttle::RateLimiter) and
/// [`RequestPacer`](crate::throttle::RequestPacer) implementations.
///
/// The executor never reads these values; they travel with it so deployments configure
/// both layers from one place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThrottleConfig {
	/// Concurrent windows; a call is admitted only when every window has room.
	pub windows: Vec<RateWindow>,
	/// Growth factor applied by the limiter after recorded failures.
	pub backoff_multiplier: f64,
	/// Steady-state pacer rate in requests per second.
	pub target_rate: f64,
}
impl ThrottleConfig {
	/// Production budgets that stay under GitHub's 5000 requests/hour ceiling.
	pub fn github() -> Self {
		Self {
			windows: vec![
				RateWindow::per_second(100),
				RateWindow::per_minute(200),
				RateWindow::per_hour(5_000),
			],
			backoff_multiplier: 2.0,
			target_rate: 25.0,
		}
	}

	/// Low budgets for suites that hit a live API.
	pub fn testing() -> Self {
		Self {
			windows: vec![
				RateWindow::per_second(5),
				RateWindow::per_minute(50),
				RateWindow::per_hour(1_000),
			],
			backoff_multiplier: 2.0,
			target_rate: 5.0,
		}
	}

	/// Minimum spacing between paced starts.
	///
	/// Rates too small for the interval to fit in a [`Duration`] saturate at [`Duration::MAX`].
	pub fn pacing_interval(&self) -> Duration {
		Duration::checked_seconds_f64(1.0 / self.target_rate).unwrap_or(Duration::MAX)
	}

	/// Rejects empty or non-positive budgets.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.windows.is_empty() {
			return Err(ConfigError::InvalidSetting {
				setting: "windows",
				reason: "at least one window is required",
			});
		}
		if self.windows.iter().any(|w| !w.period.is_positive() || w.max_attempts == 0) {
			return Err(ConfigError::InvalidSetting {
				setting: "windows",
				reason: "periods and attempt caps must be positive",
			});
		}
		if !(self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0) {
			return Err(ConfigError::InvalidSetting {
				setting: "backoff_multiplier",
				reason: "must be a finite value of at least 1.0",
			});
		}
		if !(self.target_rate.is_finite() && self.target_rate > 0.0) {
			return Err(ConfigError::InvalidSetting {
				setting: "target_rate",
				reason: "must be a finite positive rate",
			});
		}
		if Duration::checked_seconds_f64(1.0 / self.target_rate).is_none() {
			return Err(ConfigError::InvalidSetting {
				setting: "target_rate",
				reason: "is too small to derive a pacing interval",
			});
		}

		Ok(())
	}
}
impl Default for ThrottleConfig {
	fn default() -> Self {
		Self::github()
	}
}
