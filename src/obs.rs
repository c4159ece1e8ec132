//! Optional observability helpers for rate-limited calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every call inside a `github_throttle.request` span (fields:
//!   `method`, `path`, and the credential `fingerprint`) and to emit `debug!` events for each
//!   wait and retry plus `warn!` events for exhausted retries and transport failures.
//! - Enable `metrics` to increment the `github_throttle_request_total` counter labeled by
//!   `outcome`, and to record waits in the `github_throttle_wait_seconds` histogram labeled by
//!   `kind`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Suspension points inside a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaitKind {
	/// Limiter denied admission; not counted against the retry budget.
	Admission,
	/// Pacer scheduled the call for a later slot.
	Pacing,
	/// Server signaled a rate limit; counted retry.
	Backoff,
}
impl WaitKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			WaitKind::Admission => "admission",
			WaitKind::Pacing => "pacing",
			WaitKind::Backoff => "backoff",
		}
	}
}
impl Display for WaitKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to the executor.
	Attempt,
	/// 2xx response returned.
	Success,
	/// Non-rate-limit response passed through to the caller.
	Passthrough,
	/// Retry budget exhausted.
	Exhausted,
	/// No response obtained.
	TransportFailure,
	/// Caller cancelled the call.
	Cancelled,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::Passthrough => "passthrough",
			RequestOutcome::Exhausted => "exhausted",
			RequestOutcome::TransportFailure => "transport_failure",
			RequestOutcome::Cancelled => "cancelled",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
