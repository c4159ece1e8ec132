// self
use crate::{
	_prelude::*,
	obs::{RequestOutcome, WaitKind},
};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_request_outcome(outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("github_throttle_request_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records the length of one wait via the global metrics recorder (when enabled).
pub fn record_wait(kind: WaitKind, waited: Duration) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!("github_throttle_wait_seconds", "kind" => kind.as_str())
			.record(waited.as_seconds_f64());
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, waited);
	}
}
