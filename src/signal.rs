//! Rate-limit signals carried by API responses.
//!
//! GitHub reports throttling through `403`/`429` statuses combined with the
//! `X-RateLimit-Remaining`, `X-RateLimit-Reset`, and `Retry-After` headers. Parse failures
//! never error: an unreadable header counts as absent, except `X-RateLimit-Remaining`, which
//! falls back to `0` so malformed responses lean toward throttling.

// crates.io
use http::{HeaderMap, StatusCode, header::RETRY_AFTER};
// self
use crate::{_prelude::*, http::RawResponse};

/// Remaining requests in the current server-side window.
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
/// Unix timestamp (seconds, possibly fractional) when the server window resets.
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Rate-limit hints extracted from one response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitSignal {
	/// `X-RateLimit-Remaining`, defaulting to `0`.
	pub remaining: u64,
	/// `X-RateLimit-Reset` as an absolute instant.
	pub reset_at: Option<OffsetDateTime>,
	/// `Retry-After` as a relative wait.
	pub retry_after: Option<Duration>,
}
impl RateLimitSignal {
	/// Reads all rate-limit headers at once.
	pub fn from_headers(headers: &HeaderMap) -> Self {
		Self {
			remaining: parse_remaining(headers),
			reset_at: parse_reset(headers),
			retry_after: parse_retry_after(headers),
		}
	}
}

/// Classification of a completed HTTP exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseOutcome {
	/// 2xx; recorded as a limiter success.
	Success,
	/// 429, or 403 with no remaining budget; retried with backoff.
	RateLimited(RateLimitSignal),
	/// 5xx or 408; returned to the caller, left to higher-level retry policies.
	TransientFailure,
	/// Any other status (including a 403 that still has budget); returned as-is.
	FatalFailure,
}
impl ResponseOutcome {
	/// Classifies a status + header pair.
	pub fn classify(status: StatusCode, headers: &HeaderMap) -> Self {
		if status.is_success() {
			return Self::Success;
		}
		if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
			let signal = RateLimitSignal::from_headers(headers);

			if signal.remaining == 0 || status == StatusCode::TOO_MANY_REQUESTS {
				return Self::RateLimited(signal);
			}

			return Self::FatalFailure;
		}
		if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
			return Self::TransientFailure;
		}

		Self::FatalFailure
	}

	/// Classifies a [`RawResponse`].
	pub fn of(response: &RawResponse) -> Self {
		Self::classify(response.status, &response.headers)
	}

	/// Stable label suitable for span or metric fields.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::RateLimited(_) => "rate_limited",
			Self::TransientFailure => "transient_failure",
			Self::FatalFailure => "fatal_failure",
		}
	}
}

/// `X-RateLimit-Remaining` as an unsigned integer; missing or unparsable values yield `0`.
pub fn parse_remaining(headers: &HeaderMap) -> u64 {
	header_str(headers, RATE_LIMIT_REMAINING).and_then(|raw| raw.parse().ok()).unwrap_or(0)
}

/// `X-RateLimit-Reset` interpreted as floating-point Unix seconds.
pub fn parse_reset(headers: &HeaderMap) -> Option<OffsetDateTime> {
	let secs = header_str(headers, RATE_LIMIT_RESET)?.parse::<f64>().ok()?;

	if !secs.is_finite() {
		return None;
	}

	let nanos = (secs * 1_000_000_000.0) as i128;

	OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}

/// `Retry-After` interpreted as a non-negative floating-point seconds count.
///
/// Values that do not fit in a [`Duration`] are treated as absent.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let secs = header_str(headers, RETRY_AFTER.as_str())?.parse::<f64>().ok()?;

	if !secs.is_finite() || secs < 0.0 {
		return None;
	}

	Duration::checked_seconds_f64(secs)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	Some(headers.get(name)?.to_str().ok()?.trim())
}
