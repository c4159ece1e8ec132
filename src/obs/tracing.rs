// self
use crate::{_prelude::*, credential::CredentialKey, obs::WaitKind, request::PreparedRequest};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRequest<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRequest<F> = F;

/// Span wrapping one logical call, retries included.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a span for `request`; the credential is recorded only as a fingerprint.
	pub fn new(request: &PreparedRequest, key: &CredentialKey) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"github_throttle.request",
				method = %request.method(),
				path = request.url().path(),
				credential = %key.fingerprint(),
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (request, key);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRequest<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `debug!` event before the executor suspends.
pub fn trace_wait(kind: WaitKind, attempt: u32, wait: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			kind = kind.as_str(),
			attempt,
			wait_ms = wait.whole_milliseconds() as i64,
			"waiting before next step"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, attempt, wait);
	}
}

/// Emits a `debug!` event when a response is classified as rate limited.
pub fn trace_rate_limited(status: u16, attempt: u32, remaining: u64) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(status, attempt, remaining, "server signaled a rate limit");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (status, attempt, remaining);
	}
}

/// Emits a `warn!` event when the retry budget is spent.
pub fn trace_exhausted(attempts: u32) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(attempts, "rate limit retries exhausted");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = attempts;
	}
}

/// Emits a `warn!` event when the transport produced no response.
pub fn trace_transport_failure(error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %error, "transport failed without a response");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}
