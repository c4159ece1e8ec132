//! Rate-limited request execution loop.
//!
//! [`RateLimitedExecutor::execute`] drives one logical call through
//! `acquire → pace → send → classify`, repeating the cycle only when the limiter denies
//! admission (an uncounted scheduling delay) or when the server answers with a rate-limit
//! response (a counted retry bounded by [`ExecutorConfig::max_retries`]). The credential key is
//! derived once per call and reused for every retry. Limiter bookkeeping happens only at
//! outcome points: a 2xx records a success, a rate-limit response or transport failure
//! records a failure, and a cancelled call records nothing further.

pub mod backoff;

mod metrics;

pub use metrics::ExecutorMetrics;

// crates.io
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	clock::{Clock, TokioClock},
	config::ExecutorConfig,
	credential::CredentialKey,
	error::{ConfigError, DecodeError},
	http::{HttpTransport, RawResponse},
	jitter::{FullJitter, JitterSource},
	obs::{self, RequestOutcome, RequestSpan, WaitKind},
	request::PreparedRequest,
	signal::ResponseOutcome,
	throttle::{RateLimiter, RequestPacer},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Executor specialized for the crate's default reqwest transport.
pub type ReqwestExecutor = RateLimitedExecutor<ReqwestTransport>;

/// Counted-retry bookkeeping for one logical call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryState {
	attempt: u32,
	max_retries: u32,
}
impl RetryState {
	/// Starts at attempt zero.
	pub fn new(max_retries: u32) -> Self {
		Self { attempt: 0, max_retries }
	}

	/// Retries performed so far.
	pub fn attempt(&self) -> u32 {
		self.attempt
	}

	/// Returns `true` once no further retry is allowed.
	pub fn is_exhausted(&self) -> bool {
		self.attempt >= self.max_retries
	}

	/// Moves to the next retry.
	pub fn advance(&mut self) {
		self.attempt += 1;
	}
}

/// Response returned by [`RateLimitedExecutor::execute`] with per-call diagnostics.
#[derive(Clone, Debug)]
pub struct Executed {
	/// Final response; 2xx or a non-rate-limit status passed through unmodified.
	pub response: RawResponse,
	/// Classification of [`Executed::response`].
	pub outcome: ResponseOutcome,
	/// Counted retries performed before this response.
	pub attempts: u32,
	/// Total admission, pacing, and backoff wait.
	pub waited: Duration,
}
impl Executed {
	/// Decodes a 2xx body as JSON, or surfaces [`Error::Api`] for any other status.
	///
	/// Empty 2xx bodies decode as JSON `null`, so `()` and `Option<T>` targets accept 204s.
	pub fn json<D>(&self) -> Result<D>
	where
		D: DeserializeOwned,
	{
		let status = self.response.status.as_u16();

		if !self.response.is_success() {
			return Err(Error::Api { status, message: api_message(&self.response.body) });
		}

		let body: &[u8] = if self.response.body.is_empty() { b"null" } else { &self.response.body };
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| DecodeError::Json { source, status }.into())
	}
}

/// Orchestrates admission, pacing, transport, and header-driven retries.
///
/// Every collaborator is injected: the transport performs I/O, the limiter and pacer own the
/// per-credential budgets, the clock owns time, and the jitter source owns randomness.
pub struct RateLimitedExecutor<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request.
	pub transport: Arc<T>,
	/// Admission control keyed by credential.
	pub limiter: Arc<dyn RateLimiter>,
	/// Steady-rate scheduler keyed by credential.
	pub pacer: Arc<dyn RequestPacer>,
	/// Time source for every wait.
	pub clock: Arc<dyn Clock>,
	/// Randomization applied to admission and backoff waits.
	pub jitter: Arc<dyn JitterSource>,
	/// Retry and wait bounds.
	pub config: ExecutorConfig,
	/// Counters shared by every call this executor runs.
	pub metrics: Arc<ExecutorMetrics>,
}
impl<T> RateLimitedExecutor<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates an executor on the tokio clock with full jitter and default bounds.
	pub fn with_transport(
		transport: impl Into<Arc<T>>,
		limiter: Arc<dyn RateLimiter>,
		pacer: Arc<dyn RequestPacer>,
	) -> Self {
		Self {
			transport: transport.into(),
			limiter,
			pacer,
			clock: Arc::new(TokioClock),
			jitter: Arc::new(FullJitter),
			config: ExecutorConfig::default(),
			metrics: Default::default(),
		}
	}

	/// Replaces the clock.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Replaces the jitter source.
	pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
		self.jitter = jitter;

		self
	}

	/// Replaces the retry and wait bounds after validating them.
	pub fn with_config(mut self, config: ExecutorConfig) -> Result<Self, ConfigError> {
		config.validate()?;

		self.config = config;

		Ok(self)
	}

	/// Executes `request`, returning the final response and call diagnostics.
	pub async fn execute(&self, request: &PreparedRequest) -> Result<Executed> {
		self.execute_cancellable(request, &CancellationToken::new()).await
	}

	/// Executes `request` and decodes a 2xx JSON body into `D`.
	pub async fn execute_json<D>(&self, request: &PreparedRequest) -> Result<D>
	where
		D: DeserializeOwned,
	{
		self.execute(request).await?.json()
	}

	/// Executes `request`, aborting any wait or in-flight send once `cancel` fires.
	///
	/// A cancelled call returns [`Error::Cancelled`] and reports nothing further to the
	/// limiter.
	pub async fn execute_cancellable(
		&self,
		request: &PreparedRequest,
		cancel: &CancellationToken,
	) -> Result<Executed> {
		let key = CredentialKey::from_headers(request.headers());
		let span = RequestSpan::new(request, &key);

		obs::record_request_outcome(RequestOutcome::Attempt);
		self.metrics.record_call();

		let result = span.instrument(self.run(request, &key, cancel)).await;
		let outcome = match &result {
			Ok(executed) if executed.outcome == ResponseOutcome::Success => RequestOutcome::Success,
			Ok(_) => RequestOutcome::Passthrough,
			Err(Error::RateLimitExceeded { .. }) => RequestOutcome::Exhausted,
			Err(Error::Cancelled) => RequestOutcome::Cancelled,
			Err(_) => RequestOutcome::TransportFailure,
		};

		obs::record_request_outcome(outcome);

		result
	}

	async fn run(
		&self,
		request: &PreparedRequest,
		key: &CredentialKey,
		cancel: &CancellationToken,
	) -> Result<Executed> {
		let mut retry = RetryState::new(self.config.max_retries);
		let mut waited = Duration::ZERO;

		loop {
			let acquisition = or_cancel(cancel, self.limiter.acquire(key)).await?;

			if let Some(base) = backoff::admission_wait(&acquisition, self.clock.now(), &self.config)
			{
				let wait = self.jitter.jitter(base);

				waited += self.suspend(WaitKind::Admission, wait, retry.attempt(), cancel).await?;

				continue;
			}

			let slot = or_cancel(cancel, self.pacer.reserve(key)).await?;
			let pacing = slot.delay_from(self.clock.now());

			obs::trace_wait(WaitKind::Pacing, retry.attempt(), pacing);
			or_cancel(cancel, slot.wait_until_ready(self.clock.as_ref())).await?;
			self.note_wait(WaitKind::Pacing, pacing);

			waited += pacing;

			self.metrics.record_network_call();

			let response = match or_cancel(cancel, self.transport.send(request)).await? {
				Ok(response) => response,
				Err(err) => {
					obs::trace_transport_failure(&err);
					self.record_failure(key).await;

					return Err(err.into());
				},
			};
			let outcome = ResponseOutcome::of(&response);
			let signal = match outcome {
				ResponseOutcome::Success => {
					self.limiter.record_success(key).await;
					self.metrics.record_success();

					return Ok(Executed { response, outcome, attempts: retry.attempt(), waited });
				},
				ResponseOutcome::TransientFailure | ResponseOutcome::FatalFailure =>
					return Ok(Executed { response, outcome, attempts: retry.attempt(), waited }),
				ResponseOutcome::RateLimited(signal) => signal,
			};

			obs::trace_rate_limited(response.status.as_u16(), retry.attempt(), signal.remaining);
			self.record_failure(key).await;

			if retry.is_exhausted() {
				obs::trace_exhausted(retry.attempt());

				return Err(Error::RateLimitExceeded { attempts: retry.attempt() });
			}

			let base =
				backoff::rate_limit_wait(&signal, retry.attempt(), self.clock.now(), &self.config);
			let wait = backoff::cap_final(self.jitter.jitter(base), &self.config);

			waited += self.suspend(WaitKind::Backoff, wait, retry.attempt(), cancel).await?;

			retry.advance();
			self.metrics.record_retry();
		}
	}

	async fn suspend(
		&self,
		kind: WaitKind,
		wait: Duration,
		attempt: u32,
		cancel: &CancellationToken,
	) -> Result<Duration> {
		obs::trace_wait(kind, attempt, wait);
		or_cancel(cancel, self.clock.sleep(wait)).await?;
		self.note_wait(kind, wait);

		Ok(wait)
	}

	fn note_wait(&self, kind: WaitKind, wait: Duration) {
		obs::record_wait(kind, wait);
		self.metrics.record_wait(wait);
	}

	async fn record_failure(&self, key: &CredentialKey) {
		self.limiter.record_failure(key).await;
		self.metrics.record_failure();
	}
}
#[cfg(feature = "reqwest")]
impl RateLimitedExecutor<ReqwestTransport> {
	/// Creates an executor backed by a default reqwest client.
	pub fn new(limiter: Arc<dyn RateLimiter>, pacer: Arc<dyn RequestPacer>) -> Self {
		Self::with_transport(ReqwestTransport::default(), limiter, pacer)
	}
}
impl<T> Clone for RateLimitedExecutor<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			limiter: self.limiter.clone(),
			pacer: self.pacer.clone(),
			clock: self.clock.clone(),
			jitter: self.jitter.clone(),
			config: self.config.clone(),
			metrics: self.metrics.clone(),
		}
	}
}
impl<T> Debug for RateLimitedExecutor<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimitedExecutor")
			.field("config", &self.config)
			.field("metrics", &self.metrics)
			.finish()
	}
}

async fn or_cancel<F>(cancel: &CancellationToken, fut: F) -> Result<F::Output>
where
	F: Future,
{
	tokio::select! {
		biased;
		_ = cancel.cancelled() => Err(Error::Cancelled),
		output = fut => Ok(output),
	}
}

fn api_message(body: &[u8]) -> Option<String> {
	#[derive(Deserialize)]
	struct ApiMessage {
		message: String,
	}

	serde_json::from_slice::<ApiMessage>(body).ok().map(|payload| payload.message)
}
