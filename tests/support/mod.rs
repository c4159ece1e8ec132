#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime, macros::datetime};
// self
use github_throttle::{
	clock::{Clock, ManualClock},
	config::ExecutorConfig,
	credential::CredentialKey,
	error::TransportError,
	executor::RateLimitedExecutor,
	http::{HttpTransport, RawResponse, TransportFuture},
	jitter::JitterSource,
	request::{DEFAULT_BASE_URL, PreparedRequest},
	throttle::{Acquisition, PacingSlot, RateLimiter, RequestPacer, ThrottleFuture},
	url::Url,
};

pub const NOW: OffsetDateTime = datetime!(2025-08-22 12:00 UTC);
pub const TOKEN: &str = "ghp_throttle_fixture";

/// One scripted transport reply.
pub enum Step {
	Respond(RawResponse),
	Fail,
	Hang,
}

/// Transport that replays a script, then repeats an optional fallback response.
pub struct ScriptedTransport {
	steps: Mutex<VecDeque<Step>>,
	fallback: Option<RawResponse>,
	sent: AtomicUsize,
}
impl ScriptedTransport {
	pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
		Self {
			steps: Mutex::new(steps.into_iter().collect()),
			fallback: None,
			sent: AtomicUsize::new(0),
		}
	}

	pub fn repeating(response: RawResponse) -> Self {
		Self { fallback: Some(response), ..Self::new([]) }
	}

	pub fn sent(&self) -> usize {
		self.sent.load(Ordering::SeqCst)
	}
}
impl HttpTransport for ScriptedTransport {
	fn send<'a>(&'a self, _request: &'a PreparedRequest) -> TransportFuture<'a> {
		self.sent.fetch_add(1, Ordering::SeqCst);

		let step = self.steps.lock().pop_front();
		let step = match step {
			Some(step) => step,
			None => Step::Respond(
				self.fallback.clone().expect("Transport script should not run dry."),
			),
		};

		Box::pin(async move {
			match step {
				Step::Respond(response) => Ok(response),
				Step::Fail => Err(TransportError::network(std::io::Error::new(
					std::io::ErrorKind::ConnectionReset,
					"connection reset by peer",
				))),
				Step::Hang => std::future::pending().await,
			}
		})
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
	Acquire(CredentialKey),
	Success(CredentialKey),
	Failure(CredentialKey),
}

/// Limiter that replays admission decisions and records every call it receives.
#[derive(Default)]
pub struct RecordingLimiter {
	decisions: Mutex<VecDeque<Acquisition>>,
	fallback: Option<Acquisition>,
	events: Mutex<Vec<Event>>,
}
impl RecordingLimiter {
	pub fn with_decisions(decisions: impl IntoIterator<Item = Acquisition>) -> Self {
		Self { decisions: Mutex::new(decisions.into_iter().collect()), ..Default::default() }
	}

	pub fn always(decision: Acquisition) -> Self {
		Self { fallback: Some(decision), ..Default::default() }
	}

	pub fn events(&self) -> Vec<Event> {
		self.events.lock().clone()
	}

	pub fn acquires(&self) -> usize {
		self.events().iter().filter(|event| matches!(event, Event::Acquire(_))).count()
	}

	pub fn successes(&self) -> usize {
		self.events().iter().filter(|event| matches!(event, Event::Success(_))).count()
	}

	pub fn failures(&self) -> usize {
		self.events().iter().filter(|event| matches!(event, Event::Failure(_))).count()
	}
}
impl RateLimiter for RecordingLimiter {
	fn acquire<'a>(&'a self, key: &'a CredentialKey) -> ThrottleFuture<'a, Acquisition> {
		Box::pin(async move {
			self.events.lock().push(Event::Acquire(key.clone()));

			self.decisions
				.lock()
				.pop_front()
				.or_else(|| self.fallback.clone())
				.unwrap_or_else(Acquisition::allow)
		})
	}

	fn record_success<'a>(&'a self, key: &'a CredentialKey) -> ThrottleFuture<'a, ()> {
		self.events.lock().push(Event::Success(key.clone()));

		Box::pin(async {})
	}

	fn record_failure<'a>(&'a self, key: &'a CredentialKey) -> ThrottleFuture<'a, ()> {
		self.events.lock().push(Event::Failure(key.clone()));

		Box::pin(async {})
	}
}

/// Pacer that schedules every call `delay` after the clock's current time.
pub struct RecordingPacer {
	clock: Arc<dyn Clock>,
	delay: Duration,
	reserved: Mutex<Vec<CredentialKey>>,
}
impl RecordingPacer {
	pub fn new(clock: Arc<dyn Clock>, delay: Duration) -> Self {
		Self { clock, delay, reserved: Mutex::new(Vec::new()) }
	}

	pub fn reserved(&self) -> Vec<CredentialKey> {
		self.reserved.lock().clone()
	}
}
impl RequestPacer for RecordingPacer {
	fn reserve<'a>(&'a self, key: &'a CredentialKey) -> ThrottleFuture<'a, PacingSlot> {
		self.reserved.lock().push(key.clone());

		let slot = PacingSlot::at(self.clock.now() + self.delay);

		Box::pin(async move { slot })
	}
}

/// Executor wired to fakes on a manual clock.
pub struct Harness {
	pub executor: RateLimitedExecutor<ScriptedTransport>,
	pub transport: Arc<ScriptedTransport>,
	pub limiter: Arc<RecordingLimiter>,
	pub pacer: Arc<RecordingPacer>,
	pub clock: ManualClock,
}
impl Harness {
	pub fn new(
		transport: ScriptedTransport,
		limiter: RecordingLimiter,
		jitter: impl 'static + JitterSource,
	) -> Self {
		Self::with_pacing(transport, limiter, jitter, Duration::ZERO)
	}

	pub fn with_pacing(
		transport: ScriptedTransport,
		limiter: RecordingLimiter,
		jitter: impl 'static + JitterSource,
		pacing: Duration,
	) -> Self {
		let clock = ManualClock::new(NOW);
		let transport = Arc::new(transport);
		let limiter = Arc::new(limiter);
		let pacer = Arc::new(RecordingPacer::new(Arc::new(clock.clone()), pacing));
		let executor = RateLimitedExecutor::<ScriptedTransport>::with_transport(
			transport.clone(),
			limiter.clone(),
			pacer.clone(),
		)
		.with_clock(Arc::new(clock.clone()))
		.with_jitter(Arc::new(jitter));

		Self { executor, transport, limiter, pacer, clock }
	}

	pub fn with_config(mut self, config: ExecutorConfig) -> Self {
		self.executor = self.executor.with_config(config).expect("Executor config should validate.");

		self
	}

	/// Positive sleeps only; pacing records a zero-length sleep per send.
	pub fn waits(&self) -> Vec<Duration> {
		self.clock.sleeps().into_iter().filter(|wait| wait.is_positive()).collect()
	}
}

pub fn authorized_request(path: &str) -> PreparedRequest {
	let base: Url = DEFAULT_BASE_URL.parse().expect("Default base URL should parse.");

	PreparedRequest::github(Method::GET, &base, path)
		.expect("GitHub request should build.")
		.token_auth(TOKEN)
		.expect("Token header should be valid.")
		.build()
}

pub fn response(status: u16, headers: &[(&str, &str)], body: &str) -> RawResponse {
	let mut map = HeaderMap::new();

	for (name, value) in headers {
		map.insert(
			HeaderName::from_bytes(name.as_bytes()).expect("Header name should be valid."),
			HeaderValue::from_str(value).expect("Header value should be valid."),
		);
	}

	RawResponse::new(StatusCode::from_u16(status).expect("Status should be valid."), body)
		.with_headers(map)
}

pub fn ok(body: &str) -> Step {
	Step::Respond(response(200, &[("content-type", "application/json")], body))
}
