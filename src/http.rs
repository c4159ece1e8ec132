//! Transport primitives for rate-limited API calls.
//!
//! The module exposes [`HttpTransport`] alongside [`RawResponse`] so downstream crates can
//! plug in custom HTTP stacks without losing the executor's rate-limit handling. A transport
//! only moves bytes: it must not retry, follow rate-limit hints, or interpret status codes.
//! Any response the server produced (including 403/429) is returned as `Ok`; only failures
//! that leave no response behind are reported as [`TransportError`].

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use http::{HeaderMap, StatusCode};
// self
use crate::{_prelude::*, error::TransportError, request::PreparedRequest};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of sending a [`PreparedRequest`].
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by many
/// concurrent calls behind an `Arc`, and the returned future must be `Send` so executor
/// futures can hop between runtime workers.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` unmodified and returns whatever the server answered.
	fn send<'a>(&'a self, request: &'a PreparedRequest) -> TransportFuture<'a>;
}

/// Completed HTTP exchange: status, headers, and the fully read body.
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers, including rate-limit hints.
	pub headers: HeaderMap,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Creates a response with no headers.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Replaces the header map.
	pub fn with_headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;

		self
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Configure any custom client with the timeouts and proxies the deployment needs; the
/// executor layers rate limiting on top and never touches the client itself.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	async fn dispatch(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
		let response = self
			.0
			.request(request.method().clone(), request.url().clone())
			.headers(request.headers().clone())
			.body(request.body().to_vec())
			.send()
			.await?;
		let status = response.status();
		let headers = response.headers().to_owned();
		let body = response.bytes().await?.to_vec();

		Ok(RawResponse { status, headers, body })
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestTransport(..)")
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send<'a>(&'a self, request: &'a PreparedRequest) -> TransportFuture<'a> {
		Box::pin(self.dispatch(request))
	}
}
