//! Executor-level error types shared across transports, decoders, and configuration.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS); no response was obtained.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body did not match the expected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// The server kept signaling rate limits after every retry was spent.
	#[error("Rate limit exceeded after {attempts} retries.")]
	RateLimitExceeded {
		/// Number of counted retries performed before giving up.
		attempts: u32,
	},
	/// The API answered with a non-success status that is not a rate-limit signal.
	#[error("API request failed with status {status}: {}.", .message.as_deref().unwrap_or("no message"))]
	Api {
		/// HTTP status code.
		status: u16,
		/// Server-supplied `message` field, when the body carried one.
		message: Option<String>,
	},
	/// The caller cancelled the call before it reached a terminal outcome.
	#[error("Request was cancelled before completion.")]
	Cancelled,
}
impl Error {
	/// Returns `true` when the error is [`Error::RateLimitExceeded`].
	pub fn is_rate_limited(&self) -> bool {
		matches!(self, Self::RateLimitExceeded { .. })
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Header name is not a valid HTTP token.
	#[error(transparent)]
	InvalidHeaderName(#[from] http::header::InvalidHeaderName),
	/// Header value contains forbidden bytes.
	#[error(transparent)]
	InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
	/// Request target cannot be parsed or joined.
	#[error("Request URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be encoded as JSON.")]
	JsonBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},

	/// Executor or throttle settings are out of range.
	#[error("Invalid {setting}: {reason}.")]
	InvalidSetting {
		/// Offending setting name.
		setting: &'static str,
		/// Why the value was rejected.
		reason: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<url::ParseError> for ConfigError {
	fn from(source: url::ParseError) -> Self {
		Self::InvalidUrl { source }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Response decoding failures, kept apart from transport and rate-limit errors.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body was not valid JSON for the requested type.
	#[error("Response body (status {status}) does not match the expected shape at `{}`.", .source.path())]
	Json {
		/// Structured parsing failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the decoded response.
		status: u16,
	},
}
