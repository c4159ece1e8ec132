//! Immutable request values handed to the executor.
//!
//! Route builders produce a [`PreparedRequest`] once; the executor only borrows it, so every
//! retry sends exactly the same method, target, headers, and body.

// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue, Method,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
};
// self
use crate::{_prelude::*, error::ConfigError};

/// Default REST endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
/// Default value for the `X-GitHub-Api-Version` header.
pub const DEFAULT_API_VERSION: &str = "2022-11-28";
/// Media type GitHub recommends for REST calls.
pub const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

const API_VERSION_HEADER: &str = "x-github-api-version";
const USER_AGENT_VALUE: &str = concat!("github-throttle/", env!("CARGO_PKG_VERSION"));

/// Fully formed HTTP request: method, target, headers, and body.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
	method: Method,
	url: Url,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl PreparedRequest {
	/// Starts a builder for `method` against an absolute `url`.
	pub fn builder(method: Method, url: Url) -> PreparedRequestBuilder {
		PreparedRequestBuilder {
			inner: Self { method, url, headers: HeaderMap::new(), body: Vec::new() },
		}
	}

	/// Starts a builder for `path` resolved against `base` (e.g. [`DEFAULT_BASE_URL`]).
	///
	/// `base` is treated as a directory, so Enterprise roots such as `https://host/api/v3` keep
	/// their path prefix.
	pub fn github(method: Method, base: &Url, path: &str) -> Result<PreparedRequestBuilder> {
		let mut root = base.clone();

		if !root.path().ends_with('/') {
			let dir = format!("{}/", root.path());

			root.set_path(&dir);
		}

		let url = root.join(path.trim_start_matches('/')).map_err(ConfigError::from)?;

		Self::builder(method, url).github_defaults(DEFAULT_API_VERSION)
	}

	/// HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Absolute request target.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Request headers, including `Authorization` when set.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw request body; empty for bodiless requests.
	pub fn body(&self) -> &[u8] {
		&self.body
	}
}

/// Builder returned by [`PreparedRequest::builder`].
#[derive(Clone, Debug)]
pub struct PreparedRequestBuilder {
	inner: PreparedRequest,
}
impl PreparedRequestBuilder {
	/// Inserts or replaces a header.
	pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
		let name = HeaderName::from_bytes(name.as_bytes()).map_err(ConfigError::from)?;
		let value = HeaderValue::from_str(value).map_err(ConfigError::from)?;

		self.inner.headers.insert(name, value);

		Ok(self)
	}

	/// Sets `Authorization: Bearer <token>`.
	pub fn bearer_auth(self, token: &str) -> Result<Self> {
		self.authorization(format!("Bearer {token}"))
	}

	/// Sets the legacy `Authorization: token <token>` scheme.
	pub fn token_auth(self, token: &str) -> Result<Self> {
		self.authorization(format!("token {token}"))
	}

	/// Sets `Accept` and `X-GitHub-Api-Version` the way GitHub's REST API expects.
	pub fn github_defaults(mut self, api_version: &str) -> Result<Self> {
		let version = HeaderValue::from_str(api_version).map_err(ConfigError::from)?;

		self.inner.headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
		self.inner.headers.insert(HeaderName::from_static(API_VERSION_HEADER), version);

		if !self.inner.headers.contains_key(USER_AGENT) {
			self.inner.headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
		}

		Ok(self)
	}

	/// Serializes `body` as JSON and sets `Content-Type`.
	pub fn json<T>(mut self, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		self.inner.body =
			serde_json::to_vec(body).map_err(|source| ConfigError::JsonBody { source })?;
		self.inner.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// Sets a raw body without touching headers.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.inner.body = body.into();

		self
	}

	/// Finalizes the request.
	pub fn build(self) -> PreparedRequest {
		self.inner
	}

	fn authorization(mut self, value: String) -> Result<Self> {
		let mut value = HeaderValue::from_str(&value).map_err(ConfigError::from)?;

		value.set_sensitive(true);
		self.inner.headers.insert(AUTHORIZATION, value);

		Ok(self)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::credential::CredentialKey;

	fn base() -> Url {
		Url::parse(DEFAULT_BASE_URL).expect("Default base URL should parse.")
	}

	#[test]
	fn github_builder_sets_default_headers() {
		let request =
			PreparedRequest::github(Method::GET, &base(), "/repos/octocat/Hello-World/traffic/views")
				.expect("GitHub builder should succeed.")
				.bearer_auth("ghp_secret")
				.expect("Bearer token should be a valid header value.")
				.build();

		assert_eq!(
			request.url().as_str(),
			"https://api.github.com/repos/octocat/Hello-World/traffic/views"
		);
		assert_eq!(request.headers()[ACCEPT], GITHUB_MEDIA_TYPE);
		assert_eq!(request.headers()[API_VERSION_HEADER], DEFAULT_API_VERSION);
		assert!(request.headers().contains_key(USER_AGENT));
		assert!(request.headers()[AUTHORIZATION].is_sensitive());
		assert_eq!(CredentialKey::from_headers(request.headers()).expose(), "ghp_secret");
	}

	#[test]
	fn enterprise_base_keeps_path_prefix() {
		let base = Url::parse("https://ghe.example.com/api/v3").expect("Enterprise URL should parse.");
		let request = PreparedRequest::github(Method::GET, &base, "user")
			.expect("GitHub builder should succeed.")
			.build();

		assert_eq!(request.url().as_str(), "https://ghe.example.com/api/v3/user");
	}

	#[test]
	fn legacy_token_scheme_round_trips_through_extraction() {
		let request = PreparedRequest::builder(Method::GET, base())
			.token_auth("legacy")
			.expect("Token should be a valid header value.")
			.build();

		assert_eq!(request.headers()[AUTHORIZATION], "token legacy");
		assert_eq!(CredentialKey::from_headers(request.headers()).expose(), "legacy");
	}

	#[test]
	fn json_body_sets_content_type() {
		let request = PreparedRequest::builder(Method::POST, base())
			.json(&serde_json::json!({ "names": ["rust"] }))
			.expect("JSON body should serialize.")
			.build();

		assert_eq!(request.body(), br#"{"names":["rust"]}"#);
		assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
	}

	#[test]
	fn invalid_header_value_is_a_config_error() {
		let err = PreparedRequest::builder(Method::GET, base())
			.header("x-custom", "line\nbreak")
			.expect_err("Newlines are not valid header bytes.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidHeaderValue(_))));
	}
}
