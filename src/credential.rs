//! Per-caller credential keys that partition rate-limit and pacing state.
//!
//! A [`CredentialKey`] is derived once per logical call from the request's `Authorization`
//! header and reused for every retry of that call. The key is a secret (it usually *is* the
//! access token), so its formatters redact the value and [`CredentialKey::fingerprint`] is the
//! only representation suitable for logs and metrics.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use http::{HeaderMap, header::AUTHORIZATION};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const LEGACY_TOKEN_PREFIX: &str = "token ";
const BEARER_PREFIX: &str = "Bearer ";
const ANONYMOUS: &str = "anonymous";

/// Identity string used as the map key into limiter and pacer state.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CredentialKey(String);
impl CredentialKey {
	/// Wraps an already-extracted key.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Sentinel key shared by every unauthenticated caller.
	pub fn anonymous() -> Self {
		Self(ANONYMOUS.into())
	}

	/// Derives the key from the `Authorization` header.
	///
	/// `token <X>` and `Bearer <X>` yield `<X>`; any other scheme uses the whole header value;
	/// a missing header yields [`CredentialKey::anonymous`]. Non-UTF-8 bytes are replaced
	/// lossily instead of failing.
	pub fn from_headers(headers: &HeaderMap) -> Self {
		let Some(value) = headers.get(AUTHORIZATION) else {
			return Self::anonymous();
		};
		let raw = String::from_utf8_lossy(value.as_bytes());

		Self::from_authorization(&raw)
	}

	/// Derives the key from a raw `Authorization` header value.
	pub fn from_authorization(value: &str) -> Self {
		if let Some(rest) = value.strip_prefix(LEGACY_TOKEN_PREFIX) {
			return Self(rest.to_owned());
		}
		if let Some(rest) = value.strip_prefix(BEARER_PREFIX) {
			return Self(rest.to_owned());
		}

		Self(value.to_owned())
	}

	/// Returns `true` for the unauthenticated sentinel.
	pub fn is_anonymous(&self) -> bool {
		self.0 == ANONYMOUS
	}

	/// Returns the inner key. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Short, non-reversible digest of the key that is safe to log.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());

		URL_SAFE_NO_PAD.encode(&digest[..8])
	}
}
impl Debug for CredentialKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("CredentialKey").field(&"<redacted>").finish()
	}
}
impl Display for CredentialKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
