//! Rate-limit aware request execution for GitHub-style REST APIs: per-credential admission,
//! smooth pacing, and header-driven jittered retries behind one `execute` call.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod clock;
pub mod config;
pub mod credential;
pub mod error;
pub mod executor;
pub mod http;
pub mod jitter;
pub mod obs;
pub mod request;
pub mod signal;
pub mod throttle;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use tokio_util::sync::CancellationToken;
pub use url;

pub use crate::{
	credential::CredentialKey,
	executor::{Executed, RateLimitedExecutor},
	request::PreparedRequest,
};

#[cfg(test)] use httpmock as _;
