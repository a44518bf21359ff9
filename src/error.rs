//! Gateway-level error types shared across transports, stores, and the refresh protocol.

// self
use crate::{_prelude::*, config::GatewayConfigError, http::HttpResponse, store::StoreError};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// No response was received (DNS, TCP, TLS, IO).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Server answered with a non-success status.
	#[error(transparent)]
	Status(#[from] HttpStatusError),
	/// Credential recovery failed; every queued caller observes the same error.
	#[error("Credential refresh failed.")]
	Refresh(#[from] Arc<RefreshError>),
	/// Request body could not be serialized.
	#[error("Request body could not be encoded as JSON.")]
	Encode(#[source] serde_json::Error),
	/// Response body could not be decoded into the requested type.
	#[error("Response body returned with HTTP {status} could not be decoded.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the decoded response.
		status: u16,
	},
	/// Caller fired its abort signal before the request settled.
	#[error("Request was aborted by the caller.")]
	Aborted,
}
impl Error {
	/// Returns the HTTP status carried by the error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status(e) => Some(e.status),
			Self::Decode { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Reports whether the server rejected the attached credential.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Status(e) if e.status == HttpStatusError::UNAUTHORIZED)
	}

	/// Returns the shared refresh failure, if recovery failed.
	pub fn as_refresh(&self) -> Option<&Arc<RefreshError>> {
		match self {
			Self::Refresh(e) => Some(e),
			_ => None,
		}
	}
}

/// Configuration and request construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Request path cannot be resolved against the base URL.
	#[error("Path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request path resolves to a different origin or escapes the base path.
	#[error("Path `{path}` resolves outside the base URL.")]
	PathOutsideBase {
		/// Offending path.
		path: String,
	},
	/// Gateway configuration failed validation.
	#[error(transparent)]
	Invalid(#[from] GatewayConfigError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures where no response was received.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
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

/// Non-success HTTP response surfaced to the caller unmodified.
#[derive(Clone, Debug, ThisError)]
#[error("Server responded with HTTP {status}.")]
pub struct HttpStatusError {
	/// HTTP status code.
	pub status: u16,
	/// Response body, decoded lossily as UTF-8.
	pub body: String,
	/// Retry-After hint from upstream, if supplied.
	pub retry_after: Option<Duration>,
}
impl HttpStatusError {
	/// Status that signals an expired or missing credential.
	pub const UNAUTHORIZED: u16 = 401;

	/// Captures status, body, and retry hint from a failed response.
	pub fn from_response(response: &HttpResponse) -> Self {
		Self {
			status: response.status,
			body: String::from_utf8_lossy(&response.body).into_owned(),
			retry_after: response.retry_after(),
		}
	}

	/// Parses the body as JSON, returning `None` when it is not valid JSON.
	pub fn json_body(&self) -> Option<serde_json::Value> {
		serde_json::from_str(&self.body).ok()
	}
}

/// Failure of the credential refresh exchange.
///
/// A network failure and a rejected refresh are handled identically by the gateway: the
/// credential is cleared, queued callers fail, and the navigator is sent to the login path.
/// The variants only preserve diagnostics.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// Refresh endpoint answered with a non-success status.
	#[error("Refresh endpoint rejected the request with HTTP {status}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
	},
	/// Refresh endpoint could not be reached.
	#[error("Network error occurred while calling the refresh endpoint.")]
	Transport(#[source] TransportError),
	/// Refresh endpoint returned a body without a usable `access` field.
	#[error("Refresh endpoint returned a malformed body.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Refresh endpoint returned an empty access token.
	#[error("Refresh endpoint returned an empty access token.")]
	EmptyToken,
	/// Refresh endpoint URL cannot be resolved.
	#[error("Refresh endpoint cannot be resolved against the base URL.")]
	InvalidEndpoint(#[source] ConfigError),
	/// Refreshed credential could not be persisted.
	#[error("Refreshed credential could not be stored.")]
	Storage(#[source] StoreError),
	/// The future driving the refresh was dropped before it settled.
	#[error("Refresh was interrupted before it settled.")]
	Interrupted,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unauthorized_only_matches_status_errors() {
		let unauthorized = Error::from(HttpStatusError {
			status: 401,
			body: String::new(),
			retry_after: None,
		});
		let server_error =
			Error::from(HttpStatusError { status: 500, body: "boom".into(), retry_after: None });

		assert!(unauthorized.is_unauthorized());
		assert!(!server_error.is_unauthorized());
		assert_eq!(server_error.status(), Some(500));
		assert!(!Error::Aborted.is_unauthorized());
	}

	#[test]
	fn refresh_error_is_exposed_as_source() {
		let shared = Arc::new(RefreshError::Rejected { status: 401 });
		let err = Error::from(shared.clone());
		let source = StdError::source(&err).expect("Refresh errors should expose their source.");

		assert_eq!(source.to_string(), shared.to_string());
		assert!(!err.to_string().contains(&shared.to_string()));
		assert!(Arc::ptr_eq(err.as_refresh().expect("Refresh variant expected."), &shared));
	}

	#[test]
	fn status_error_parses_json_body() {
		let err = HttpStatusError {
			status: 400,
			body: "{\"detail\":\"bad\"}".into(),
			retry_after: None,
		};

		let detail = err.json_body().and_then(|v| v["detail"].as_str().map(String::from));

		assert_eq!(detail.as_deref(), Some("bad"));
	}
}
