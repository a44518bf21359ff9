//! Transport primitives for gateway requests.
//!
//! The module exposes [`GatewayHttpClient`] alongside the transport-neutral [`HttpRequest`]
//! and [`HttpResponse`] values so downstream crates can plug in custom HTTP stacks. The
//! gateway only ever hands a transport fully-resolved requests (absolute URL, final headers)
//! and expects every received response back, whatever its status. Transports must reserve
//! [`TransportError`] for the case where no response arrived at all; the gateway never treats
//! those as credential expiry.

// crates.io
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

const RETRY_AFTER: &str = "retry-after";

/// Boxed future returned by [`GatewayHttpClient::execute`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing gateway requests.
///
/// The trait is the gateway's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so a single transport can be shared by every in-flight request
/// (including the refresh exchange) behind an `Arc`. Transports that want the refresh call to
/// carry an ambient credential, such as an http-only cookie, must keep it themselves.
pub trait GatewayHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the received response, success or not.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// HTTP verbs the gateway passes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully-resolved outbound request handed to a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Header map with lower-case names.
	pub headers: BTreeMap<String, String>,
	/// Encoded request body, if any.
	pub body: Option<Vec<u8>>,
}
impl HttpRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: BTreeMap::new(), body: None }
	}

	/// Returns a header value by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Returns the bearer token carried in the `authorization` header, if any.
	pub fn bearer(&self) -> Option<&str> {
		self.header("authorization").and_then(|value| value.strip_prefix("Bearer "))
	}
}

/// Response received from a transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Header map with lower-case names.
	pub headers: BTreeMap<String, String>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Creates a response with the provided status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Adds a header, normalizing its name to lower case.
	pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
		self.headers.insert(name.to_ascii_lowercase(), value.into());

		self
	}

	/// Reports whether the status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns a header value by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Returns the body decoded lossily as UTF-8.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body as JSON into `T`.
	///
	/// Empty bodies (for example `204 No Content`) decode as JSON `null`, so `Option<_>` and
	/// `()` targets accept them.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.decode().map_err(|source| Error::Decode { source, status: self.status })
	}

	/// Parses the `Retry-After` header as a relative duration.
	pub fn retry_after(&self) -> Option<Duration> {
		let raw = self.header(RETRY_AFTER)?.trim();

		if let Ok(secs) = raw.parse::<u64>() {
			return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
		}
		if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
			let delta = moment - OffsetDateTime::now_utc();

			if delta.is_positive() {
				return Some(delta);
			}
		}

		None
	}

	pub(crate) fn decode<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: DeserializeOwned,
	{
		let body: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
			b"null"
		} else {
			&self.body
		};
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut de)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// [`ReqwestHttpClient::new`] enables reqwest's cookie store so the refresh endpoint receives
/// the http-only refresh cookie issued at login. Clients supplied through
/// [`ReqwestHttpClient::with_client`] should enable it too when the backend relies on cookies.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with a cookie store.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		Ok(Self(ReqwestClient::builder().cookie_store(true).build()?))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl GatewayHttpClient for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
				Method::Patch => reqwest::Method::PATCH,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder = self.0.request(method, request.url);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.bytes().await?.to_vec();

			Ok(HttpResponse { status, headers, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn retry_after_accepts_seconds() {
		let response = HttpResponse::new(503, "").with_header("Retry-After", "7");

		assert_eq!(response.retry_after(), Some(Duration::seconds(7)));
		assert_eq!(HttpResponse::new(503, "").retry_after(), None);
	}

	#[test]
	fn empty_body_decodes_as_null() {
		let response = HttpResponse::new(204, "");
		let decoded: Option<serde_json::Value> =
			response.json().expect("Empty bodies should decode as null.");

		assert!(decoded.is_none());
	}

	#[test]
	fn decode_errors_report_path_and_status() {
		#[derive(Debug, Deserialize)]
		struct Profile {
			#[allow(dead_code)]
			id: u64,
		}

		let response = HttpResponse::new(200, "{\"id\":\"seven\"}");
		let err = response.json::<Profile>().expect_err("String ids should fail to decode.");

		match err {
			Error::Decode { source, status } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "id");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn bearer_reads_authorization_header() {
		let url = Url::parse("https://api.example.com/v1/").expect("Fixture URL should parse.");
		let mut request = HttpRequest::new(Method::Get, url);

		assert_eq!(request.bearer(), None);

		request.headers.insert("authorization".into(), "Bearer abc".into());

		assert_eq!(request.bearer(), Some("abc"));
		assert_eq!(Method::Patch.to_string(), "PATCH");
	}
}
