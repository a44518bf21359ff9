//! Authenticated request gateway with single-flight credential recovery.
//!
//! [`Gateway::request`] attaches the stored access token, sends the request, and returns the
//! response untouched unless the server answers `401` to a request that carried a credential
//! and has not been retried yet. In that case the request is marked as retried and joins the
//! recovery protocol run by the shared [`RefreshCoordinator`]: exactly one caller performs the
//! refresh exchange while the others wait in FIFO order, then every caller replays its own
//! request once with the new credential. A replay is never recovered again, so a credential
//! that keeps failing cannot loop. A failed refresh clears the credential, rejects every
//! waiter with the same [`RefreshError`], and sends the [`Navigator`] to the login path.

pub mod abort;

pub use abort::{AbortController, AbortSignal};

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CredentialState},
	config::GatewayConfig,
	error::{HttpStatusError, RefreshError},
	http::{GatewayHttpClient, HttpRequest, HttpResponse, Method},
	navigate::Navigator,
	obs::{self, GatewayOp, GatewaySpan, OpOutcome, debug_event, warn_event},
	refresh::{RefreshCoordinator, RefreshLease, RefreshMetrics, RefreshTicket},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestHttpClient>;

/// Per-request settings.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
	/// Extra headers with lower-case names. `authorization` is replaced whenever a credential
	/// is attached.
	pub headers: BTreeMap<String, String>,
	/// Signal that cancels this caller's own work.
	pub abort: Option<AbortSignal>,
}
impl RequestOptions {
	/// Adds a header.
	pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
		self.headers.insert(name.to_ascii_lowercase(), value.into());

		self
	}

	/// Attaches an abort signal.
	pub fn with_abort(mut self, signal: AbortSignal) -> Self {
		self.abort = Some(signal);

		self
	}
}

/// Issues authenticated requests against a single backend.
///
/// The gateway owns the transport, the credential store, the navigation collaborator, and
/// the refresh coordinator. Cloning is cheap and clones share all of them, so concurrent
/// requests from any clone collapse into the same refresh.
pub struct Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Base address, refresh path, login path, and storage key.
	pub config: GatewayConfig,
	/// Transport used for every outbound request, including the refresh exchange.
	pub http_client: Arc<C>,
	/// Store holding the access token.
	pub store: Arc<dyn CredentialStore>,
	/// Collaborator notified when the session cannot be recovered.
	pub navigator: Arc<dyn Navigator>,
	coordinator: Arc<RefreshCoordinator>,
}
impl<C> Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Creates a gateway around the caller-provided transport.
	pub fn with_http_client(
		config: GatewayConfig,
		http_client: impl Into<Arc<C>>,
		store: Arc<dyn CredentialStore>,
		navigator: Arc<dyn Navigator>,
	) -> Self {
		Self {
			config,
			http_client: http_client.into(),
			store,
			navigator,
			coordinator: Default::default(),
		}
	}

	/// Replaces the refresh coordinator, e.g. to share one between gateways that use the same
	/// credential store.
	pub fn with_coordinator(mut self, coordinator: Arc<RefreshCoordinator>) -> Self {
		self.coordinator = coordinator;

		self
	}

	/// Returns the refresh coordinator.
	pub fn refresh_coordinator(&self) -> &Arc<RefreshCoordinator> {
		&self.coordinator
	}

	/// Returns the refresh protocol counters.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		self.coordinator.metrics()
	}

	/// Returns the stored credential; empty values count as absent.
	pub fn credential(&self) -> Result<Option<AccessToken>> {
		let value = self.store.get(&self.config.credential_key)?;

		Ok(value.filter(|value| !value.is_empty()).map(AccessToken::new))
	}

	/// Reports where the credential is in its lifecycle.
	///
	/// `Refreshing` while a refresh is in flight, `Expired` after a replay was rejected with
	/// the recovered credential, otherwise `Authenticated` or `Anonymous` by presence.
	pub fn credential_state(&self) -> Result<CredentialState> {
		if self.coordinator.is_refreshing() {
			return Ok(CredentialState::Refreshing);
		}

		let state = match self.credential()? {
			None => CredentialState::Anonymous,
			Some(_) if self.coordinator.is_expired() => CredentialState::Expired,
			Some(_) => CredentialState::Authenticated,
		};

		Ok(state)
	}

	/// Stores a credential obtained from a login exchange.
	pub fn login(&self, token: impl Into<AccessToken>) -> Result<()> {
		let token = token.into();

		self.store.set(&self.config.credential_key, Some(token.expose()))?;
		self.coordinator.clear_expired();

		Ok(())
	}

	/// Forgets the stored credential.
	pub fn logout(&self) -> Result<()> {
		self.store.set(&self.config.credential_key, None)?;
		self.coordinator.clear_expired();

		Ok(())
	}

	/// Sends `method path` with an optional JSON body.
	///
	/// `path` is resolved against the configured base URL. The response is returned only when
	/// its status is 2xx; every other status surfaces as [`Error::Status`] unless it is a
	/// recoverable `401`.
	pub async fn request(
		&self,
		method: Method,
		path: &str,
		body: Option<serde_json::Value>,
		options: RequestOptions,
	) -> Result<HttpResponse> {
		const OP: GatewayOp = GatewayOp::Request;

		let span = GatewaySpan::new(OP, "request");

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let body = body
					.map(|value| serde_json::to_vec(&value))
					.transpose()
					.map_err(Error::Encode)?;
				let call = Call {
					method,
					url: self.config.endpoint(path)?,
					headers: options.headers,
					body,
					retried: false,
				};

				self.execute(call, options.abort.as_ref()).await
			})
			.await;

		obs::record_op_result(OP, &result);

		result
	}

	/// Sends a request and decodes the JSON response body.
	pub async fn request_json<T>(
		&self,
		method: Method,
		path: &str,
		body: Option<serde_json::Value>,
		options: RequestOptions,
	) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.request(method, path, body, options).await?.json()
	}

	/// `GET path`.
	pub async fn get(&self, path: &str) -> Result<HttpResponse> {
		self.request(Method::Get, path, None, RequestOptions::default()).await
	}

	/// `DELETE path`.
	pub async fn delete(&self, path: &str) -> Result<HttpResponse> {
		self.request(Method::Delete, path, None, RequestOptions::default()).await
	}

	/// `POST path` with a JSON body.
	pub async fn post<B>(&self, path: &str, body: &B) -> Result<HttpResponse>
	where
		B: ?Sized + Serialize,
	{
		self.request(Method::Post, path, Some(encode(body)?), RequestOptions::default()).await
	}

	/// `PUT path` with a JSON body.
	pub async fn put<B>(&self, path: &str, body: &B) -> Result<HttpResponse>
	where
		B: ?Sized + Serialize,
	{
		self.request(Method::Put, path, Some(encode(body)?), RequestOptions::default()).await
	}

	/// `PATCH path` with a JSON body.
	pub async fn patch<B>(&self, path: &str, body: &B) -> Result<HttpResponse>
	where
		B: ?Sized + Serialize,
	{
		self.request(Method::Patch, path, Some(encode(body)?), RequestOptions::default()).await
	}

	async fn execute(&self, mut call: Call, abort: Option<&AbortSignal>) -> Result<HttpResponse> {
		let sent = self.credential()?;
		let err = match self.send(&call, sent.as_ref(), abort).await {
			Ok(response) => {
				if sent.is_some() {
					self.coordinator.clear_expired();
				}

				return Ok(response);
			},
			Err(err) => err,
		};
		let sent = match sent {
			Some(sent) if !call.retried && err.is_unauthorized() => sent,
			_ => return Err(err),
		};

		call.retried = true;

		debug_event!("credential rejected, recovering", url = call.url.as_str());

		let token = self.recover(&sent, abort).await?;
		let replayed = self.replay(&call, &token, abort).await;

		// The recovered credential was rejected too; nothing more is attempted for this call.
		if matches!(&replayed, Err(err) if err.is_unauthorized()) {
			self.coordinator.mark_expired();
		}

		replayed
	}

	async fn recover(
		&self,
		sent: &AccessToken,
		abort: Option<&AbortSignal>,
	) -> Result<AccessToken> {
		match self.coordinator.enter() {
			RefreshTicket::Waiter(pending) => {
				debug_event!("queued behind in-flight refresh", waiter = pending.id());

				let outcome = abort::abortable(abort, async { Ok(pending.wait().await) }).await?;

				outcome.map_err(Error::from)
			},
			RefreshTicket::Leader(lease) => {
				// A refresh may have settled between this request leaving and its 401 arriving.
				if let Some(current) = self.credential()?.filter(|current| current != sent) {
					debug_event!("credential already refreshed, skipping exchange");

					lease.hand_over(current.clone());

					return Ok(current);
				}

				self.lead_refresh(lease).await
			},
		}
	}

	async fn lead_refresh(&self, lease: RefreshLease<'_>) -> Result<AccessToken> {
		const OP: GatewayOp = GatewayOp::Refresh;

		let span = GatewaySpan::new(OP, "lead_refresh");

		obs::record_op_outcome(OP, OpOutcome::Attempt);
		self.coordinator.metrics().record_attempt();

		let exchanged = span.instrument(self.exchange_refresh()).await;

		obs::record_op_result(OP, &exchanged);

		match exchanged {
			Ok(token) => {
				debug_event!("refresh succeeded", waiters = self.coordinator.pending());

				lease.complete(Ok(token.clone()));

				Ok(token)
			},
			Err(err) => {
				let err = Arc::new(err);

				if let Err(clear) = self.store.set(&self.config.credential_key, None) {
					warn_event!("failed to clear credential after refresh failure", error = clear);
				}

				warn_event!(
					"refresh failed, redirecting to login",
					error = err,
					waiters = self.coordinator.pending()
				);

				lease.complete(Err(err.clone()));
				self.navigator.navigate_to(&self.config.login_path);

				Err(Error::Refresh(err))
			},
		}
	}

	async fn exchange_refresh(&self) -> Result<AccessToken, RefreshError> {
		#[derive(Deserialize)]
		struct RefreshPayload {
			access: String,
		}

		let url = self.config.refresh_endpoint().map_err(RefreshError::InvalidEndpoint)?;
		let mut request = HttpRequest::new(Method::Post, url);

		request.headers.insert("accept".into(), "application/json".into());

		let response = self.http_client.execute(request).await.map_err(RefreshError::Transport)?;

		if !response.is_success() {
			return Err(RefreshError::Rejected { status: response.status });
		}

		let payload = response
			.decode::<RefreshPayload>()
			.map_err(|source| RefreshError::MalformedResponse { source })?;

		if payload.access.trim().is_empty() {
			return Err(RefreshError::EmptyToken);
		}

		let token = AccessToken::new(payload.access);

		self.store
			.set(&self.config.credential_key, Some(token.expose()))
			.map_err(RefreshError::Storage)?;

		Ok(token)
	}

	async fn replay(
		&self,
		call: &Call,
		token: &AccessToken,
		abort: Option<&AbortSignal>,
	) -> Result<HttpResponse> {
		const OP: GatewayOp = GatewayOp::Replay;

		debug_assert!(call.retried, "Replays must carry the retried mark.");

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result =
			GatewaySpan::new(OP, "replay").instrument(self.send(call, Some(token), abort)).await;

		obs::record_op_result(OP, &result);

		result
	}

	async fn send(
		&self,
		call: &Call,
		token: Option<&AccessToken>,
		abort: Option<&AbortSignal>,
	) -> Result<HttpResponse> {
		let request = call.to_request(token);
		let response = abort::abortable(abort, async {
			self.http_client.execute(request).await.map_err(Error::from)
		})
		.await?;

		if response.is_success() {
			Ok(response)
		} else {
			Err(HttpStatusError::from_response(&response).into())
		}
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestHttpClient> {
	/// Creates a gateway backed by a cookie-enabled reqwest client.
	pub fn new(
		config: GatewayConfig,
		store: Arc<dyn CredentialStore>,
		navigator: Arc<dyn Navigator>,
	) -> Result<Self> {
		Ok(Self::with_http_client(config, ReqwestHttpClient::new()?, store, navigator))
	}
}
impl<C> Clone for Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			http_client: self.http_client.clone(),
			store: self.store.clone(),
			navigator: self.navigator.clone(),
			coordinator: self.coordinator.clone(),
		}
	}
}
impl<C> Debug for Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("config", &self.config)
			.field("refreshing", &self.coordinator.is_refreshing())
			.finish()
	}
}

/// A caller's request, kept intact so it can be replayed after recovery.
#[derive(Clone, Debug)]
struct Call {
	method: Method,
	url: Url,
	headers: BTreeMap<String, String>,
	body: Option<Vec<u8>>,
	retried: bool,
}
impl Call {
	fn to_request(&self, token: Option<&AccessToken>) -> HttpRequest {
		let mut headers = self.headers.clone();

		headers.entry("accept".into()).or_insert_with(|| "application/json".into());

		if self.body.is_some() {
			headers.entry("content-type".into()).or_insert_with(|| "application/json".into());
		}
		if let Some(token) = token {
			headers.insert("authorization".into(), token.bearer_header());
		}

		HttpRequest { method: self.method, url: self.url.clone(), headers, body: self.body.clone() }
	}
}

fn encode<B>(body: &B) -> Result<serde_json::Value>
where
	B: ?Sized + Serialize,
{
	serde_json::to_value(body).map_err(Error::Encode)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn call(body: Option<&str>) -> Call {
		Call {
			method: Method::Post,
			url: Url::parse("https://api.example.com/v1/posts/")
				.expect("Fixture URL should parse."),
			headers: BTreeMap::from([("authorization".to_string(), "Basic stale".to_string())]),
			body: body.map(|value| value.as_bytes().to_vec()),
			retried: false,
		}
	}

	#[test]
	fn to_request_attaches_bearer_and_json_headers() {
		let request = call(Some("{}")).to_request(Some(&AccessToken::new("abc")));

		assert_eq!(request.bearer(), Some("abc"));
		assert_eq!(request.header("content-type"), Some("application/json"));
		assert_eq!(request.header("accept"), Some("application/json"));
		assert_eq!(request.body.as_deref(), Some(&b"{}"[..]));
	}

	#[test]
	fn to_request_without_token_keeps_caller_headers() {
		let request = call(None).to_request(None);

		assert_eq!(request.header("authorization"), Some("Basic stale"));
		assert_eq!(request.header("content-type"), None);
	}

	#[cfg(feature = "reqwest")]
	#[tokio::test]
	async fn reqwest_gateway_refreshes_and_replays() {
		// crates.io
		use httpmock::prelude::*;
		// self
		use crate::_preludet::build_reqwest_test_gateway;

		let server = MockServer::start_async().await;
		let rejected = server
			.mock_async(|when, then| {
				when.method(GET).path("/v1/auth/me/").header("authorization", "Bearer stale");
				then.status(401);
			})
			.await;
		let refresh = server
			.mock_async(|when, then| {
				when.method(POST).path("/auth/token/refresh/");
				then.status(200).json_body(serde_json::json!({ "access": "fresh" }));
			})
			.await;
		let accepted = server
			.mock_async(|when, then| {
				when.method(GET).path("/v1/auth/me/").header("authorization", "Bearer fresh");
				then.status(200).json_body(serde_json::json!({ "id": 1 }));
			})
			.await;
		let (gateway, store, navigator) = build_reqwest_test_gateway(&server.base_url());

		gateway.login("stale").expect("Login should store the credential.");

		let response = gateway.get("/v1/auth/me/").await.expect("Replay should succeed.");

		rejected.assert_async().await;
		refresh.assert_async().await;
		accepted.assert_async().await;

		assert_eq!(response.status, 200);
		assert_eq!(
			store.get(GatewayConfig::DEFAULT_CREDENTIAL_KEY).expect("Store read should succeed."),
			Some("fresh".into()),
		);
		assert!(navigator.visits().is_empty());
		assert_eq!(gateway.refresh_metrics().successes(), 1);
	}

	#[test]
	fn options_normalize_header_names() {
		let options = RequestOptions::default().with_header("X-Client", "web");

		assert_eq!(options.headers.get("x-client").map(String::as_str), Some("web"));
		assert!(options.abort.is_none());
	}
}
