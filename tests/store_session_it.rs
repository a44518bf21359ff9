// std
use std::{env, io, path::PathBuf, process, sync::Arc};
// self
use bearer_gateway::{
	auth::CredentialState,
	config::GatewayConfig,
	gateway::Gateway,
	http::{GatewayHttpClient, HttpFuture, HttpRequest, HttpResponse},
	navigate::{Navigator, NoopNavigator},
	store::{CredentialStore, FileStore, MemoryStore},
	url::Url,
};

/// Backend that rejects `stale`, issues `fresh` from the refresh endpoint, and accepts it.
struct RotatingBackend;
impl GatewayHttpClient for RotatingBackend {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			let response = match (request.url.path(), request.bearer()) {
				("/auth/token/refresh/", _) => HttpResponse::new(200, "{\"access\":\"fresh\"}"),
				(_, Some("fresh")) => HttpResponse::new(200, "{}"),
				(_, _) => HttpResponse::new(401, ""),
			};

			Ok(response)
		})
	}
}

fn temp_path(label: &str) -> PathBuf {
	env::temp_dir().join(format!(
		"bearer_gateway_session_{label}_{}_{}.json",
		process::id(),
		time::OffsetDateTime::now_utc().unix_timestamp_nanos(),
	))
}

fn gateway(store: Arc<dyn CredentialStore>) -> Gateway<RotatingBackend> {
	let config = GatewayConfig::builder(
		Url::parse("https://backend.example.com").expect("Fixture URL should parse."),
	)
	.build()
	.expect("Gateway config should build successfully.");
	let navigator: Arc<dyn Navigator> = Arc::new(NoopNavigator);

	Gateway::with_http_client(config, RotatingBackend, store, navigator)
}

#[tokio::test]
async fn refreshed_credential_survives_restart() {
	let path = temp_path("restart");
	let store: Arc<dyn CredentialStore> =
		Arc::new(FileStore::open(&path).expect("Failed to open file store."));
	let first = gateway(store);

	first.login("stale").expect("Login should persist the credential.");
	first.get("/v1/me/").await.expect("Request should recover through refresh.");

	drop(first);

	let reopened: Arc<dyn CredentialStore> =
		Arc::new(FileStore::open(&path).expect("Failed to reopen file store."));
	let second = gateway(reopened);
	let credential = second.credential().expect("Credential should load.");

	assert_eq!(credential.as_ref().map(|token| token.expose()), Some("fresh"));
	assert_eq!(
		second.credential_state().expect("State should load."),
		CredentialState::Authenticated,
	);

	second.get("/v1/me/").await.expect("Restored credential should be accepted.");
	assert_eq!(second.refresh_metrics().attempts(), 0);

	second.logout().expect("Logout should clear the snapshot.");

	match std::fs::read_to_string(&path) {
		Ok(contents) => assert!(!contents.contains("fresh")),
		Err(err) => assert_eq!(err.kind(), io::ErrorKind::NotFound),
	}

	let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn empty_stored_value_counts_as_anonymous() {
	let store = Arc::new(MemoryStore::with_entry(GatewayConfig::DEFAULT_CREDENTIAL_KEY, ""));
	let gateway = gateway(store.clone());

	assert!(gateway.credential().expect("Credential should load.").is_none());
	assert_eq!(gateway.credential_state().expect("State should load."), CredentialState::Anonymous);

	let err = gateway.get("/v1/me/").await.expect_err("Anonymous request should be rejected.");

	assert!(err.is_unauthorized());
	assert_eq!(gateway.refresh_metrics().attempts(), 0);
	assert_eq!(store.len(), 1);
}

#[test]
fn custom_credential_key_is_honored() {
	let store = Arc::new(MemoryStore::default());
	let config = GatewayConfig::builder(
		Url::parse("https://backend.example.com").expect("Fixture URL should parse."),
	)
	.credential_key("session_token")
	.build()
	.expect("Gateway config should build successfully.");
	let navigator: Arc<dyn Navigator> = Arc::new(NoopNavigator);
	let gateway: Gateway<RotatingBackend> =
		Gateway::with_http_client(config, RotatingBackend, store.clone(), navigator);

	gateway.login("abc").expect("Login should store the credential.");

	assert_eq!(
		store.get("session_token").expect("Store read should succeed.").as_deref(),
		Some("abc"),
	);
	assert_eq!(
		store.get(GatewayConfig::DEFAULT_CREDENTIAL_KEY).expect("Store read should succeed."),
		None,
	);
}
