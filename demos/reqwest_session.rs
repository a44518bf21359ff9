//! Demonstrates a cookie-backed session on the default reqwest transport: log in, let the
//! access token expire, and watch the gateway refresh it through the http-only refresh cookie.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use bearer_gateway::{
	config::GatewayConfig,
	gateway::ReqwestGateway,
	navigate::{Navigator, RecordingNavigator},
	store::{CredentialStore, FileStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login/");
			then.status(200)
				.header("set-cookie", "refresh=demo-refresh; Path=/api/auth/; HttpOnly")
				.json_body(json!({ "access": "demo-access-1" }));
		})
		.await;
	let expired_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/auth/me/")
				.header("authorization", "Bearer demo-access-1");
			then.status(401).json_body(json!({ "code": "token_not_valid" }));
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/").cookie("refresh", "demo-refresh");
			then.status(200).json_body(json!({ "access": "demo-access-2" }));
		})
		.await;
	let me_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/auth/me/")
				.header("authorization", "Bearer demo-access-2");
			then.status(200).json_body(json!({ "id": 7, "email": "demo@example.com" }));
		})
		.await;
	let session_path = std::env::temp_dir().join("bearer_gateway_demo_session.json");
	let store: Arc<dyn CredentialStore> = Arc::new(FileStore::open(&session_path)?);
	let navigator = RecordingNavigator::default();
	let shared_navigator: Arc<dyn Navigator> = Arc::new(navigator.clone());
	let config = GatewayConfig::builder(Url::parse(&server.url("/api/"))?).build()?;
	let gateway = ReqwestGateway::new(config, store, shared_navigator)?;
	let issued: serde_json::Value = gateway
		.post("auth/login/", &json!({ "email": "demo@example.com", "password": "hunter2" }))
		.await?
		.json()?;

	if let Some(access) = issued["access"].as_str() {
		gateway.login(access)?;
	}

	let me: serde_json::Value = gateway.get("/v1/auth/me/").await?.json()?;

	println!("Current user after transparent refresh: {me}.");
	println!("Credential persisted at {}: {:?}.", session_path.display(), gateway.credential()?);
	println!("Navigator visits: {:?}.", navigator.visits());

	login_mock.assert_async().await;
	expired_mock.assert_async().await;
	refresh_mock.assert_async().await;
	me_mock.assert_async().await;

	gateway.logout()?;

	Ok(())
}
