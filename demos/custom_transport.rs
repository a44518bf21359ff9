//! Demonstrates plugging an in-process transport into the gateway and watching concurrent
//! requests collapse into a single credential refresh.
//!
//! 1. Implement [`GatewayHttpClient`] for the transport. It must return every response it
//!    receives, whatever the status, and reserve [`TransportError`] for missing responses.
//! 2. Pass the transport, a [`CredentialStore`], and a [`Navigator`] to
//!    [`Gateway::with_http_client`].
//! 3. Fire requests concurrently; the first `401` leads the refresh and the rest queue behind it.

// std
use std::{
	io,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use color_eyre::Result;
use parking_lot::Mutex;
use url::Url;
// self
use bearer_gateway::{
	config::GatewayConfig,
	error::TransportError,
	gateway::Gateway,
	http::{GatewayHttpClient, HttpFuture, HttpRequest, HttpResponse},
	navigate::Navigator,
	store::{CredentialStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let backend = Arc::new(InProcessBackend::new("v2"));
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let navigator: Arc<dyn Navigator> =
		Arc::new(|path: &str| println!("Session lost, navigating to {path}."));
	let config = GatewayConfig::builder(Url::parse("https://backend.internal/api/")?).build()?;
	let gateway: Gateway<InProcessBackend> =
		Gateway::with_http_client(config, Arc::clone(&backend), store, navigator);

	gateway.login("v1")?;

	let (feed, profile, bookings) = tokio::join!(
		gateway.get("/v1/feed/"),
		gateway.get("/v1/profile/"),
		gateway.get("/v1/bookings/"),
	);

	for response in [feed?, profile?, bookings?] {
		println!("Replayed request answered: {}.", response.text());
	}

	println!(
		"Refresh exchanges: {}, callers queued: {}.",
		backend.refreshes.load(Ordering::SeqCst),
		gateway.refresh_metrics().queued(),
	);

	backend.go_offline();

	match gateway.get("/v1/feed/").await {
		Ok(_) => println!("Offline backend unexpectedly answered."),
		Err(e) => println!("Transport failure surfaced without refresh: {e}"),
	}

	backend.revoke_session();

	match gateway.get("/v1/feed/").await {
		Ok(_) => println!("Revoked session unexpectedly recovered."),
		Err(e) => println!("Refresh failure shared by the caller: {e}"),
	}

	println!("Credential after failure: {:?}.", gateway.credential()?);

	Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BackendMode {
	Online,
	Offline,
	Revoked,
}

/// Accepts exactly one token at a time and rotates to `next` on refresh.
struct InProcessBackend {
	current: Mutex<String>,
	next: String,
	mode: Mutex<BackendMode>,
	refreshes: AtomicUsize,
}
impl InProcessBackend {
	fn new(next: &str) -> Self {
		Self {
			current: Mutex::new("v0".into()),
			next: next.into(),
			mode: Mutex::new(BackendMode::Online),
			refreshes: AtomicUsize::new(0),
		}
	}

	fn go_offline(&self) {
		*self.mode.lock() = BackendMode::Offline;
	}

	fn revoke_session(&self) {
		*self.mode.lock() = BackendMode::Revoked;
	}
}
impl GatewayHttpClient for InProcessBackend {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			let mode = *self.mode.lock();

			if mode == BackendMode::Offline {
				*self.mode.lock() = BackendMode::Online;

				return Err(TransportError::Io(io::Error::new(
					io::ErrorKind::ConnectionReset,
					"backend connection reset",
				)));
			}
			if request.url.path().ends_with("/auth/token/refresh/") {
				if mode == BackendMode::Revoked {
					return Ok(HttpResponse::new(401, "{\"detail\":\"Token is blacklisted\"}"));
				}

				self.refreshes.fetch_add(1, Ordering::SeqCst);
				*self.current.lock() = self.next.clone();

				return Ok(HttpResponse::new(200, format!("{{\"access\":\"{}\"}}", self.next)));
			}

			let current = self.current.lock().clone();

			if mode == BackendMode::Revoked || request.bearer() != Some(current.as_str()) {
				return Ok(HttpResponse::new(401, "{\"code\":\"token_not_valid\"}"));
			}

			Ok(HttpResponse::new(200, format!("{{\"path\":\"{}\"}}", request.url.path())))
		})
	}
}
