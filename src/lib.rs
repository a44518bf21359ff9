//! Bearer-token request gateway: attach credentials, recover from expiry with a single-flight
//! refresh, and queue concurrent callers in FIFO order while the refresh is in flight.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod navigate;
pub mod obs;
pub mod refresh;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::GatewayConfig,
		gateway::{Gateway, ReqwestGateway},
		http::ReqwestHttpClient,
		navigate::{Navigator, RecordingNavigator},
		store::{CredentialStore, MemoryStore},
	};

	/// Builds a config rooted at `base_url`, panicking on invalid fixtures.
	pub fn test_config(base_url: &str) -> GatewayConfig {
		GatewayConfig::builder(Url::parse(base_url).expect("Failed to parse test base URL."))
			.build()
			.expect("Failed to build test gateway config.")
	}

	/// Builds a cookie-enabled reqwest client for tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		ReqwestHttpClient::new().expect("Failed to build Reqwest client for tests.")
	}

	/// Constructs a reqwest-backed [`Gateway`] with an in-memory store and a recording
	/// navigator, returning both collaborators for inspection.
	pub fn build_reqwest_test_gateway(
		base_url: &str,
	) -> (ReqwestGateway, Arc<MemoryStore>, RecordingNavigator) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let navigator = RecordingNavigator::default();
		let shared_navigator: Arc<dyn Navigator> = Arc::new(navigator.clone());
		let gateway = Gateway::with_http_client(
			test_config(base_url),
			test_reqwest_http_client(),
			store,
			shared_navigator,
		);

		(gateway, store_backend, navigator)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
