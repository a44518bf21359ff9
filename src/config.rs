//! Gateway configuration: base address, refresh endpoint, login path, and storage key.

/// Builder API for assembling validated gateway configs.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Immutable settings shared by every request issued through a gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
	/// Base address every request path is resolved against.
	pub base_url: Url,
	/// Refresh endpoint path, relative to [`GatewayConfig::base_url`].
	#[serde(default = "GatewayConfig::default_refresh_path")]
	pub refresh_path: String,
	/// Path handed to the navigator when the session cannot be recovered.
	#[serde(default = "GatewayConfig::default_login_path")]
	pub login_path: String,
	/// Key under which the access token is persisted in the credential store.
	#[serde(default = "GatewayConfig::default_credential_key")]
	pub credential_key: String,
}
impl GatewayConfig {
	/// Default refresh endpoint path.
	pub const DEFAULT_REFRESH_PATH: &'static str = "auth/token/refresh/";
	/// Default login path used on terminal refresh failure.
	pub const DEFAULT_LOGIN_PATH: &'static str = "/login";
	/// Default credential storage key.
	pub const DEFAULT_CREDENTIAL_KEY: &'static str = "access";

	/// Creates a builder seeded with the provided base URL.
	pub fn builder(base_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(base_url)
	}

	/// Resolves `path` against the base URL.
	///
	/// Leading slashes are ignored so `"/v1/auth/me/"` and `"v1/auth/me/"` both land under
	/// the base path instead of replacing it. Absolute URLs and `..` segments that leave the
	/// base origin or path are rejected, so the credential never travels elsewhere.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let mut base = self.base_url.clone();

		if !base.path().ends_with('/') {
			let normalized = format!("{}/", base.path());

			base.set_path(&normalized);
		}

		let url = base
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })?;

		if url.origin() != base.origin() || !url.path().starts_with(base.path()) {
			return Err(ConfigError::PathOutsideBase { path: path.to_owned() });
		}

		Ok(url)
	}

	/// Resolves the refresh endpoint.
	pub fn refresh_endpoint(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.refresh_path)
	}

	fn default_refresh_path() -> String {
		Self::DEFAULT_REFRESH_PATH.into()
	}

	fn default_login_path() -> String {
		Self::DEFAULT_LOGIN_PATH.into()
	}

	fn default_credential_key() -> String {
		Self::DEFAULT_CREDENTIAL_KEY.into()
	}
}
