//! Builder and validation errors for [`GatewayConfig`].

// self
use crate::{_prelude::*, config::GatewayConfig};

/// Errors raised while constructing or validating a [`GatewayConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum GatewayConfigError {
	/// Base URL must use HTTP or HTTPS.
	#[error("The base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL cannot carry relative paths (e.g. `mailto:` or `data:` URLs).
	#[error("The base URL cannot be used as a base: {url}.")]
	OpaqueBaseUrl {
		/// Base URL that failed validation.
		url: String,
	},
	/// A required path or key was blank.
	#[error("The {field} must not be empty.")]
	Empty {
		/// Which field failed validation.
		field: &'static str,
	},
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	/// Base address every request path is resolved against.
	pub base_url: Url,
	/// Refresh endpoint path.
	pub refresh_path: String,
	/// Login path handed to the navigator.
	pub login_path: String,
	/// Credential storage key.
	pub credential_key: String,
}
impl GatewayConfigBuilder {
	/// Creates a new builder seeded with the provided base URL and default paths.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_path: GatewayConfig::DEFAULT_REFRESH_PATH.into(),
			login_path: GatewayConfig::DEFAULT_LOGIN_PATH.into(),
			credential_key: GatewayConfig::DEFAULT_CREDENTIAL_KEY.into(),
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the login path used on terminal refresh failure.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the credential storage key.
	pub fn credential_key(mut self, key: impl Into<String>) -> Self {
		self.credential_key = key.into();

		self
	}

	/// Validates the collected settings and returns a [`GatewayConfig`].
	pub fn build(self) -> Result<GatewayConfig, GatewayConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(GatewayConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if self.base_url.cannot_be_a_base() {
			return Err(GatewayConfigError::OpaqueBaseUrl { url: self.base_url.to_string() });
		}

		let refresh_path = self.refresh_path.trim().to_owned();
		let login_path = self.login_path.trim().to_owned();
		let credential_key = self.credential_key.trim().to_owned();

		for (field, value) in [
			("refresh path", &refresh_path),
			("login path", &login_path),
			("credential key", &credential_key),
		] {
			if value.is_empty() {
				return Err(GatewayConfigError::Empty { field });
			}
		}

		let mut base_url = self.base_url;

		if !base_url.path().ends_with('/') {
			let normalized = format!("{}/", base_url.path());

			base_url.set_path(&normalized);
		}

		Ok(GatewayConfig { base_url, refresh_path, login_path, credential_key })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("Fixture URL should parse.")
	}

	#[test]
	fn build_rejects_non_http_schemes() {
		let err = GatewayConfig::builder(url("ftp://files.example.com/"))
			.build()
			.expect_err("FTP bases should be rejected.");

		assert!(matches!(err, GatewayConfigError::UnsupportedScheme { .. }));
	}

	#[test]
	fn build_rejects_blank_fields() {
		let err = GatewayConfig::builder(url("https://api.example.com/"))
			.login_path("   ")
			.build()
			.expect_err("Blank login paths should be rejected.");

		assert_eq!(err, GatewayConfigError::Empty { field: "login path" });
	}

	#[test]
	fn build_trims_and_normalizes() {
		let config = GatewayConfig::builder(url("https://api.example.com/api"))
			.refresh_path(" auth/jwt/refresh/ ")
			.credential_key("session")
			.build()
			.expect("Valid overrides should build.");

		assert_eq!(config.base_url.as_str(), "https://api.example.com/api/");
		assert_eq!(config.refresh_path, "auth/jwt/refresh/");
		assert_eq!(config.credential_key, "session");
		assert_eq!(config.login_path, GatewayConfig::DEFAULT_LOGIN_PATH);
	}
}
