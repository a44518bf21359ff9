//! Redacted access token wrapper.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Short-lived bearer credential that keeps its value out of logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessToken(String);
impl AccessToken {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Formats the value for an `Authorization` header.
	pub fn bearer_header(&self) -> String {
		format!("Bearer {}", self.0)
	}

	/// Reads the `exp` claim when the token is a JWT.
	///
	/// The signature is not verified; the value is only a hint for callers that want to log
	/// or display the remaining lifetime. Opaque tokens return `None`.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		#[derive(Deserialize)]
		struct Claims {
			exp: i64,
		}

		let payload = self.0.split('.').nth(1)?;
		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
		let claims = serde_json::from_slice::<Claims>(&bytes).ok()?;

		OffsetDateTime::from_unix_timestamp(claims.exp).ok()
	}
}
impl From<String> for AccessToken {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for AccessToken {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl AsRef<str> for AccessToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AccessToken").field(&"<redacted>").finish()
	}
}
impl Display for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_formatters_redact() {
		let token = AccessToken::new("super-secret");

		assert_eq!(format!("{token:?}"), "AccessToken(\"<redacted>\")");
		assert_eq!(format!("{token}"), "<redacted>");
		assert_eq!(token.bearer_header(), "Bearer super-secret");
	}

	#[test]
	fn expires_at_reads_jwt_exp_claim() {
		let payload = URL_SAFE_NO_PAD.encode("{\"exp\":1767225600,\"user_id\":42}");
		let token = AccessToken::new(format!("eyJhbGciOiJIUzI1NiJ9.{payload}.signature"));

		assert_eq!(token.expires_at(), Some(time::macros::datetime!(2026-01-01 0:00 UTC)));
		assert_eq!(AccessToken::new("opaque-token").expires_at(), None);
	}
}
