//! Lifecycle of the gateway's credential.

// self
use crate::_prelude::*;

/// Observable lifecycle state of the stored credential.
///
/// `Anonymous → Authenticated` on login or refresh success. The first unauthorized response
/// moves to `Refreshing` while the refresh exchange is in flight, then back to
/// `Authenticated` or, when the refresh fails, to `Anonymous` until the next login. When the
/// replay is rejected even with the refreshed credential the state is `Expired` until the next
/// refresh settles, a login or logout, or a credentialed request succeeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialState {
	/// No credential is stored; requests go out unauthenticated.
	Anonymous,
	/// A credential is stored and presumed valid.
	Authenticated,
	/// The server rejected a replay that carried the refreshed credential.
	Expired,
	/// A refresh exchange is in flight.
	Refreshing,
}
impl CredentialState {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialState::Anonymous => "anonymous",
			CredentialState::Authenticated => "authenticated",
			CredentialState::Expired => "expired",
			CredentialState::Refreshing => "refreshing",
		}
	}
}
impl Display for CredentialState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
