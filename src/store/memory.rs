//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{CredentialStore, StoreError},
};

/// Thread-safe storage backend that keeps values in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<HashMap<String, String>>>);
impl MemoryStore {
	/// Creates a store pre-populated with a single entry.
	pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
		let store = Self::default();

		store.0.write().insert(key.into(), value.into());

		store
	}

	/// Returns the number of stored entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Reports whether the store holds no entries.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl CredentialStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.0.read().get(key).cloned())
	}

	fn set(&self, key: &str, value: Option<&str>) -> Result<(), StoreError> {
		let mut guard = self.0.write();

		match value {
			Some(value) => {
				guard.insert(key.to_owned(), value.to_owned());
			},
			None => {
				guard.remove(key);
			},
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn set_none_removes_entry() {
		let store = MemoryStore::with_entry("access", "token-1");

		assert_eq!(store.get("access").expect("Read should succeed."), Some("token-1".into()));

		store.set("access", None).expect("Clearing should succeed.");

		assert_eq!(store.get("access").expect("Read should succeed."), None);
		assert!(store.is_empty());
	}
}
