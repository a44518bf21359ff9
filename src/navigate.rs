//! Navigation collaborator invoked when a session cannot be recovered.

// self
use crate::_prelude::*;

/// Receives the login path after a terminal refresh failure.
///
/// The gateway calls [`Navigator::navigate_to`] exactly once per failed refresh, after the
/// stored credential has been cleared and every queued caller has been rejected. Any
/// `Fn(&str) + Send + Sync` closure implements the trait.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Navigates to `path`.
	fn navigate_to(&self, path: &str);
}
impl<F> Navigator for F
where
	F: Fn(&str) + Send + Sync,
{
	fn navigate_to(&self, path: &str) {
		self(path)
	}
}

/// Navigator that ignores every request, for headless callers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;
impl Navigator for NoopNavigator {
	fn navigate_to(&self, _path: &str) {}
}

/// Navigator that records visited paths, for tests and callers that poll for redirects.
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator(Arc<Mutex<Vec<String>>>);
impl RecordingNavigator {
	/// Returns every path visited so far, oldest first.
	pub fn visits(&self) -> Vec<String> {
		self.0.lock().clone()
	}

	/// Removes and returns the recorded paths.
	pub fn drain(&self) -> Vec<String> {
		std::mem::take(&mut *self.0.lock())
	}
}
impl Navigator for RecordingNavigator {
	fn navigate_to(&self, path: &str) {
		self.0.lock().push(path.to_owned());
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	#[test]
	fn closures_act_as_navigators() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = calls.clone();
		let navigator: Arc<dyn Navigator> = Arc::new(move |path: &str| {
			assert_eq!(path, "/login");
			counter.fetch_add(1, Ordering::SeqCst);
		});

		navigator.navigate_to("/login");

		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn recording_navigator_drains_visits() {
		let navigator = RecordingNavigator::default();

		navigator.navigate_to("/login");

		assert_eq!(navigator.visits(), vec!["/login".to_string()]);
		assert_eq!(navigator.drain().len(), 1);
		assert!(navigator.visits().is_empty());
	}
}
