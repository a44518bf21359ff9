//! Caller-owned cancellation for individual requests.

// std
use std::pin::pin;
// crates.io
use futures::{
	FutureExt,
	channel::oneshot,
	future::{self, Either, Shared},
};
// self
use crate::_prelude::*;

/// Fires the paired [`AbortSignal`].
///
/// Dropping the controller without calling [`AbortController::abort`] leaves the signal
/// permanently unfired.
#[derive(Debug)]
pub struct AbortController {
	tx: Mutex<Option<oneshot::Sender<()>>>,
	signal: AbortSignal,
}
impl AbortController {
	/// Creates a controller with a fresh, unfired signal.
	pub fn new() -> Self {
		let (tx, rx) = oneshot::channel();

		Self { tx: Mutex::new(Some(tx)), signal: AbortSignal(rx.shared()) }
	}

	/// Returns a signal to hand to [`RequestOptions::with_abort`].
	///
	/// [`RequestOptions::with_abort`]: crate::gateway::RequestOptions::with_abort
	pub fn signal(&self) -> AbortSignal {
		self.signal.clone()
	}

	/// Fires the signal. Later calls are no-ops.
	pub fn abort(&self) {
		if let Some(tx) = self.tx.lock().take() {
			let _ = tx.send(());
		}
	}
}
impl Default for AbortController {
	fn default() -> Self {
		Self::new()
	}
}

/// Cloneable view of an [`AbortController`].
///
/// The gateway races the caller's own network calls and its wait behind an in-flight refresh
/// against the signal. The refresh exchange itself is shared with other callers and is never
/// cut short by one caller's signal.
#[derive(Clone)]
pub struct AbortSignal(Shared<oneshot::Receiver<()>>);
impl AbortSignal {
	/// Reports whether the controller has fired.
	pub fn is_aborted(&self) -> bool {
		matches!(self.0.clone().now_or_never(), Some(Ok(())))
	}

	/// Resolves once the controller fires; never resolves if it is dropped unfired.
	pub async fn aborted(&self) {
		if self.0.clone().await.is_err() {
			future::pending::<()>().await;
		}
	}

	/// Runs `fut` unless the signal fires first.
	pub(crate) async fn guard<F, T>(&self, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		if self.is_aborted() {
			return Err(Error::Aborted);
		}

		let op = pin!(fut);
		let abort = pin!(self.aborted());

		match future::select(op, abort).await {
			Either::Left((output, _)) => output,
			Either::Right(((), _)) => Err(Error::Aborted),
		}
	}
}
impl Debug for AbortSignal {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AbortSignal").field("aborted", &self.is_aborted()).finish()
	}
}

/// Runs `fut`, racing it against `signal` when one is supplied.
pub(crate) async fn abortable<F, T>(signal: Option<&AbortSignal>, fut: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	match signal {
		Some(signal) => signal.guard(fut).await,
		None => fut.await,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn abort_fires_every_clone() {
		let controller = AbortController::new();
		let signal = controller.signal();
		let clone = signal.clone();

		assert!(!signal.is_aborted());

		controller.abort();
		controller.abort();

		assert!(signal.is_aborted());
		assert!(clone.is_aborted());
	}

	#[test]
	fn dropped_controller_never_fires() {
		let signal = AbortController::new().signal();

		assert!(!signal.is_aborted());
		assert!(signal.aborted().now_or_never().is_none());
	}

	#[test]
	fn guard_short_circuits_after_abort() {
		let controller = AbortController::new();
		let signal = controller.signal();

		controller.abort();

		let result = signal
			.guard(async { Ok::<_, Error>(7) })
			.now_or_never()
			.expect("Guard should resolve immediately once aborted.");

		assert!(matches!(result, Err(Error::Aborted)));
	}

	#[test]
	fn guard_passes_through_without_abort() {
		let controller = AbortController::new();
		let output = abortable(Some(&controller.signal()), async { Ok::<_, Error>(7) })
			.now_or_never()
			.expect("Ready futures should resolve immediately.")
			.expect("Unfired signals should not abort.");

		assert_eq!(output, 7);
	}
}
