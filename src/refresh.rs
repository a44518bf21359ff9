//! Single-flight credential refresh with FIFO queuing of suspended callers.
//!
//! [`RefreshCoordinator`] owns the two pieces of shared state the recovery protocol needs:
//! the "refresh in progress" flag and the queue of callers waiting for its result. A caller
//! that hits an expired credential calls [`RefreshCoordinator::enter`]; the first one becomes
//! the leader and receives a [`RefreshLease`], everyone arriving while the lease is alive
//! receives a [`PendingRefresh`] and suspends on it. Settling the lease clears the flag and
//! releases the queue front to back in one critical section, so no waiter can slip in after
//! the drain and be forgotten. A lease dropped without being settled (leader cancelled or
//! panicked) settles itself with [`RefreshError::Interrupted`].

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use futures::channel::oneshot;
// self
use crate::{_prelude::*, auth::AccessToken, error::RefreshError};

/// Result broadcast to every caller released by a refresh.
pub type RefreshOutcome = Result<AccessToken, Arc<RefreshError>>;

/// Registration-order identifier of a queued caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaiterId(u64);
impl WaiterId {
	/// Returns the raw sequence number.
	pub const fn get(self) -> u64 {
		self.0
	}
}
impl Display for WaiterId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "waiter-{}", self.0)
	}
}

/// Instance-owned refresh state shared by every request of a gateway.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
	state: Mutex<RefreshState>,
	metrics: RefreshMetrics,
}
impl RefreshCoordinator {
	/// Creates an idle coordinator.
	pub fn new() -> Self {
		Self::default()
	}

	/// Reports whether a refresh exchange is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.state.lock().in_progress
	}

	/// Returns the number of callers currently suspended behind the in-flight refresh.
	pub fn pending(&self) -> usize {
		self.state.lock().waiters.len()
	}

	/// Reports whether a replay with a recovered credential was rejected again.
	///
	/// The mark stays set until the next refresh settles, a credential is stored or cleared,
	/// or a credentialed request succeeds.
	pub fn is_expired(&self) -> bool {
		self.state.lock().expired
	}

	/// Returns the protocol counters.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Joins the in-flight refresh, or takes leadership when none is running.
	pub fn enter(&self) -> RefreshTicket<'_> {
		let mut state = self.state.lock();

		if state.in_progress {
			let (tx, rx) = oneshot::channel();
			let id = WaiterId(state.next_waiter);

			state.next_waiter += 1;
			state.waiters.push_back(Waiter { id, tx });
			self.metrics.record_queued();

			RefreshTicket::Waiter(PendingRefresh { id, rx })
		} else {
			state.in_progress = true;

			RefreshTicket::Leader(RefreshLease { coordinator: self, settled: false })
		}
	}

	pub(crate) fn mark_expired(&self) {
		self.state.lock().expired = true;
	}

	pub(crate) fn clear_expired(&self) {
		self.state.lock().expired = false;
	}

	fn settle(&self, outcome: RefreshOutcome) -> Vec<WaiterId> {
		let waiters = {
			let mut state = self.state.lock();

			state.in_progress = false;
			state.expired = false;

			std::mem::take(&mut state.waiters)
		};

		// A waiter whose caller gave up has dropped its receiver; the send is simply lost.
		waiters
			.into_iter()
			.map(|waiter| {
				let _ = waiter.tx.send(outcome.clone());

				waiter.id
			})
			.collect()
	}
}

/// Role assigned by [`RefreshCoordinator::enter`].
#[derive(Debug)]
pub enum RefreshTicket<'a> {
	/// Caller must perform the refresh exchange and settle the lease.
	Leader(RefreshLease<'a>),
	/// Caller must wait for the leader's outcome.
	Waiter(PendingRefresh),
}

/// Leadership over the in-flight refresh.
#[must_use = "dropping the lease interrupts every queued caller"]
#[derive(Debug)]
pub struct RefreshLease<'a> {
	coordinator: &'a RefreshCoordinator,
	settled: bool,
}
impl RefreshLease<'_> {
	/// Publishes the exchange outcome, releasing queued callers in registration order.
	///
	/// Returns the released waiter ids in the order they were resolved.
	pub fn complete(mut self, outcome: RefreshOutcome) -> Vec<WaiterId> {
		match &outcome {
			Ok(_) => self.coordinator.metrics.record_success(),
			Err(_) => self.coordinator.metrics.record_failure(),
		}

		self.settled = true;

		self.coordinator.settle(outcome)
	}

	/// Releases the lease with a credential some other caller already refreshed, without a
	/// refresh exchange.
	pub fn hand_over(mut self, token: AccessToken) -> Vec<WaiterId> {
		self.coordinator.metrics.record_handover();

		self.settled = true;

		self.coordinator.settle(Ok(token))
	}
}
impl Drop for RefreshLease<'_> {
	fn drop(&mut self) {
		if !self.settled {
			self.coordinator.metrics.record_failure();
			self.coordinator.settle(Err(Arc::new(RefreshError::Interrupted)));
		}
	}
}

/// Suspended caller awaiting the in-flight refresh.
pub struct PendingRefresh {
	id: WaiterId,
	rx: oneshot::Receiver<RefreshOutcome>,
}
impl PendingRefresh {
	/// Returns the caller's registration-order identifier.
	pub fn id(&self) -> WaiterId {
		self.id
	}

	/// Waits for the leader to settle.
	///
	/// Dropping the returned future only withdraws this caller; the refresh and the other
	/// waiters are unaffected.
	pub async fn wait(self) -> RefreshOutcome {
		self.rx.await.unwrap_or_else(|_| Err(Arc::new(RefreshError::Interrupted)))
	}
}
impl Debug for PendingRefresh {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingRefresh").field("id", &self.id).finish()
	}
}

#[derive(Debug, Default)]
struct RefreshState {
	in_progress: bool,
	expired: bool,
	next_waiter: u64,
	waiters: VecDeque<Waiter>,
}

struct Waiter {
	id: WaiterId,
	tx: oneshot::Sender<RefreshOutcome>,
}
impl Debug for Waiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Waiter").field("id", &self.id).finish()
	}
}
