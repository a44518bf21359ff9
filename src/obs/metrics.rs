// self
use crate::obs::{GatewayOp, OpOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(op: GatewayOp, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_gateway_op_total",
			"op" => op.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}

/// Records the result of `result` as a success or failure of `op`.
pub fn record_op_result<T, E>(op: GatewayOp, result: &Result<T, E>) {
	match result {
		Ok(_) => record_op_outcome(op, OpOutcome::Success),
		Err(_) => record_op_outcome(op, OpOutcome::Failure),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_op_outcome_noop_without_metrics() {
		record_op_outcome(GatewayOp::Refresh, OpOutcome::Failure);
		record_op_result::<(), ()>(GatewayOp::Replay, &Ok(()));
	}
}
