// self
use crate::{_prelude::*, obs::GatewayOp};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by gateway operations.
#[derive(Clone, Debug)]
pub struct GatewaySpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl GatewaySpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: GatewayOp, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("bearer_gateway.op", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event when tracing is enabled; fields are recorded with their `Debug` form.
macro_rules! debug_event {
	($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {{
		#[cfg(feature = "tracing")]
		{
			tracing::debug!($($key = ?$value,)* $msg);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = ($(&$value,)*);
		}
	}};
}
/// Emits a warning event when tracing is enabled; fields are recorded with their `Debug` form.
macro_rules! warn_event {
	($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {{
		#[cfg(feature = "tracing")]
		{
			tracing::warn!($($key = ?$value,)* $msg);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = ($(&$value,)*);
		}
	}};
}
pub(crate) use {debug_event, warn_event};

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn span_builds_without_tracing() {
		let _span = GatewaySpan::new(GatewayOp::Request, "test");
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = GatewaySpan::new(GatewayOp::Refresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
