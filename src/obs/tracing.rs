//! `callgate.op` spans and the log events emitted around gate operations.
//!
//! Every span carries `op` and `stage`; spans opened by the interceptor also carry the called
//! `method`. Nothing here ever records a token, password, or digest.

// self
use crate::{_prelude::*, interceptor::Code, obs::Op, store::StoreError};

/// Future returned by [`OpSpan::instrument`]; a plain passthrough when tracing is compiled out.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`OpSpan::instrument`]; a plain passthrough when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// Span around one gate operation.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Opens a `callgate.op` span for `op` at `stage`; `method` stays empty until recorded.
	pub fn new(op: Op, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"callgate.op",
				op = op.as_str(),
				stage,
				method = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Tags the span with the fully qualified method of the call being gated.
	pub fn with_method(self, method: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			self.span.record("method", method);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = method;
		}

		self
	}

	/// Enters the span until the returned guard drops. Synchronous sections only.
	pub fn entered(self) -> OpSpanGuard {
		#[cfg(feature = "tracing")]
		{
			OpSpanGuard { _entered: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			OpSpanGuard {}
		}
	}

	/// Attaches the span to `fut`, so blob writes stay attributed across `.await` points.
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

/// Keeps an [`OpSpan`] entered; see [`OpSpan::entered`].
pub struct OpSpanGuard {
	#[cfg(feature = "tracing")]
	_entered: tracing::span::EnteredSpan,
}
impl Debug for OpSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("OpSpanGuard(..)")
	}
}

/// Logs a call the interceptor refused. Only the method and the status code are recorded.
pub fn log_call_rejected(method: &str, code: Code) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(method, code = code.as_str(), "call rejected");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (method, code);
	}
}

/// Logs a token presented on an unprotected method that failed verification and was ignored.
pub fn log_unverified_identity_ignored(method: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(method, "ignoring unverifiable token on unprotected method");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = method;
	}
}

/// Logs a store failure surfaced to a caller.
pub fn log_store_failure(op: Op, error: &StoreError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(op = op.as_str(), %error, "store operation failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (op, error);
	}
}

/// Logs an unexpected internal failure (signing, hashing). The message is operator-facing.
pub fn log_internal_failure(op: Op, message: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(op = op.as_str(), detail = message, "internal failure");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (op, message);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn op_span_guard_exists_with_or_without_tracing() {
		let _guard = OpSpan::new(Op::Authorize, "test")
			.with_method("/catalog.LaptopService/CreateLaptop")
			.entered();

		log_call_rejected("/catalog.LaptopService/CreateLaptop", Code::PermissionDenied);
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OpSpan::new(Op::Login, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
