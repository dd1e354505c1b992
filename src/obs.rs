//! Optional observability helpers for gate operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit structured spans named `callgate.op` with the `op` and
//!   `stage` fields, plus `debug`/`warn` events for rejected calls and store failures. Events
//!   never carry tokens, passwords, or hashes.
//! - Enable `metrics` to increment the `callgate_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
	/// Credential check and token issuance.
	Login,
	/// Credential registration.
	Register,
	/// Per-call access check performed by the interceptor.
	Authorize,
	/// Durable blob write.
	BlobSave,
	/// Rating contribution.
	RatingContribute,
}
impl Op {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Op::Login => "login",
			Op::Register => "register",
			Op::Authorize => "authorize",
			Op::BlobSave => "blob_save",
			Op::RatingContribute => "rating_contribute",
		}
	}
}
impl Display for Op {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure or rejection returned to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
