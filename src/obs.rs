//! Optional observability helpers for gates and invokers.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit `quota_gate.call` spans with the `resource` and
//!   `max_retries` fields plus events for admission waits, refusals, retries, and terminal
//!   failures.
//! - Enable `metrics` to increment `quota_gate_admission_total` (labeled by `resource` +
//!   `outcome`) for every admission decision and `quota_gate_call_total` for every invoker
//!   attempt/retry/success/failure.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Admission decisions observed by a gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdmissionOutcome {
	/// A timestamp was recorded and the caller may proceed.
	Admitted,
	/// The caller's timeout would be exceeded by waiting further.
	Refused,
}
impl AdmissionOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AdmissionOutcome::Admitted => "admitted",
			AdmissionOutcome::Refused => "refused",
		}
	}
}
impl Display for AdmissionOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each invoker attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// The operation is about to be invoked.
	Attempt,
	/// A transient failure scheduled another attempt.
	Retry,
	/// The operation produced a success value.
	Success,
	/// A terminal failure was returned to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Retry => "retry",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
