// self
use crate::{_prelude::*, error::CallErrorKind, resource::ResourceId};

/// A span wrapping one invoker call, including every attempt and backoff inside it.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the throttled resource and attempt budget.
	pub fn new(resource: &ResourceId, max_retries: u32) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"quota_gate.call",
				resource = %resource,
				max_retries
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (resource, max_retries);

			Self {}
		}
	}

	/// Enters the span until the returned guard drops.
	pub fn entered(self) -> CallSpanGuard {
		#[cfg(feature = "tracing")]
		{
			CallSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			CallSpanGuard {}
		}
	}
}

/// RAII guard returned by [`CallSpan::entered`].
pub struct CallSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for CallSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("CallSpanGuard(..)")
	}
}

/// Logs that a caller is about to sleep because a window is saturated.
pub fn log_admission_wait(resource: &ResourceId, wait: Duration, in_window: usize) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			resource = %resource,
			wait_ms = wait.whole_milliseconds() as u64,
			in_window,
			"Rate limit reached; waiting for a slot."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (resource, wait, in_window);
	}
}

/// Logs that a caller gave up because the next wait would overrun its timeout.
pub fn log_admission_refused(resource: &ResourceId, elapsed: Duration, timeout: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			resource = %resource,
			elapsed_ms = elapsed.whole_milliseconds() as u64,
			timeout_ms = timeout.whole_milliseconds() as u64,
			"Admission refused; waiting would exceed the timeout."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (resource, elapsed, timeout);
	}
}

/// Logs a transient failure that will be retried after `backoff`.
pub fn log_retry(attempt: u32, max_retries: u32, backoff: Duration, message: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			attempt = attempt + 1,
			max_retries,
			backoff_ms = backoff.whole_milliseconds() as u64,
			error = message,
			"Transient failure; retrying."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (attempt, max_retries, backoff, message);
	}
}

/// Logs the terminal failure handed back to the caller.
pub fn log_call_failed(kind: CallErrorKind, attempt: u32, message: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(kind = kind.as_str(), attempt = attempt + 1, error = message, "Call failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, attempt, message);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn call_span_enters_with_or_without_tracing() {
		let resource = ResourceId::unnamed();
		let guard = CallSpan::new(&resource, 3).entered();

		log_admission_wait(&resource, Duration::milliseconds(10), 5);
		log_retry(0, 3, Duration::seconds(2), "503 Service Unavailable");
		log_call_failed(CallErrorKind::ExecutionFailed, 2, "invalid_argument");

		assert_eq!(format!("{guard:?}"), "CallSpanGuard(..)");
	}
}
