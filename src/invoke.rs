//! Retrying invoker that gates every attempt through an [`AdmissionGate`] and retries only
//! transient failures.
//!
//! An operation can fail in two ways: by returning `Err` (a raised failure) or by returning a
//! response that carries an error in-band (see [`Response::embedded_error`]). Both are
//! classified the same way. Transient failures back off linearly (`backoff_step`, then twice
//! that, and so on) while attempts remain; everything else ends the call. Admission timeouts
//! are terminal and never retried.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	classify::TransienceClassifier,
	config::ThrottleConfig,
	error::CallError,
	gate::AdmissionGate,
	obs::{self, CallOutcome, CallSpan},
};

/// Success values that may still report an error in-band.
pub trait Response {
	/// Returns the embedded error text when the value signals failure; `None` means success.
	fn embedded_error(&self) -> Option<String> {
		None
	}
}
/// JSON objects carrying an `error` key are treated as failures, whatever the key's value.
impl Response for Value {
	fn embedded_error(&self) -> Option<String> {
		let error = self.as_object()?.get("error")?;

		Some(match error {
			Value::String(text) => text.clone(),
			other => other.to_string(),
		})
	}
}
impl Response for String {}
impl Response for () {}

/// Per-call retry budget and timing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallOptions {
	/// Maximum number of attempts, including the first.
	pub max_retries: u32,
	/// Longest each admission may block; `None` waits indefinitely.
	pub acquire_timeout: Option<Duration>,
	/// Backoff unit; attempt `n` waits `(n + 1) * backoff_step`.
	pub backoff_step: Duration,
}
impl CallOptions {
	/// Overrides the attempt budget.
	pub fn with_max_retries(mut self, retries: u32) -> Self {
		self.max_retries = retries;

		self
	}

	/// Overrides the admission timeout.
	pub fn with_acquire_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.acquire_timeout = timeout;

		self
	}

	/// Delay slept after the failed attempt with 0-based index `attempt`.
	pub fn backoff_for(&self, attempt: u32) -> Duration {
		self.backoff_step * attempt.saturating_add(1)
	}
}
impl Default for CallOptions {
	fn default() -> Self {
		Self::from(&ThrottleConfig::default())
	}
}
impl From<&ThrottleConfig> for CallOptions {
	fn from(config: &ThrottleConfig) -> Self {
		Self {
			max_retries: config.max_retries,
			acquire_timeout: config.acquire_timeout,
			backoff_step: config.backoff_step,
		}
	}
}

/// Runs operations under a shared [`AdmissionGate`] with transient-failure retries.
#[derive(Clone, Debug)]
pub struct RetryingInvoker {
	gate: Arc<AdmissionGate>,
	options: CallOptions,
	classifier: TransienceClassifier,
}
impl RetryingInvoker {
	/// Creates an invoker whose defaults come from the gate's configuration.
	pub fn new(gate: Arc<AdmissionGate>) -> Self {
		let options = CallOptions::from(gate.config());

		Self { gate, options, classifier: TransienceClassifier::default() }
	}

	/// Replaces the transience classifier.
	pub fn with_classifier(mut self, classifier: TransienceClassifier) -> Self {
		self.classifier = classifier;

		self
	}

	/// Replaces the default per-call options.
	pub fn with_options(mut self, options: CallOptions) -> Self {
		self.options = options;

		self
	}

	/// Returns the gate every attempt is admitted through.
	pub fn gate(&self) -> &Arc<AdmissionGate> {
		&self.gate
	}

	/// Returns the default per-call options.
	pub fn options(&self) -> &CallOptions {
		&self.options
	}

	/// Runs `operation` with the invoker's default options.
	pub fn call<R, E, F>(&self, operation: F) -> Result<R, CallError<R>>
	where
		R: Response,
		E: Display,
		F: FnMut() -> Result<R, E>,
	{
		self.call_with(&self.options, operation)
	}

	/// Runs `operation` with explicit options.
	///
	/// Returns the first success value, or the terminal [`CallError`] describing why the call
	/// stopped. A budget of zero attempts never invokes the operation and yields
	/// [`CallError::MaxRetriesExceeded`].
	pub fn call_with<R, E, F>(
		&self,
		options: &CallOptions,
		mut operation: F,
	) -> Result<R, CallError<R>>
	where
		R: Response,
		E: Display,
		F: FnMut() -> Result<R, E>,
	{
		let _span = CallSpan::new(self.gate.resource(), options.max_retries).entered();

		for attempt in 0..options.max_retries {
			if !self.gate.acquire(options.acquire_timeout) {
				let timeout = options.acquire_timeout.unwrap_or(Duration::MAX);

				return self.fail(attempt, CallError::RateLimitExceeded { timeout });
			}

			obs::record_call_outcome(self.gate.resource(), CallOutcome::Attempt);

			let retries_left = attempt + 1 < options.max_retries;
			let failure = match operation() {
				Ok(response) => match response.embedded_error() {
					None => {
						obs::record_call_outcome(self.gate.resource(), CallOutcome::Success);

						return Ok(response);
					},
					Some(message) => CallError::Reported { message, response },
				},
				Err(err) => CallError::ExecutionFailed { message: err.to_string() },
			};
			let message = match &failure {
				CallError::Reported { message, .. } | CallError::ExecutionFailed { message } =>
					message.as_str(),
				_ => "",
			};

			if retries_left && self.classifier.classify_text(message).is_transient() {
				self.back_off(options, attempt, message);

				continue;
			}

			return self.fail(attempt, failure);
		}

		self.fail(options.max_retries, CallError::MaxRetriesExceeded {
			attempts: options.max_retries,
		})
	}

	fn back_off(&self, options: &CallOptions, attempt: u32, message: &str) {
		let delay = options.backoff_for(attempt);

		obs::log_retry(attempt, options.max_retries, delay, message);
		obs::record_call_outcome(self.gate.resource(), CallOutcome::Retry);
		self.gate.clock().sleep(delay);
	}

	fn fail<R>(&self, attempt: u32, err: CallError<R>) -> Result<R, CallError<R>> {
		obs::log_call_failed(err.kind(), attempt, &err.to_string());
		obs::record_call_outcome(self.gate.resource(), CallOutcome::Failure);

		Err(err)
	}
}
