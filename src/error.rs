//! Crate-level error types plus the terminal outcomes surfaced by the retrying invoker.

// crates.io
use serde_json::{Value, json};
// self
use crate::{_prelude::*, resource::IdentifierError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by constructors and configuration APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Resource identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),
}

/// Validation failures raised for a [`ThrottleConfig`](crate::config::ThrottleConfig).
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// The per-minute ceiling must admit at least one call.
	#[error("The calls_per_minute limit must be positive.")]
	ZeroCallsPerMinute,
	/// The burst ceiling must admit at least one call.
	#[error("The burst_size limit must be positive.")]
	ZeroBurstSize,
	/// A sliding window length was zero or negative.
	#[error("The {window} window must be positive.")]
	NonPositiveWindow {
		/// Which window failed validation.
		window: &'static str,
	},
	/// The burst window must nest strictly inside the main window.
	#[error("The burst window ({burst}) must be shorter than the main window ({window}).")]
	BurstWindowNotNested {
		/// Configured burst window.
		burst: Duration,
		/// Configured main window.
		window: Duration,
	},
	/// A duration that callers may wait on was negative.
	#[error("The {field} duration must not be negative.")]
	NegativeDuration {
		/// Which setting failed validation.
		field: &'static str,
	},
}

/// Stable labels for each [`CallError`] variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallErrorKind {
	/// The gate refused admission within the acquire timeout.
	RateLimitExceeded,
	/// The operation raised a fatal failure, or a transient one on its last attempt.
	ExecutionFailed,
	/// The operation returned an error-shaped response that was not retried further.
	Reported,
	/// The attempt budget was consumed without reaching a terminal outcome.
	MaxRetriesExceeded,
}
impl CallErrorKind {
	/// Returns a stable label suitable for payloads, span fields, and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallErrorKind::RateLimitExceeded => "rate_limit_exceeded",
			CallErrorKind::ExecutionFailed => "execution_failed",
			CallErrorKind::Reported => "reported",
			CallErrorKind::MaxRetriesExceeded => "max_retries_exceeded",
		}
	}
}
impl Display for CallErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Terminal failure returned by [`RetryingInvoker`](crate::invoke::RetryingInvoker).
///
/// `R` is the operation's response type; [`CallError::Reported`] hands the callee's own
/// error-shaped response back unchanged.
#[derive(Debug, ThisError)]
pub enum CallError<R> {
	/// Admission was refused because waiting longer would exceed the acquire timeout.
	#[error("Rate limit timeout after {timeout}.")]
	RateLimitExceeded {
		/// Acquire timeout that was exhausted.
		timeout: Duration,
	},
	/// The operation raised a failure that was fatal or out of retries.
	#[error("Operation failed: {message}.")]
	ExecutionFailed {
		/// Text of the raised failure.
		message: String,
	},
	/// The operation reported an error through its return value.
	#[error("Operation reported an error: {message}.")]
	Reported {
		/// Text of the embedded error.
		message: String,
		/// Response exactly as the operation returned it.
		response: R,
	},
	/// Every attempt fell through without a terminal outcome.
	#[error("Failed after {attempts} attempts.")]
	MaxRetriesExceeded {
		/// Attempt budget that was consumed.
		attempts: u32,
	},
}
impl<R> CallError<R> {
	/// Returns the stable kind label for this failure.
	pub const fn kind(&self) -> CallErrorKind {
		match self {
			CallError::RateLimitExceeded { .. } => CallErrorKind::RateLimitExceeded,
			CallError::ExecutionFailed { .. } => CallErrorKind::ExecutionFailed,
			CallError::Reported { .. } => CallErrorKind::Reported,
			CallError::MaxRetriesExceeded { .. } => CallErrorKind::MaxRetriesExceeded,
		}
	}

	/// Returns the callee's response when the failure was reported through a return value.
	pub fn into_response(self) -> Option<R> {
		match self {
			CallError::Reported { response, .. } => Some(response),
			_ => None,
		}
	}

	/// Renders the failure as a `{"error": <kind>, "message": <text>}` payload.
	///
	/// Reported failures pass the callee's response through untouched when it serializes to
	/// a JSON object.
	pub fn to_payload(&self) -> Value
	where
		R: Serialize,
	{
		let message = match self {
			CallError::RateLimitExceeded { timeout } =>
				format!("Rate limit timeout after {:.0} seconds", timeout.as_seconds_f64()),
			CallError::ExecutionFailed { message } => message.clone(),
			CallError::Reported { message, response } => {
				if let Ok(value @ Value::Object(_)) = serde_json::to_value(response) {
					return value;
				}

				message.clone()
			},
			CallError::MaxRetriesExceeded { attempts } =>
				format!("Failed after {attempts} attempts"),
		};

		json!({ "error": self.kind().as_str(), "message": message })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn payload_uses_stable_kind_labels() {
		let err = CallError::<()>::RateLimitExceeded { timeout: Duration::seconds(30) };

		assert_eq!(
			err.to_payload(),
			json!({
				"error": "rate_limit_exceeded",
				"message": "Rate limit timeout after 30 seconds",
			})
		);

		let err = CallError::<()>::MaxRetriesExceeded { attempts: 3 };

		assert_eq!(err.to_payload()["error"], "max_retries_exceeded");
		assert_eq!(err.to_payload()["message"], "Failed after 3 attempts");
	}

	#[test]
	fn reported_payload_passes_response_through() {
		let response = json!({ "error": "invalid_argument", "detail": { "field": "prompt" } });
		let err = CallError::Reported { message: "invalid_argument".into(), response };

		assert_eq!(err.kind(), CallErrorKind::Reported);
		assert_eq!(err.to_payload()["detail"]["field"], "prompt");
		assert_eq!(
			err.into_response().map(|value| value["error"].clone()),
			Some(json!("invalid_argument"))
		);
	}

	#[test]
	fn kind_serializes_as_snake_case() {
		let value = serde_json::to_value(CallErrorKind::ExecutionFailed)
			.expect("Kind should serialize to JSON.");

		assert_eq!(value, json!("execution_failed"));
	}
}
