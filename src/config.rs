//! Throttle and retry settings shared by a gate and the invokers layered on top of it.

// self
use crate::{_prelude::*, error::ConfigError};

/// Limits and retry budget for a single throttled resource.
///
/// Every field is optional when deserializing; durations are expressed as floating-point
/// seconds and `acquire_timeout = null` waits indefinitely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
	/// Maximum admissions within the main sliding window.
	pub calls_per_minute: u32,
	/// Maximum admissions within the burst sub-window.
	pub burst_size: u32,
	/// Attempt budget per invoker call.
	pub max_retries: u32,
	/// Longest a single admission may block; `None` waits indefinitely.
	#[serde(with = "opt_seconds")]
	pub acquire_timeout: Option<Duration>,
	/// Length of the main sliding window.
	#[serde(with = "seconds")]
	pub window: Duration,
	/// Length of the burst sub-window.
	#[serde(with = "seconds")]
	pub burst_window: Duration,
	/// Backoff unit; attempt `n` waits `(n + 1) * backoff_step` before the next one.
	#[serde(with = "seconds")]
	pub backoff_step: Duration,
}
impl ThrottleConfig {
	/// Default per-minute ceiling.
	pub const DEFAULT_CALLS_PER_MINUTE: u32 = 15;
	/// Default burst ceiling.
	pub const DEFAULT_BURST_SIZE: u32 = 5;
	/// Default attempt budget.
	pub const DEFAULT_MAX_RETRIES: u32 = 3;
	/// Default admission timeout.
	pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::seconds(30);
	/// Default main window.
	pub const DEFAULT_WINDOW: Duration = Duration::seconds(60);
	/// Default burst window.
	pub const DEFAULT_BURST_WINDOW: Duration = Duration::seconds(10);
	/// Default backoff unit.
	pub const DEFAULT_BACKOFF_STEP: Duration = Duration::seconds(2);

	/// Overrides the per-minute ceiling.
	pub fn with_calls_per_minute(mut self, calls: u32) -> Self {
		self.calls_per_minute = calls;

		self
	}

	/// Overrides the burst ceiling.
	pub fn with_burst_size(mut self, burst: u32) -> Self {
		self.burst_size = burst;

		self
	}

	/// Overrides the attempt budget.
	pub fn with_max_retries(mut self, retries: u32) -> Self {
		self.max_retries = retries;

		self
	}

	/// Overrides the admission timeout (`None` waits indefinitely).
	pub fn with_acquire_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.acquire_timeout = timeout;

		self
	}

	/// Overrides both sliding windows.
	pub fn with_windows(mut self, window: Duration, burst_window: Duration) -> Self {
		self.window = window;
		self.burst_window = burst_window;

		self
	}

	/// Overrides the backoff unit.
	pub fn with_backoff_step(mut self, step: Duration) -> Self {
		self.backoff_step = step;

		self
	}

	/// Checks that the limits describe an admissible, properly nested pair of windows.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.calls_per_minute == 0 {
			return Err(ConfigError::ZeroCallsPerMinute);
		}
		if self.burst_size == 0 {
			return Err(ConfigError::ZeroBurstSize);
		}
		if !self.window.is_positive() {
			return Err(ConfigError::NonPositiveWindow { window: "main" });
		}
		if !self.burst_window.is_positive() {
			return Err(ConfigError::NonPositiveWindow { window: "burst" });
		}
		if self.burst_window >= self.window {
			return Err(ConfigError::BurstWindowNotNested {
				burst: self.burst_window,
				window: self.window,
			});
		}
		if self.acquire_timeout.is_some_and(|timeout| timeout.is_negative()) {
			return Err(ConfigError::NegativeDuration { field: "acquire_timeout" });
		}
		if self.backoff_step.is_negative() {
			return Err(ConfigError::NegativeDuration { field: "backoff_step" });
		}

		Ok(())
	}
}
impl Default for ThrottleConfig {
	fn default() -> Self {
		Self {
			calls_per_minute: Self::DEFAULT_CALLS_PER_MINUTE,
			burst_size: Self::DEFAULT_BURST_SIZE,
			max_retries: Self::DEFAULT_MAX_RETRIES,
			acquire_timeout: Some(Self::DEFAULT_ACQUIRE_TIMEOUT),
			window: Self::DEFAULT_WINDOW,
			burst_window: Self::DEFAULT_BURST_WINDOW,
			backoff_step: Self::DEFAULT_BACKOFF_STEP,
		}
	}
}

mod seconds {
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer};
	use time::Duration;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_f64(value.as_seconds_f64())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let secs = f64::deserialize(deserializer)?;

		Duration::checked_seconds_f64(secs).ok_or_else(|| {
			serde::de::Error::custom("duration is not a representable number of seconds")
		})
	}
}

mod opt_seconds {
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer};
	use time::Duration;

	pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(duration) => serializer.serialize_some(&duration.as_seconds_f64()),
			None => serializer.serialize_none(),
		}
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
	where
		D: Deserializer<'de>,
	{
		<Option<f64>>::deserialize(deserializer)?
			.map(|secs| {
				Duration::checked_seconds_f64(secs).ok_or_else(|| {
					serde::de::Error::custom("duration is not a representable number of seconds")
				})
			})
			.transpose()
	}
}
