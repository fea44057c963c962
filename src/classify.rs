//! Transient-versus-fatal classification of upstream failures.
//!
//! Classification looks only at the failure's rendered text: a case-insensitive substring match
//! against markers for rate limiting (`429`, `rate_limit`, `resource_exhausted`) and server-side
//! faults (`500`, `502`, `503`, `504`, `server error`). Anything else is fatal.

// self
use crate::_prelude::*;

/// Markers that flag a failure as transient.
pub const DEFAULT_TRANSIENT_MARKERS: [&str; 8] =
	["429", "rate_limit", "resource_exhausted", "500", "502", "503", "504", "server error"];

/// Verdict produced by a [`TransienceClassifier`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transience {
	/// Expected to clear with time; worth retrying.
	Transient,
	/// Permanent; fail fast.
	Fatal,
}
impl Transience {
	/// Returns `true` for [`Transience::Transient`].
	pub const fn is_transient(self) -> bool {
		matches!(self, Transience::Transient)
	}
}

/// Substring classifier over lower-cased failure text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransienceClassifier {
	markers: Vec<String>,
}
impl TransienceClassifier {
	/// Creates a classifier with no markers; every failure is fatal until markers are added.
	pub fn empty() -> Self {
		Self { markers: Vec::new() }
	}

	/// Adds a marker, matched case-insensitively. Empty markers are ignored.
	pub fn with_marker(mut self, marker: impl AsRef<str>) -> Self {
		let marker = marker.as_ref().to_lowercase();

		if !marker.is_empty() && !self.markers.contains(&marker) {
			self.markers.push(marker);
		}

		self
	}

	/// Returns the active markers in insertion order.
	pub fn markers(&self) -> impl Iterator<Item = &str> {
		self.markers.iter().map(String::as_str)
	}

	/// Classifies a failure by its rendered text.
	pub fn classify<E>(&self, failure: &E) -> Transience
	where
		E: ?Sized + Display,
	{
		self.classify_text(&failure.to_string())
	}

	/// Classifies already-rendered failure text.
	pub fn classify_text(&self, text: &str) -> Transience {
		let text = text.to_lowercase();

		if self.markers.iter().any(|marker| text.contains(marker.as_str())) {
			Transience::Transient
		} else {
			Transience::Fatal
		}
	}
}
impl Default for TransienceClassifier {
	fn default() -> Self {
		DEFAULT_TRANSIENT_MARKERS.iter().fold(Self::empty(), |classifier, marker| {
			classifier.with_marker(marker)
		})
	}
}

/// Classifies a failure with the default marker set.
pub fn is_transient<E>(failure: &E) -> bool
where
	E: ?Sized + Display,
{
	TransienceClassifier::default().classify(failure).is_transient()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rate_limit_and_server_faults_are_transient() {
		for text in [
			"HTTP 429 Too Many Requests",
			"litellm.RateLimitError: rate_limit reached",
			"RESOURCE_EXHAUSTED: quota",
			"upstream returned 500",
			"502 Bad Gateway",
			"503 Service Unavailable",
			"504 Gateway Timeout",
			"Internal Server Error",
		] {
			assert!(is_transient(text), "`{text}` should be classified as transient.");
		}
	}

	#[test]
	fn everything_else_is_fatal() {
		for text in ["invalid_argument: prompt too long", "401 Unauthorized", "permission denied", ""]
		{
			assert!(!is_transient(text), "`{text}` should be classified as fatal.");
		}
	}

	#[test]
	fn custom_markers_match_case_insensitively() {
		let classifier = TransienceClassifier::empty().with_marker("Overloaded").with_marker("");

		assert_eq!(classifier.markers().collect::<Vec<_>>(), vec!["overloaded"]);
		assert_eq!(classifier.classify("model is OVERLOADED"), Transience::Transient);
		assert_eq!(classifier.classify("429"), Transience::Fatal);
		assert_eq!(
			TransienceClassifier::default().with_marker("429").markers().count(),
			DEFAULT_TRANSIENT_MARKERS.len()
		);
	}
}
