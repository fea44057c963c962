// self
use crate::{
	obs::{AdmissionOutcome, CallOutcome},
	resource::ResourceId,
};

/// Records an admission decision via the global metrics recorder (when enabled).
pub fn record_admission(resource: &ResourceId, outcome: AdmissionOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"quota_gate_admission_total",
			"resource" => resource.to_string(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (resource, outcome);
	}
}

/// Records an invoker outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(resource: &ResourceId, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"quota_gate_call_total",
			"resource" => resource.to_string(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (resource, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_are_safe_without_an_installed_exporter() {
		let resource = ResourceId::unnamed();

		record_admission(&resource, AdmissionOutcome::Refused);
		record_call_outcome(&resource, CallOutcome::Retry);
	}
}
