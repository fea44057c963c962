// std
use std::{cell::RefCell, collections::VecDeque, sync::Arc};
// crates.io
use serde_json::{Value, json};
use time::Duration;
// self
use quota_gate::{
	AdmissionGate, CallOptions, RetryingInvoker,
	clock::{Clock, ManualClock},
	config::ThrottleConfig,
	error::{CallError, CallErrorKind},
};

type Script = RefCell<VecDeque<Result<Value, String>>>;

fn scripted(responses: impl IntoIterator<Item = Result<Value, String>>) -> Script {
	RefCell::new(responses.into_iter().collect())
}

fn invoker(config: ThrottleConfig) -> (RetryingInvoker, Arc<ManualClock>) {
	let clock = Arc::new(ManualClock::new());
	let shared: Arc<dyn Clock> = clock.clone();
	let gate =
		AdmissionGate::with_clock(config, shared).expect("Gate configuration should validate.");

	(RetryingInvoker::new(Arc::new(gate)), clock)
}

#[test]
fn mixed_raised_and_embedded_failures_recover() -> color_eyre::Result<()> {
	let (invoker, clock) = invoker(ThrottleConfig::default());
	let script = scripted([
		Err("502 Bad Gateway".to_string()),
		Ok(json!({ "error": "rate_limit_exceeded", "message": "quota" })),
		Ok(json!({ "candidates": ["ok"] })),
	]);
	let value = invoker
		.call(|| {
			script.borrow_mut().pop_front().unwrap_or_else(|| Err("script exhausted".into()))
		})
		.map_err(|err| color_eyre::eyre::eyre!("{err}"))?;

	assert_eq!(value, json!({ "candidates": ["ok"] }));
	assert_eq!(clock.sleeps(), vec![Duration::seconds(2), Duration::seconds(4)]);
	assert!(script.borrow().is_empty());

	Ok(())
}

#[test]
fn transient_embedded_error_on_the_last_attempt_is_passed_through() {
	let (invoker, _clock) = invoker(ThrottleConfig::default().with_max_retries(2));
	let err = invoker
		.call(|| -> Result<Value, String> { Ok(json!({ "error": "503 overloaded" })) })
		.expect_err("Exhausted embedded errors must surface.");

	assert_eq!(err.kind(), CallErrorKind::Reported);
	assert_eq!(err.to_payload(), json!({ "error": "503 overloaded" }));
}

#[test]
fn raised_failures_render_uniform_payloads() {
	let (invoker, _clock) = invoker(ThrottleConfig::default());
	let err = invoker
		.call(|| -> Result<Value, String> { Err("invalid_argument: bad prompt".into()) })
		.expect_err("Fatal failures must surface.");

	assert_eq!(
		err.to_payload(),
		json!({ "error": "execution_failed", "message": "invalid_argument: bad prompt" })
	);
}

#[test]
fn per_call_options_override_gate_defaults() {
	let (invoker, clock) = invoker(ThrottleConfig::default().with_calls_per_minute(1));

	invoker
		.call(|| -> Result<Value, String> { Ok(json!({ "id": 1 })) })
		.expect("First call should be admitted immediately.");

	let options = CallOptions::default().with_acquire_timeout(None);
	let value = invoker
		.call_with(&options, || -> Result<Value, String> { Ok(json!({ "id": 2 })) })
		.expect("Unbounded admission should wait for the window to clear.");

	assert_eq!(value["id"], 2);
	assert_eq!(clock.sleeps(), vec![Duration::seconds(60)]);

	let refused = invoker
		.call(|| -> Result<Value, String> { Ok(json!({ "id": 3 })) })
		.expect_err("Default 30s timeout cannot cover a 60s wait.");

	assert!(matches!(
		refused,
		CallError::RateLimitExceeded { timeout } if timeout == Duration::seconds(30)
	));
}
