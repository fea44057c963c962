//! Sliding-window admission gate and transient-aware retry invoker that keep callers inside a
//! rate-limited provider's quota.
//!
//! An [`AdmissionGate`](gate::AdmissionGate) enforces a per-minute ceiling and a tighter burst
//! ceiling over the same timestamp history, blocking callers until a slot frees up or their
//! timeout elapses. A [`RetryingInvoker`](invoke::RetryingInvoker) acquires a slot before every
//! attempt, classifies failures as transient or fatal, and backs off between transient ones.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod invoke;
pub mod obs;
pub mod resource;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		clock::{Clock, ManualClock},
		config::ThrottleConfig,
		gate::AdmissionGate,
		invoke::RetryingInvoker,
	};

	/// Builds a fresh manual clock.
	pub fn test_clock() -> Arc<ManualClock> {
		Arc::new(ManualClock::new())
	}

	/// Constructs a gate driven by a fresh manual clock and returns both handles.
	pub fn build_manual_gate(config: ThrottleConfig) -> (Arc<AdmissionGate>, Arc<ManualClock>) {
		let clock = test_clock();
		let shared: Arc<dyn Clock> = clock.clone();
		let gate = AdmissionGate::with_clock(config, shared)
			.expect("Test throttle configuration should validate.");

		(Arc::new(gate), clock)
	}

	/// Constructs an invoker on top of a manual-clock gate.
	pub fn build_manual_invoker(config: ThrottleConfig) -> (RetryingInvoker, Arc<ManualClock>) {
		let (gate, clock) = build_manual_gate(config);

		(RetryingInvoker::new(gate), clock)
	}
}

mod _prelude {
	pub use std::{
		collections::VecDeque,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::Duration;

	pub use crate::error::Result;
}

pub use gate::{AdmissionGate, GateStats};
pub use invoke::{CallOptions, RetryingInvoker};
#[cfg(test)] use color_eyre as _;
