//! Sliding-window admission gate with a per-minute ceiling and a nested burst ceiling.
//!
//! The gate keeps every admission instant from the last window in chronological order. Each
//! decision first drops instants that have aged out, then admits only when both the main
//! window and the burst window have room. The check-and-record step runs under the gate's
//! lock; the lock is released before any caller sleeps, so waiting callers never block one
//! another's inspections.
//!
//! There is no FIFO ordering among waiters: whichever caller re-checks first after a slot
//! frees up takes it.

// std
use std::time::Instant;
// self
use crate::{
	_prelude::*,
	clock::{self, Clock, SystemClock},
	config::ThrottleConfig,
	obs::{self, AdmissionOutcome},
	resource::ResourceId,
};

/// Shortest sleep between re-checks, so a saturated gate never busy-spins.
const MIN_WAIT: Duration = Duration::milliseconds(10);

/// Point-in-time occupancy report returned by [`AdmissionGate::stats`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStats {
	/// Admissions still inside the main window.
	pub calls_in_window: usize,
	/// Main-window ceiling.
	pub limit: u32,
	/// Admissions the main window can still absorb; never negative.
	pub available_calls: u32,
	/// Admissions still inside the burst window.
	pub calls_in_burst_window: usize,
	/// Burst-window ceiling.
	pub burst_limit: u32,
}

/// Admission controller for one throttled resource.
///
/// Share it behind an [`Arc`] between every caller that draws on the same quota.
pub struct AdmissionGate {
	resource: ResourceId,
	config: ThrottleConfig,
	clock: Arc<dyn Clock>,
	history: Mutex<VecDeque<Instant>>,
}
impl AdmissionGate {
	/// Creates a gate on the system clock after validating `config`.
	pub fn new(config: ThrottleConfig) -> Result<Self> {
		Self::with_clock(config, Arc::new(SystemClock))
	}

	/// Creates a gate driven by the provided clock after validating `config`.
	pub fn with_clock(config: ThrottleConfig, clock: Arc<dyn Clock>) -> Result<Self> {
		config.validate()?;

		Ok(Self {
			resource: ResourceId::unnamed(),
			config,
			clock,
			history: Mutex::new(VecDeque::new()),
		})
	}

	/// Labels the gate's spans and metrics with `resource`.
	pub fn named(mut self, resource: ResourceId) -> Self {
		self.resource = resource;

		self
	}

	/// Returns the throttled resource's identifier.
	pub fn resource(&self) -> &ResourceId {
		&self.resource
	}

	/// Returns the validated configuration.
	pub fn config(&self) -> &ThrottleConfig {
		&self.config
	}

	/// Returns the clock used for timestamps and sleeps.
	pub fn clock(&self) -> &Arc<dyn Clock> {
		&self.clock
	}

	/// Blocks until a slot is admitted or waiting longer would overrun `timeout`.
	///
	/// Returns `true` once an admission has been recorded under both ceilings. Returns `false`
	/// without sleeping past the deadline when the next required wait does not fit in what
	/// remains of `timeout`. `None` waits indefinitely.
	pub fn acquire(&self, timeout: Option<Duration>) -> bool {
		let started = self.clock.now();

		loop {
			let (wait, in_window) = {
				let mut history = self.history.lock();
				let now = self.clock.now();

				match self.decide(&mut history, now) {
					Decision::Admitted => {
						obs::record_admission(&self.resource, AdmissionOutcome::Admitted);

						return true;
					},
					Decision::Wait(wait) => (wait, history.len()),
				}
			};
			let wait = match timeout {
				Some(timeout) => {
					let elapsed = clock::elapsed_between(started, self.clock.now());

					if elapsed + wait > timeout {
						obs::log_admission_refused(&self.resource, elapsed, timeout);
						obs::record_admission(&self.resource, AdmissionOutcome::Refused);

						return false;
					}

					wait.min(timeout - elapsed)
				},
				None => wait,
			};

			obs::log_admission_wait(&self.resource, wait, in_window);
			self.clock.sleep(wait);
		}
	}

	/// Admits immediately when both ceilings have room; never sleeps.
	pub fn try_acquire(&self) -> bool {
		let mut history = self.history.lock();
		let now = self.clock.now();
		let outcome = match self.decide(&mut history, now) {
			Decision::Admitted => AdmissionOutcome::Admitted,
			Decision::Wait(_) => AdmissionOutcome::Refused,
		};

		obs::record_admission(&self.resource, outcome);

		outcome == AdmissionOutcome::Admitted
	}

	/// Reports current occupancy after dropping aged-out admissions.
	pub fn stats(&self) -> GateStats {
		let mut history = self.history.lock();
		let now = self.clock.now();

		self.purge(&mut history, now);

		let calls_in_window = history.len();
		let recorded = u32::try_from(calls_in_window).unwrap_or(u32::MAX);

		GateStats {
			calls_in_window,
			limit: self.config.calls_per_minute,
			available_calls: self.config.calls_per_minute.saturating_sub(recorded),
			calls_in_burst_window: self.burst_count(&history, now),
			burst_limit: self.config.burst_size,
		}
	}

	/// Forgets every recorded admission.
	pub fn reset(&self) {
		self.history.lock().clear();
	}

	fn decide(&self, history: &mut VecDeque<Instant>, now: Instant) -> Decision {
		self.purge(history, now);

		let window_full = history.len() >= self.config.calls_per_minute as usize;
		let burst_full = self.burst_count(history, now) >= self.config.burst_size as usize;

		if !window_full && !burst_full {
			history.push_back(now);

			return Decision::Admitted;
		}

		// Ages saturate at zero, so no wait ever exceeds its window.
		let mut wait = Duration::ZERO;

		if window_full && let Some(oldest) = history.front() {
			wait = wait.max(self.config.window - clock::elapsed_between(*oldest, now));
		}
		if burst_full && let Some(oldest) = history.iter().find(|at| self.in_burst(**at, now)) {
			wait = wait.max(self.config.burst_window - clock::elapsed_between(*oldest, now));
		}

		Decision::Wait(wait.max(MIN_WAIT))
	}

	// History is oldest-first, so aged-out entries always form a prefix.
	fn purge(&self, history: &mut VecDeque<Instant>, now: Instant) {
		while history.front().is_some_and(|at| clock::elapsed_between(*at, now) >= self.config.window)
		{
			history.pop_front();
		}
	}

	fn burst_count(&self, history: &VecDeque<Instant>, now: Instant) -> usize {
		history.iter().filter(|at| self.in_burst(**at, now)).count()
	}

	fn in_burst(&self, at: Instant, now: Instant) -> bool {
		clock::elapsed_between(at, now) < self.config.burst_window
	}
}
impl Debug for AdmissionGate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AdmissionGate")
			.field("resource", &self.resource)
			.field("config", &self.config)
			.field("recorded", &self.history.lock().len())
			.finish()
	}
}

enum Decision {
	Admitted,
	Wait(Duration),
}
