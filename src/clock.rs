//! Monotonic time source used by gates and invokers for both reading the current instant and
//! sleeping.
//!
//! Instants come from [`std::time::Instant`], so wall-clock corrections never move recorded
//! admissions into the future.

// std
use std::{thread, time::Instant};
// self
use crate::_prelude::*;

/// Source of monotonic instants plus the blocking sleep primitive.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant; successive calls never go backward.
	fn now(&self) -> Instant;

	/// Blocks the calling thread for `duration`; non-positive durations return immediately.
	fn sleep(&self, duration: Duration);
}

/// Clock backed by [`Instant::now`] and [`std::thread::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> Instant {
		Instant::now()
	}

	fn sleep(&self, duration: Duration) {
		if let Some(std) = to_std(duration) {
			thread::sleep(std);
		}
	}
}

/// Virtual clock whose sleeps advance time instantly; every sleep is recorded.
///
/// Useful for exercising throttled code paths without waiting on real windows. Like
/// [`SystemClock`], it never moves backward: negative advances are ignored.
#[derive(Debug)]
pub struct ManualClock {
	now: Mutex<Instant>,
	sleeps: Mutex<Vec<Duration>>,
}
impl ManualClock {
	/// Creates a clock starting at the current instant.
	pub fn new() -> Self {
		Self { now: Mutex::new(Instant::now()), sleeps: Mutex::new(Vec::new()) }
	}

	/// Moves virtual time forward without recording a sleep.
	pub fn advance(&self, by: Duration) {
		if let Some(std) = to_std(by) {
			*self.now.lock() += std;
		}
	}

	/// Returns every sleep requested so far, in order.
	pub fn sleeps(&self) -> Vec<Duration> {
		self.sleeps.lock().clone()
	}

	/// Returns the summed duration of every recorded sleep.
	pub fn slept(&self) -> Duration {
		self.sleeps.lock().iter().copied().sum()
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new()
	}
}
impl Clock for ManualClock {
	fn now(&self) -> Instant {
		*self.now.lock()
	}

	fn sleep(&self, duration: Duration) {
		self.sleeps.lock().push(duration);
		self.advance(duration);
	}
}

/// Time elapsed from `earlier` to `later`; zero when `earlier` is not actually earlier.
pub fn elapsed_between(earlier: Instant, later: Instant) -> Duration {
	Duration::try_from(later.saturating_duration_since(earlier)).unwrap_or(Duration::MAX)
}

// Non-positive durations have no std counterpart.
fn to_std(duration: Duration) -> Option<std::time::Duration> {
	std::time::Duration::try_from(duration).ok().filter(|std| !std.is_zero())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn manual_clock_advances_on_sleep() {
		let clock = ManualClock::new();
		let start = clock.now();

		clock.sleep(Duration::seconds(2));
		clock.advance(Duration::milliseconds(500));
		clock.sleep(Duration::seconds(-1));

		assert_eq!(elapsed_between(start, clock.now()), Duration::milliseconds(2_500));
		assert_eq!(clock.sleeps(), vec![Duration::seconds(2), Duration::seconds(-1)]);
		assert_eq!(clock.slept(), Duration::seconds(1));
	}

	#[test]
	fn manual_clock_never_steps_backward() {
		let clock = ManualClock::new();
		let start = clock.now();

		clock.advance(Duration::hours(-1));

		assert_eq!(clock.now(), start);
	}

	#[test]
	fn elapsed_between_saturates_at_zero() {
		let clock = ManualClock::new();
		let earlier = clock.now();

		clock.advance(Duration::seconds(5));

		assert_eq!(elapsed_between(earlier, clock.now()), Duration::seconds(5));
		assert_eq!(elapsed_between(clock.now(), earlier), Duration::ZERO);
	}

	#[test]
	fn system_clock_skips_negative_sleeps() {
		let started = Instant::now();

		SystemClock.sleep(Duration::seconds(-5));
		SystemClock.sleep(Duration::milliseconds(5));

		assert!(started.elapsed() >= std::time::Duration::from_millis(5));
		assert!(started.elapsed() < std::time::Duration::from_secs(1));
	}
}
