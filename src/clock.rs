//! Time sources used to settle asynchronous operations.

// self
use crate::_prelude::*;

/// Source of the current instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually advanced clock for deterministic tests and simulations.
#[derive(Debug)]
pub struct ManualClock(RwLock<OffsetDateTime>);
impl ManualClock {
	/// Creates a clock frozen at the provided instant.
	pub fn new(start: OffsetDateTime) -> Self {
		Self(RwLock::new(start))
	}

	/// Moves the clock forward; negative durations are ignored.
	pub fn advance(&self, by: Duration) {
		if by.is_negative() {
			return;
		}

		*self.0.write() += by;
	}

	/// Jumps to the provided instant.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.write() = instant;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.read()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn manual_clock_only_moves_forward_on_advance() {
		let start = macros::datetime!(2025-11-10 12:00 UTC);
		let clock = ManualClock::new(start);

		clock.advance(Duration::seconds(30));
		clock.advance(Duration::seconds(-10));

		assert_eq!(clock.now(), start + Duration::seconds(30));

		clock.set(start);

		assert_eq!(clock.now(), start);
	}
}
