//! Full-jitter randomization for scheduling and backoff waits.

// crates.io
use rand::{Rng, SeedableRng, rngs::StdRng};
// self
use crate::_prelude::*;

/// Randomizes a computed wait to decorrelate concurrent callers.
///
/// Implementations must return a value in `[0, base]`; non-positive bases yield
/// [`Duration::ZERO`].
pub trait JitterSource
where
	Self: Send + Sync,
{
	/// Returns the jittered wait for `base`.
	fn jitter(&self, base: Duration) -> Duration;
}

/// Full jitter drawn from the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct FullJitter;
impl JitterSource for FullJitter {
	fn jitter(&self, base: Duration) -> Duration {
		sample(&mut rand::rng(), base)
	}
}

/// Deterministic full jitter seeded once, for reproducible tests and simulations.
#[derive(Debug)]
pub struct SeededJitter(Mutex<StdRng>);
impl SeededJitter {
	/// Creates a generator from a fixed seed.
	pub fn new(seed: u64) -> Self {
		Self(Mutex::new(StdRng::seed_from_u64(seed)))
	}
}
impl JitterSource for SeededJitter {
	fn jitter(&self, base: Duration) -> Duration {
		sample(&mut *self.0.lock(), base)
	}
}

/// Boundary overrides that pin jitter to either end of the range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixedJitter {
	/// Always waits zero.
	Floor,
	/// Always waits the full base.
	Ceiling,
}
impl JitterSource for FixedJitter {
	fn jitter(&self, base: Duration) -> Duration {
		if !base.is_positive() {
			return Duration::ZERO;
		}

		match self {
			Self::Floor => Duration::ZERO,
			Self::Ceiling => base,
		}
	}
}

fn sample<R>(rng: &mut R, base: Duration) -> Duration
where
	R: Rng,
{
	if !base.is_positive() {
		return Duration::ZERO;
	}

	let secs = rng.random_range(0.0..=base.as_seconds_f64());

	// Float round-trips can overshoot by a nanosecond.
	Duration::checked_seconds_f64(secs).unwrap_or(base).clamp(Duration::ZERO, base)
}
