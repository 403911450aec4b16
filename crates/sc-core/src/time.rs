//! Simulated time model.
//!
//! # Design
//!
//! Simulated time is held as an integer number of **milliseconds** since the
//! start of the run.  Configuration is expressed in (possibly fractional)
//! seconds and converted once, at validation time:
//!
//!   step_ms = round(step_length_secs * 1000)
//!
//! Using integers means min/max green and clearance arithmetic is exact and
//! the adapter's desync check (`returned == previous + step`) is a plain
//! equality test, with no floating-point tolerance to tune.
//!
//! `Tick` counts loop iterations and is independent of the step length.

use std::fmt;

// ── SimDuration ──────────────────────────────────────────────────────────────

/// A span of simulated time in milliseconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimDuration(pub u64);

impl SimDuration {
    pub const ZERO: SimDuration = SimDuration(0);

    #[inline]
    pub const fn from_millis(ms: u64) -> Self {
        SimDuration(ms)
    }

    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        SimDuration(secs * 1_000)
    }

    /// Convert fractional seconds, rounding to the nearest millisecond.
    ///
    /// Returns `None` for negative, NaN, or infinite input.
    pub fn from_secs_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        Some(SimDuration((secs * 1_000.0).round() as u64))
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn saturating_sub(self, rhs: SimDuration) -> SimDuration {
        SimDuration(self.0.saturating_sub(rhs.0))
    }

    /// `self * n`, saturating at `u64::MAX` milliseconds.
    #[inline]
    pub fn times(self, n: u64) -> SimDuration {
        SimDuration(self.0.saturating_mul(n))
    }
}

impl std::ops::Add for SimDuration {
    type Output = SimDuration;
    #[inline]
    fn add(self, rhs: SimDuration) -> SimDuration {
        SimDuration(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for SimDuration {
    #[inline]
    fn add_assign(&mut self, rhs: SimDuration) {
        self.0 += rhs.0;
    }
}

impl fmt::Display for SimDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.as_secs_f64())
    }
}

// ── SimTime ──────────────────────────────────────────────────────────────────

/// An absolute simulated instant, in milliseconds since the start of the run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        SimTime(secs * 1_000)
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// Time elapsed from `earlier` to `self` (zero if `earlier` is later).
    #[inline]
    pub fn since(self, earlier: SimTime) -> SimDuration {
        SimDuration(self.0.saturating_sub(earlier.0))
    }

    #[inline]
    pub fn checked_add(self, d: SimDuration) -> Option<SimTime> {
        self.0.checked_add(d.0).map(SimTime)
    }

    /// Break into (hour, minute, second) of the simulated day, for logging
    /// without a datetime library.
    pub fn hms(self) -> (u64, u32, u32) {
        let total_secs = self.0 / 1_000;
        let hours = total_secs / 3_600;
        let minutes = ((total_secs % 3_600) / 60) as u32;
        let seconds = (total_secs % 60) as u32;
        (hours, minutes, seconds)
    }
}

impl std::ops::Add<SimDuration> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: SimDuration) -> SimTime {
        SimTime(self.0 + rhs.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = self.hms();
        write!(f, "{:02}:{:02}:{:02}.{:03}", h, m, s, self.0 % 1_000)
    }
}

// ── Tick ─────────────────────────────────────────────────────────────────────

/// A control-loop iteration counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The controller's own view of simulated time.
///
/// Tracks the last time the simulator confirmed and the fixed step length,
/// so the caller can tell whether the simulator's answer to "advance by one
/// step" is the time it should have been.
#[derive(Clone, Debug)]
pub struct SimClock {
    /// Simulated time advanced per tick.
    pub step: SimDuration,
    /// Ticks completed so far.
    pub current_tick: Tick,
    /// Last simulated time confirmed by the simulator.
    pub current_time: SimTime,
}

impl SimClock {
    /// Create a clock that starts at `start` and advances by `step`.
    pub fn new(start: SimTime, step: SimDuration) -> Self {
        Self {
            step,
            current_tick: Tick::ZERO,
            current_time: start,
        }
    }

    /// The time the simulator must report after the next step.
    #[inline]
    pub fn expected_next(&self) -> SimTime {
        self.current_time + self.step
    }

    /// Record a confirmed step.
    #[inline]
    pub fn advance(&mut self, confirmed: SimTime) {
        self.current_tick = self.current_tick.offset(1);
        self.current_time = confirmed;
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.current_tick, self.current_time)
    }
}
