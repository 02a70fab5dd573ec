//! Simulated time.
//!
//! The simulation measures time in millisols: one sol (a Martian day) is
//! 1000 millisols. [`SimTime`] is the absolute simulated time since the
//! start of the run. Only the master clock advances it; every other
//! component reads it.

use serde::{Deserialize, Serialize};

/// Number of millisols in one sol.
pub const MILLISOLS_PER_SOL: f64 = 1000.0;

/// Absolute simulated time, in millisols since the start of the run.
///
/// Values are never negative or non-finite: constructors clamp such
/// input to zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct SimTime(f64);

impl SimTime {
    /// The start of the simulation.
    pub const ZERO: Self = Self(0.0);

    /// Create a time from a total number of millisols.
    pub fn from_millisols(millisols: f64) -> Self {
        if millisols.is_finite() && millisols > 0.0 {
            Self(millisols)
        } else {
            Self::ZERO
        }
    }

    /// Total millisols since the start of the run.
    pub const fn millisols(self) -> f64 {
        self.0
    }

    /// The 1-based sol number this time falls in.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn sol(self) -> u64 {
        // Non-negative and finite by construction.
        let whole = (self.0 / MILLISOLS_PER_SOL).floor() as u64;
        whole.saturating_add(1)
    }

    /// Offset within the current sol, in `[0, 1000)`.
    pub fn millisol(self) -> f64 {
        self.0.rem_euclid(MILLISOLS_PER_SOL)
    }

    /// Return this time advanced by `millisols`.
    pub fn plus(self, millisols: f64) -> Self {
        Self::from_millisols(self.0 + millisols)
    }

    /// Millisols elapsed since `earlier`, or zero if `earlier` is later.
    pub fn since(self, earlier: Self) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }
}

impl core::fmt::Display for SimTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Sol {} @ {:.3}", self.sol(), self.millisol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sol_is_one() {
        assert_eq!(SimTime::ZERO.sol(), 1);
        assert_eq!(SimTime::from_millisols(999.9).sol(), 1);
        assert_eq!(SimTime::from_millisols(1000.0).sol(), 2);
    }

    #[test]
    fn display_shows_sol_and_millisol() {
        let t = SimTime::from_millisols(2512.25);
        assert_eq!(t.to_string(), "Sol 3 @ 512.250");
    }

    #[test]
    fn negative_and_nan_clamp_to_zero() {
        assert_eq!(SimTime::from_millisols(-5.0), SimTime::ZERO);
        assert_eq!(SimTime::from_millisols(f64::NAN), SimTime::ZERO);
    }

    #[test]
    fn plus_and_since() {
        let start = SimTime::from_millisols(100.0);
        let later = start.plus(25.0);
        assert!((later.since(start) - 25.0).abs() < f64::EPSILON);
        assert!(start.since(later).abs() < f64::EPSILON);
    }
}
