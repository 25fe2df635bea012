use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::error::{CoreError, Result};

/// Internal ticks per whole resource unit.
const UNIT_SCALING: i64 = 10_000;

/// Non-negative fixed-point resource quantity.
///
/// All resource amounts in magnetar are `FixedPoint` so that equality and
/// ordering comparisons are deterministic. Conversion to `f64` is confined
/// to scoring ratios.
///
/// Subtracting below zero is an invariant breach and panics: a negative
/// quantity means the scheduler and the resource manager disagree about the
/// cluster state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct FixedPoint(i64);

impl FixedPoint {
    /// The zero quantity
    pub const ZERO: FixedPoint = FixedPoint(0);

    /// Create a quantity of whole resource units
    pub fn from_units(units: u64) -> Self {
        FixedPoint(units as i64 * UNIT_SCALING)
    }

    /// Create a quantity from a real number
    ///
    /// Rejects negative and non-finite input; fractional amounts are rounded
    /// to the nearest representable tick.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(CoreError::not_finite(value));
        }
        if value < 0.0 {
            return Err(CoreError::negative_quantity(value));
        }
        Ok(FixedPoint((value * UNIT_SCALING as f64).round() as i64))
    }

    /// Convert to a real number for scoring ratios
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / UNIT_SCALING as f64
    }

    /// Whether this quantity is zero
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add for FixedPoint {
    type Output = FixedPoint;

    fn add(self, rhs: FixedPoint) -> FixedPoint {
        FixedPoint(self.0 + rhs.0)
    }
}

impl AddAssign for FixedPoint {
    fn add_assign(&mut self, rhs: FixedPoint) {
        self.0 += rhs.0;
    }
}

impl Sub for FixedPoint {
    type Output = FixedPoint;

    fn sub(self, rhs: FixedPoint) -> FixedPoint {
        assert!(
            self.0 >= rhs.0,
            "resource quantity underflow: {} - {}",
            self,
            rhs
        );
        FixedPoint(self.0 - rhs.0)
    }
}

impl SubAssign for FixedPoint {
    fn sub_assign(&mut self, rhs: FixedPoint) {
        *self = *self - rhs;
    }
}

impl Sum for FixedPoint {
    fn sum<I: Iterator<Item = FixedPoint>>(iter: I) -> FixedPoint {
        iter.fold(FixedPoint::ZERO, Add::add)
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}
