//! Money in the smallest currency unit.

use core::iter::Sum;
use core::ops::{Add, AddAssign};
use serde::{Deserialize, Serialize};

/// Amount in the smallest currency unit (e.g., cents).
///
/// Records carry integer amounts; analytics converts to `f64` currency units
/// through [`Cents::as_units`] at the algorithm boundary.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(pub u64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub fn new(amount: u64) -> Self {
        Self(amount)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Amount in whole currency units (cents / 100).
    pub fn as_units(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Price × quantity, saturating on overflow.
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(u64::from(quantity)))
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Cents) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, |acc, c| acc + c)
    }
}

impl core::fmt::Display for Cents {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_as_currency_units() {
        assert_eq!(Cents(123_45).to_string(), "123.45");
        assert_eq!(Cents(7).to_string(), "0.07");
    }

    #[test]
    fn times_saturates_instead_of_overflowing() {
        assert_eq!(Cents(u64::MAX).times(2), Cents(u64::MAX));
        assert_eq!(Cents(250).times(4), Cents(1000));
    }

    #[test]
    fn sums_and_converts_to_units() {
        let total: Cents = [Cents(150), Cents(250)].into_iter().sum();
        assert_eq!(total, Cents(400));
        assert!((total.as_units() - 4.0).abs() < f64::EPSILON);
    }
}
