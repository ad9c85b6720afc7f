//! Explicit validity marker for per-location values
//!
//! Masking is the only representation of "missing" in the fitting code.
//! A [`Masked`] value is either a finite `f64` or masked; every arithmetic
//! operator propagates masking, so an expression with any masked operand is
//! masked as a whole. Non-finite results (division by zero, overflow) mask
//! instead of leaking NaN or infinity as if they were data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A finite `f64` or a masked value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Masked(Option<f64>);

impl Masked {
    /// The masked value
    pub const MASKED: Masked = Masked(None);

    /// Wrap a value, masking it if it is not finite
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Masked(Some(value))
        } else {
            Masked(None)
        }
    }

    /// Whether the value is valid (not masked)
    pub fn is_valid(self) -> bool {
        self.0.is_some()
    }

    /// Whether the value is masked
    pub fn is_masked(self) -> bool {
        self.0.is_none()
    }

    /// The inner value, if valid
    pub fn get(self) -> Option<f64> {
        self.0
    }

    /// The inner value or `default` when masked
    pub fn unwrap_or(self, default: f64) -> f64 {
        self.0.unwrap_or(default)
    }

    /// Apply `f` to a valid value; the result is re-checked for finiteness
    pub fn map<F: FnOnce(f64) -> f64>(self, f: F) -> Self {
        match self.0 {
            Some(v) => Masked::new(f(v)),
            None => Masked::MASKED,
        }
    }

    /// Combine two values; masked if either side is masked
    pub fn zip_with<F: FnOnce(f64, f64) -> f64>(self, other: Masked, f: F) -> Self {
        match (self.0, other.0) {
            (Some(a), Some(b)) => Masked::new(f(a, b)),
            _ => Masked::MASKED,
        }
    }

    /// Keep the value only where `keep` holds
    pub fn mask_unless(self, keep: bool) -> Self {
        if keep { self } else { Masked::MASKED }
    }

    /// Clamp a valid value into `[lo, hi]`
    pub fn clamp(self, lo: f64, hi: f64) -> Self {
        self.map(|v| v.clamp(lo, hi))
    }
}

impl From<f64> for Masked {
    fn from(value: f64) -> Self {
        Masked::new(value)
    }
}

impl From<Option<f64>> for Masked {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Masked::MASKED, Masked::new)
    }
}

impl From<Masked> for Option<f64> {
    fn from(value: Masked) -> Self {
        value.0
    }
}

impl fmt::Display for Masked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("masked"),
        }
    }
}

macro_rules! impl_masked_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait for Masked {
            type Output = Masked;

            fn $method(self, rhs: Masked) -> Masked {
                self.zip_with(rhs, |a, b| a $op b)
            }
        }

        impl $trait<f64> for Masked {
            type Output = Masked;

            fn $method(self, rhs: f64) -> Masked {
                self.zip_with(Masked::new(rhs), |a, b| a $op b)
            }
        }
    };
}

impl_masked_op!(Add, add, +);
impl_masked_op!(Sub, sub, -);
impl_masked_op!(Mul, mul, *);
impl_masked_op!(Div, div, /);

impl Neg for Masked {
    type Output = Masked;

    fn neg(self) -> Masked {
        self.map(|v| -v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_values_are_masked() {
        assert!(Masked::new(f64::NAN).is_masked());
        assert!(Masked::new(f64::INFINITY).is_masked());
        assert!(Masked::new(-3.5).is_valid());
    }

    #[test]
    fn arithmetic_propagates_masking() {
        let a = Masked::new(2.0);
        let m = Masked::MASKED;
        assert_eq!((a + 1.0).get(), Some(3.0));
        assert!((a + m).is_masked());
        assert!((m * 4.0).is_masked());
        assert!((-m).is_masked());
    }

    #[test]
    fn division_by_zero_masks() {
        let a = Masked::new(1.0);
        assert!((a / 0.0).is_masked());
        assert!((a / Masked::new(0.0)).is_masked());
    }

    #[test]
    fn mask_unless_drops_value() {
        let a = Masked::new(7.0);
        assert_eq!(a.mask_unless(true), a);
        assert!(a.mask_unless(false).is_masked());
    }
}
