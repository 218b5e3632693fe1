//! Q16.16 fixed-point arithmetic for the control loops
//!
//! Avoids hardware floating point on the Cortex-M0+ cores. Gains arrive
//! from config as integers scaled by 1000.

use core::ops::{Add, Neg, Sub};

/// Q16.16 fixed-point number
///
/// Range roughly -32768.0 to +32767.99998, resolution about 0.000015.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fixed32(pub i32);

impl Fixed32 {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1 << 16);
    pub const FRAC_BITS: u32 = 16;

    /// From a whole integer
    #[inline]
    pub const fn from_int(n: i16) -> Self {
        Self((n as i32) << Self::FRAC_BITS)
    }

    /// From a config value stored as value x1000
    ///
    /// # Example
    /// ```
    /// use binbot_drivers::drive::fixed::Fixed32;
    /// let kp = Fixed32::from_scaled_1000(800); // 0.8
    /// assert_eq!(kp.mul(Fixed32::from_int(10)).to_int(), 8);
    /// ```
    #[inline]
    pub const fn from_scaled_1000(n: i32) -> Self {
        Self((n << Self::FRAC_BITS) / 1000)
    }

    /// Whole-integer part (truncates toward negative infinity)
    #[inline]
    pub const fn to_int(self) -> i16 {
        (self.0 >> Self::FRAC_BITS) as i16
    }

    /// Multiply with an i64 intermediate to avoid overflow
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, other: Self) -> Self {
        let product = ((self.0 as i64) * (other.0 as i64)) >> Self::FRAC_BITS;
        Self(product as i32)
    }

    /// Multiply by a plain integer
    #[inline]
    pub fn mul_int(self, n: i32) -> Self {
        Self(self.0.saturating_mul(n))
    }

    /// Divide by a plain integer; zero divisor yields zero
    #[inline]
    pub fn div_int(self, divisor: i32) -> Self {
        if divisor == 0 {
            return Self::ZERO;
        }
        Self(self.0 / divisor)
    }

    #[inline]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    #[inline]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self(self.0.clamp(min.0, max.0))
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add for Fixed32 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self(self.0.wrapping_add(other.0))
    }
}

impl Sub for Fixed32 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self(self.0.wrapping_sub(other.0))
    }
}

impl Neg for Fixed32 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(-self.0)
    }
}
