use core::fmt;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Trait for scalar types used throughout the loss computation.
///
/// Implemented for f32, f64 and `Dual<S>`, so any function written against
/// `Scalar` can be evaluated with dual numbers to obtain its derivative.
pub trait Scalar:
    Copy
    + Clone
    + fmt::Debug
    + fmt::Display
    + PartialEq
    + PartialOrd
    + Default
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + Send
    + Sync
    + 'static
{
    const ZERO: Self;
    const ONE: Self;
    const TWO: Self;
    const HALF: Self;

    fn abs(self) -> Self;
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn max(self, other: Self) -> Self;
    fn recip(self) -> Self;
    fn signum(self) -> Self;

    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;

    /// Logistic function 1 / (1 + e^-x).
    #[inline]
    fn sigmoid(self) -> Self {
        Self::ONE / (Self::ONE + (-self).exp())
    }
}

// In std mode, use inherent float methods. In no_std, use libm.
// Dispatch via a helper module to keep the macro clean.
#[cfg(feature = "std")]
mod float_ops {
    #[inline(always)]
    pub fn abs_f32(x: f32) -> f32 {
        x.abs()
    }
    #[inline(always)]
    pub fn abs_f64(x: f64) -> f64 {
        x.abs()
    }
    #[inline(always)]
    pub fn exp_f32(x: f32) -> f32 {
        x.exp()
    }
    #[inline(always)]
    pub fn exp_f64(x: f64) -> f64 {
        x.exp()
    }
    #[inline(always)]
    pub fn ln_f32(x: f32) -> f32 {
        x.ln()
    }
    #[inline(always)]
    pub fn ln_f64(x: f64) -> f64 {
        x.ln()
    }
}

#[cfg(all(not(feature = "std"), feature = "libm"))]
mod float_ops {
    #[inline(always)]
    pub fn abs_f32(x: f32) -> f32 {
        libm::fabsf(x)
    }
    #[inline(always)]
    pub fn abs_f64(x: f64) -> f64 {
        libm::fabs(x)
    }
    #[inline(always)]
    pub fn exp_f32(x: f32) -> f32 {
        libm::expf(x)
    }
    #[inline(always)]
    pub fn exp_f64(x: f64) -> f64 {
        libm::exp(x)
    }
    #[inline(always)]
    pub fn ln_f32(x: f32) -> f32 {
        libm::logf(x)
    }
    #[inline(always)]
    pub fn ln_f64(x: f64) -> f64 {
        libm::log(x)
    }
}

macro_rules! impl_scalar_float {
    ($t:ty, $suffix:ident) => {
        ::paste::paste! {
        impl Scalar for $t {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const TWO: Self = 2.0;
            const HALF: Self = 0.5;

            #[inline] fn abs(self) -> Self { float_ops::[<abs_ $suffix>](self) }
            #[inline] fn exp(self) -> Self { float_ops::[<exp_ $suffix>](self) }
            #[inline] fn ln(self) -> Self { float_ops::[<ln_ $suffix>](self) }

            #[inline] fn max(self, other: Self) -> Self { if self > other { self } else { other } }
            #[inline] fn recip(self) -> Self { 1.0 as $t / self }
            #[inline] fn signum(self) -> Self {
                if self > 0.0 as $t { 1.0 as $t } else if self < 0.0 as $t { -(1.0 as $t) } else { 0.0 as $t }
            }

            #[inline] fn from_f64(v: f64) -> Self { v as $t }
            #[inline] fn to_f64(self) -> f64 { self as f64 }
        }
        }
    };
}

impl_scalar_float!(f32, f32);
impl_scalar_float!(f64, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_basics() {
        assert_eq!(f64::ZERO, 0.0);
        assert_eq!(f64::ONE, 1.0);
        assert_eq!(Scalar::abs(-3.0_f64), 3.0);
        assert_eq!(Scalar::signum(-3.0_f64), -1.0);
    }

    #[test]
    fn f32_basics() {
        assert_eq!(f32::ZERO, 0.0);
        assert!((Scalar::exp(0.0_f32) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn sigmoid_midpoint_and_tails() {
        assert!((0.0_f64.sigmoid() - 0.5).abs() < 1e-15);
        assert!(10.0_f64.sigmoid() > 0.9999);
        assert!((-10.0_f64).sigmoid() < 1e-4);
    }
}
