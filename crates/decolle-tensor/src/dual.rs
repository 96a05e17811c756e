use crate::Scalar;
use core::fmt;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Forward-mode automatic differentiation via dual numbers.
///
/// `Dual<S>` represents a value `a + bε` where ε² = 0. The `real` part carries
/// the function value, the `dual` part carries the derivative. Because
/// `Dual<S>` implements `Scalar`, any loss written against `Scalar` can be
/// differentiated by seeding one input with `Dual::var` and reading the `dual`
/// part of the result.
///
/// # Example
/// ```
/// use decolle_tensor::Dual;
///
/// // f(x) = x² at x = 3
/// let x = Dual::var(3.0_f64);
/// let y = x * x;
/// assert_eq!(y.real, 9.0);  // f(3) = 9
/// assert_eq!(y.dual, 6.0);  // f'(3) = 2*3 = 6
/// ```
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dual<S> {
    pub real: S,
    pub dual: S,
}

impl<S: Scalar> Dual<S> {
    /// Constant (derivative = 0)
    #[inline]
    pub fn constant(real: S) -> Self {
        Self {
            real,
            dual: S::ZERO,
        }
    }

    /// Variable (derivative = 1)
    #[inline]
    pub fn var(real: S) -> Self {
        Self { real, dual: S::ONE }
    }

    /// Construct with explicit derivative
    #[inline]
    pub fn new(real: S, dual: S) -> Self {
        Self { real, dual }
    }
}

impl<S: Scalar> PartialEq for Dual<S> {
    fn eq(&self, other: &Self) -> bool {
        self.real == other.real
    }
}

impl<S: Scalar> PartialOrd for Dual<S> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        self.real.partial_cmp(&other.real)
    }
}

impl<S: Scalar> Default for Dual<S> {
    fn default() -> Self {
        Self::constant(S::ZERO)
    }
}

impl<S: Scalar> fmt::Display for Dual<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}+{}ε", self.real, self.dual)
    }
}

// Arithmetic: dual number rules
// (a + bε) + (c + dε) = (a+c) + (b+d)ε
// (a + bε) * (c + dε) = ac + (ad + bc)ε
// (a + bε) / (c + dε) = a/c + (bc - ad)/c²ε

impl<S: Scalar> Add for Dual<S> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            real: self.real + rhs.real,
            dual: self.dual + rhs.dual,
        }
    }
}

impl<S: Scalar> Sub for Dual<S> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            real: self.real - rhs.real,
            dual: self.dual - rhs.dual,
        }
    }
}

impl<S: Scalar> Mul for Dual<S> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            real: self.real * rhs.real,
            dual: self.real * rhs.dual + self.dual * rhs.real,
        }
    }
}

impl<S: Scalar> Div for Dual<S> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        let inv = rhs.real.recip();
        Self {
            real: self.real * inv,
            dual: (self.dual * rhs.real - self.real * rhs.dual) * inv * inv,
        }
    }
}

impl<S: Scalar> Neg for Dual<S> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self {
            real: -self.real,
            dual: -self.dual,
        }
    }
}

impl<S: Scalar> AddAssign for Dual<S> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.real += rhs.real;
        self.dual += rhs.dual;
    }
}

impl<S: Scalar> SubAssign for Dual<S> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.real -= rhs.real;
        self.dual -= rhs.dual;
    }
}

impl<S: Scalar> MulAssign for Dual<S> {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        let new_dual = self.real * rhs.dual + self.dual * rhs.real;
        self.real *= rhs.real;
        self.dual = new_dual;
    }
}

impl<S: Scalar> DivAssign for Dual<S> {
    #[inline]
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

/// Implement Scalar for Dual<S> — this is what makes the loss computation
/// automatically differentiable.
impl<S: Scalar> Scalar for Dual<S> {
    const ZERO: Self = Dual {
        real: S::ZERO,
        dual: S::ZERO,
    };
    const ONE: Self = Dual {
        real: S::ONE,
        dual: S::ZERO,
    };
    const TWO: Self = Dual {
        real: S::TWO,
        dual: S::ZERO,
    };
    const HALF: Self = Dual {
        real: S::HALF,
        dual: S::ZERO,
    };

    // d/dx |x| = sign(x)
    #[inline]
    fn abs(self) -> Self {
        Dual {
            real: self.real.abs(),
            dual: self.dual * self.real.signum(),
        }
    }

    // d/dx exp(x) = exp(x)
    #[inline]
    fn exp(self) -> Self {
        let e = self.real.exp();
        Dual {
            real: e,
            dual: self.dual * e,
        }
    }

    // d/dx ln(x) = 1/x
    #[inline]
    fn ln(self) -> Self {
        Dual {
            real: self.real.ln(),
            dual: self.dual / self.real,
        }
    }

    #[inline]
    fn max(self, other: Self) -> Self {
        if self.real > other.real {
            self
        } else {
            other
        }
    }

    #[inline]
    fn recip(self) -> Self {
        let inv = self.real.recip();
        Dual {
            real: inv,
            dual: -self.dual * inv * inv,
        }
    }

    #[inline]
    fn signum(self) -> Self {
        Dual::constant(self.real.signum())
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        Dual::constant(S::from_f64(v))
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self.real.to_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivative_of_square() {
        let x = Dual::var(3.0_f64);
        let y = x * x;
        assert_eq!(y.real, 9.0);
        assert_eq!(y.dual, 6.0); // d/dx x² = 2x = 6
    }

    #[test]
    fn derivative_of_reciprocal() {
        let x = Dual::var(2.0_f64);
        let y = x.recip();
        assert!((y.real - 0.5).abs() < 1e-10);
        assert!((y.dual - (-0.25)).abs() < 1e-10); // d/dx 1/x = -1/x²
    }

    #[test]
    fn derivative_of_exp() {
        // d/dx exp(x) = exp(x)
        let x = Dual::var(1.0_f64);
        let y = x.exp();
        let e = 1.0_f64.exp();
        assert!((y.real - e).abs() < 1e-10);
        assert!((y.dual - e).abs() < 1e-10);
    }

    #[test]
    fn derivative_of_ln() {
        // d/dx ln(x) = 1/x
        let x = Dual::var(2.0_f64);
        let y = x.ln();
        assert!((y.real - 2.0_f64.ln()).abs() < 1e-10);
        assert!((y.dual - 0.5).abs() < 1e-10);
    }

    #[test]
    fn chain_rule() {
        // d/dx exp(x²) = 2x * exp(x²)
        let x = Dual::var(1.0_f64);
        let x_sq = x * x;
        let y = x_sq.exp();
        let expected = 2.0 * 1.0_f64.exp();
        assert!((y.dual - expected).abs() < 1e-10);
    }

    #[test]
    fn derivative_of_sigmoid() {
        // d/dx σ(x) = σ(x)(1 - σ(x))
        let x = Dual::var(0.7_f64);
        let y = x.sigmoid();
        let s = 0.7_f64.sigmoid();
        assert!((y.real - s).abs() < 1e-12);
        assert!((y.dual - s * (1.0 - s)).abs() < 1e-12);
    }

    #[test]
    fn abs_keeps_sign_in_dual() {
        let x = Dual::var(-3.0_f64);
        let y = x.abs();
        assert_eq!(y.real, 3.0);
        assert_eq!(y.dual, -1.0);
    }
}
