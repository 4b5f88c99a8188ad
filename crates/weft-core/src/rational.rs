//! Exact rational time.
//!
//! All pattern time is measured in cycles and kept as reduced rationals;
//! floats only appear at the edges (host-supplied tempo knobs, signal
//! sampling). One cycle is the fundamental repeating unit.

use num_integer::Integer;
use num_rational::Rational64;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A point in time or a duration, in cycles. Always reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational(Rational64);

impl Rational {
    /// Create a rational from numerator and denominator.
    ///
    /// Panics if `denom` is zero.
    pub fn new(numer: i64, denom: i64) -> Self {
        Rational(Rational64::new(numer, denom))
    }

    pub fn from_integer(n: i64) -> Self {
        Rational(Rational64::from_integer(n))
    }

    pub fn zero() -> Self {
        Rational(Rational64::zero())
    }

    pub fn one() -> Self {
        Rational(Rational64::one())
    }

    pub fn numer(&self) -> i64 {
        *self.0.numer()
    }

    pub fn denom(&self) -> i64 {
        *self.0.denom()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn abs(&self) -> Self {
        Rational(self.0.abs())
    }

    /// Round down to the nearest integer.
    pub fn floor(&self) -> Self {
        Rational(Rational64::from_integer(self.0.floor().to_integer()))
    }

    /// Round up to the nearest integer.
    pub fn ceil(&self) -> Self {
        Rational(Rational64::from_integer(self.0.ceil().to_integer()))
    }

    /// The start of the cycle containing this time ("sam" in the Tidal
    /// lineage). Same as `floor`, named for its role.
    pub fn sam(&self) -> Self {
        self.floor()
    }

    /// The start of the next cycle.
    pub fn next_sam(&self) -> Self {
        self.sam() + Rational::one()
    }

    /// The position within the current cycle (fractional part, in [0, 1)).
    pub fn cycle_pos(&self) -> Self {
        *self - self.sam()
    }

    /// The whole cycle containing this time, as a (begin, end) pair.
    pub fn whole_cycle(&self) -> (Self, Self) {
        (self.sam(), self.next_sam())
    }

    /// The cycle index as an integer.
    pub fn cycle_index(&self) -> i64 {
        self.sam().numer()
    }

    /// Euclidean remainder: the result is always in `[0, m)` for
    /// positive `m`. `cycle_pos` is `modulo(1)`.
    pub fn modulo(self, m: Self) -> Self {
        self - (self / m).floor() * m
    }

    pub fn min(self, other: Self) -> Self {
        if self < other {
            self
        } else {
            other
        }
    }

    pub fn max(self, other: Self) -> Self {
        if self > other {
            self
        } else {
            other
        }
    }

    /// The reciprocal. Panics when zero.
    pub fn recip(self) -> Self {
        Rational(self.0.recip())
    }

    pub fn to_f64(&self) -> f64 {
        *self.0.numer() as f64 / *self.0.denom() as f64
    }

    /// Best rational approximation of a float with a bounded denominator.
    ///
    /// Uses mediant (Stern-Brocot) refinement; denominators stay below
    /// 10000 so downstream arithmetic cannot overflow i64 in practice.
    /// NaN and infinities map to zero.
    pub fn approximate(f: f64) -> Self {
        const MAX_DENOM: i64 = 10_000;

        if f.is_nan() || f.is_infinite() {
            return Rational::zero();
        }

        let sign = if f < 0.0 { -1 } else { 1 };
        let f_abs = f.abs();
        let int_part = f_abs.floor() as i64;
        let frac = f_abs - int_part as f64;

        if frac < 1e-10 {
            return Rational::from_integer(sign * int_part);
        }

        let (mut lo_n, mut lo_d) = (0i64, 1i64);
        let (mut hi_n, mut hi_d) = (1i64, 1i64);

        for _ in 0..64 {
            let med_n = lo_n + hi_n;
            let med_d = lo_d + hi_d;
            if med_d > MAX_DENOM {
                break;
            }
            let med = med_n as f64 / med_d as f64;
            if (med - frac).abs() < 1e-10 {
                return Rational::new(sign * (int_part * med_d + med_n), med_d);
            } else if med < frac {
                lo_n = med_n;
                lo_d = med_d;
            } else {
                hi_n = med_n;
                hi_d = med_d;
            }
        }

        let lo = lo_n as f64 / lo_d as f64;
        let hi = hi_n as f64 / hi_d as f64;
        let (n, d) = if (lo - frac).abs() <= (hi - frac).abs() {
            (lo_n, lo_d)
        } else {
            (hi_n, hi_d)
        };
        Rational::new(sign * (int_part * d + n), d)
    }
}

impl Default for Rational {
    fn default() -> Self {
        Rational::zero()
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Rational::from_integer(n)
    }
}

impl From<i32> for Rational {
    fn from(n: i32) -> Self {
        Rational::from_integer(n as i64)
    }
}

impl From<(i64, i64)> for Rational {
    fn from((n, d): (i64, i64)) -> Self {
        Rational::new(n, d)
    }
}

impl Add for Rational {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Rational(self.0 + other.0)
    }
}

impl Sub for Rational {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Rational(self.0 - other.0)
    }
}

impl Mul for Rational {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        Rational(self.0 * other.0)
    }
}

impl Div for Rational {
    type Output = Self;
    fn div(self, other: Self) -> Self {
        Rational(self.0 / other.0)
    }
}

impl Neg for Rational {
    type Output = Self;
    fn neg(self) -> Self {
        Rational(-self.0)
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom() == 1 {
            write!(f, "{}", self.numer())
        } else {
            write!(f, "{}/{}", self.numer(), self.denom())
        }
    }
}

/// LCM of a slice of rationals. Used to align polymeter step counts.
pub fn lcm(values: &[Rational]) -> Option<Rational> {
    let mut iter = values.iter();
    let first = iter.next()?;
    let mut acc = first.0;
    for v in iter {
        let n = acc.numer().lcm(v.0.numer());
        let d = acc.denom().gcd(v.0.denom());
        acc = Rational64::new(n, d);
    }
    Some(Rational(acc))
}

/// GCD of a slice of rationals.
pub fn gcd(values: &[Rational]) -> Option<Rational> {
    let mut iter = values.iter();
    let first = iter.next()?;
    let mut acc = first.0;
    for v in iter {
        let n = (acc.numer() * v.0.denom()).gcd(&(v.0.numer() * acc.denom()));
        acc = Rational64::new(n, acc.denom() * v.0.denom());
    }
    Some(Rational(acc))
}
