//! Scalar element types for benchmark matrices

use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul, Neg, Sub};

use rand::distr::uniform::SampleUniform;

/// Real scalar type a batched kernel operates on.
///
/// The harness is generic over single- and double-precision elements; the
/// trait carries the handful of operations the generators and the host
/// kernel provider need.
pub trait Scalar:
    Copy
    + Send
    + Sync
    + Debug
    + Display
    + PartialOrd
    + SampleUniform
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Additive identity
    fn zero() -> Self;
    /// Multiplicative identity
    fn one() -> Self;
    /// Lossy conversion from f64
    fn from_f64(v: f64) -> Self;
    /// Widening conversion to f64
    fn to_f64(self) -> f64;
    /// Absolute value
    fn abs_val(self) -> Self;
    /// Square root
    fn sqrt_val(self) -> Self;
    /// Machine epsilon for this type
    fn epsilon_val() -> f64;
}

impl Scalar for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }
    #[inline]
    fn one() -> Self {
        1.0
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
    #[inline]
    fn abs_val(self) -> Self {
        self.abs()
    }
    #[inline]
    fn sqrt_val(self) -> Self {
        self.sqrt()
    }
    #[inline]
    fn epsilon_val() -> f64 {
        f32::EPSILON as f64
    }
}

impl Scalar for f64 {
    #[inline]
    fn zero() -> Self {
        0.0
    }
    #[inline]
    fn one() -> Self {
        1.0
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
    #[inline]
    fn abs_val(self) -> Self {
        self.abs()
    }
    #[inline]
    fn sqrt_val(self) -> Self {
        self.sqrt()
    }
    #[inline]
    fn epsilon_val() -> f64 {
        f64::EPSILON
    }
}
