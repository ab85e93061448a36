//! Number representations the forward recurrence can run on.
//!
//! The same recurrence is evaluated with posits (the accelerator format),
//! IEEE single precision, and a wide decimal which serves as the oracle.
pub mod decimal;
pub mod float;
pub mod posit;
pub use decimal::Decimal;
pub use posit::{Posit, Posit32};

use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul};

/// A value type the forward engine can be instantiated with.
pub trait Numeric:
    Clone
    + Debug
    + Display
    + PartialOrd
    + Send
    + Sync
    + Add<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// Raw representation, used to compare results bit for bit.
    type Bits: Clone + Debug + PartialEq + Send + Sync;
    /// Short label for logs and reports.
    const NAME: &'static str;
    fn zero() -> Self;
    fn from_f64(x: f64) -> Self;
    /// Decodes a word of the accelerator's number format.
    fn from_posit_bits(bits: u32) -> Self;
    fn to_bits(&self) -> Self::Bits;
    fn from_bits(bits: Self::Bits) -> Self;
    /// Exact widening into the comparison representation.
    fn to_decimal(&self) -> Decimal;
    fn is_nan(&self) -> bool;
}
