//! Wide decimal numbers used as the reference for accuracy measurements.
use super::{Numeric, Posit32};
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::{ToPrimitive, Zero};
use std::cmp::Ordering;
use std::convert::TryFrom;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Significant decimal digits kept after every multiplication and division.
pub const PRECISION: u64 = 100;

const TAG_FINITE: u8 = 0;
const TAG_POS_INF: u8 = 1;
const TAG_NEG_INF: u8 = 2;
const TAG_NAN: u8 = 3;

/// A 100-digit decimal, extended with infinities and NaN so that division by
/// zero has a value instead of a panic.
#[derive(Clone, Debug)]
pub enum Decimal {
    Finite(BigDecimal),
    Infinite { negative: bool },
    NaN,
}

impl Decimal {
    pub fn zero() -> Self {
        Decimal::Finite(BigDecimal::zero())
    }
    /// Exact conversion.
    pub fn from_f64(x: f64) -> Self {
        if x.is_nan() {
            Decimal::NaN
        } else if x.is_infinite() {
            Decimal::Infinite { negative: x < 0.0 }
        } else {
            BigDecimal::try_from(x)
                .map(Decimal::Finite)
                .unwrap_or(Decimal::NaN)
        }
    }
    pub fn is_nan(&self) -> bool {
        matches!(self, Decimal::NaN)
    }
    pub fn is_zero(&self) -> bool {
        match self {
            Decimal::Finite(x) => x.is_zero(),
            _ => false,
        }
    }
    pub fn is_infinite(&self) -> bool {
        matches!(self, Decimal::Infinite { .. })
    }
    /// -1, 0, or 1. NaN has no sign and reports 0.
    pub fn signum(&self) -> i8 {
        match self {
            Decimal::Finite(x) => match x.sign() {
                Sign::Minus => -1,
                Sign::NoSign => 0,
                Sign::Plus => 1,
            },
            Decimal::Infinite { negative: true } => -1,
            Decimal::Infinite { negative: false } => 1,
            Decimal::NaN => 0,
        }
    }
    pub fn abs(&self) -> Self {
        match self {
            Decimal::Finite(x) => Decimal::Finite(x.abs()),
            Decimal::Infinite { .. } => Decimal::Infinite { negative: false },
            Decimal::NaN => Decimal::NaN,
        }
    }
    /// Nearest f64. Magnitudes beyond the f64 range saturate to zero or infinity.
    pub fn to_f64(&self) -> f64 {
        match self {
            Decimal::Finite(x) => x.to_f64().unwrap_or(f64::NAN),
            Decimal::Infinite { negative: true } => f64::NEG_INFINITY,
            Decimal::Infinite { negative: false } => f64::INFINITY,
            Decimal::NaN => f64::NAN,
        }
    }
    /// log10(|self|), accurate to f64 precision even when |self| itself does
    /// not fit into an f64.
    pub fn log10_abs(&self) -> f64 {
        match self {
            Decimal::NaN => f64::NAN,
            Decimal::Infinite { .. } => f64::INFINITY,
            Decimal::Finite(x) if x.is_zero() => f64::NEG_INFINITY,
            Decimal::Finite(x) => {
                let (int, scale) = x.as_bigint_and_exponent();
                let digits = int.magnitude().to_string();
                let lead_len = digits.len().min(17);
                let lead: f64 = digits[..lead_len].parse().unwrap_or(f64::NAN);
                lead.log10() + (digits.len() - lead_len) as f64 - scale as f64
            }
        }
    }
    /// Raw encoding: a tag byte, then for finite values the scale as eight
    /// little-endian bytes followed by the two's complement digits.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Decimal::Finite(x) => {
                let (int, scale) = x.as_bigint_and_exponent();
                let mut bytes = vec![TAG_FINITE];
                bytes.extend_from_slice(&scale.to_le_bytes());
                bytes.extend(int.to_signed_bytes_le());
                bytes
            }
            Decimal::Infinite { negative: false } => vec![TAG_POS_INF],
            Decimal::Infinite { negative: true } => vec![TAG_NEG_INF],
            Decimal::NaN => vec![TAG_NAN],
        }
    }
    /// Inverse of `to_bytes`. Malformed input decodes to NaN.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes.split_first() {
            Some((&TAG_FINITE, rest)) if rest.len() > 8 => {
                let mut scale = [0u8; 8];
                scale.copy_from_slice(&rest[..8]);
                let int = BigInt::from_signed_bytes_le(&rest[8..]);
                Decimal::Finite(BigDecimal::new(int, i64::from_le_bytes(scale)))
            }
            Some((&TAG_POS_INF, [])) => Decimal::Infinite { negative: false },
            Some((&TAG_NEG_INF, [])) => Decimal::Infinite { negative: true },
            _ => Decimal::NaN,
        }
    }
    fn finite(x: BigDecimal) -> Self {
        Decimal::Finite(x.with_prec(PRECISION))
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Decimal::zero()
    }
}

impl Neg for Decimal {
    type Output = Self;
    fn neg(self) -> Self {
        match self {
            Decimal::Finite(x) => Decimal::Finite(-x),
            Decimal::Infinite { negative } => Decimal::Infinite {
                negative: !negative,
            },
            Decimal::NaN => Decimal::NaN,
        }
    }
}

impl Add for Decimal {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        use Decimal::*;
        match (self, rhs) {
            (NaN, _) | (_, NaN) => NaN,
            (Finite(a), Finite(b)) => Decimal::finite(a + b),
            (Infinite { negative: a }, Infinite { negative: b }) if a != b => NaN,
            (inf @ Infinite { .. }, _) | (_, inf @ Infinite { .. }) => inf,
        }
    }
}

impl Sub for Decimal {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Mul for Decimal {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        use Decimal::*;
        let negative = self.signum() * rhs.signum() < 0;
        match (self, rhs) {
            (NaN, _) | (_, NaN) => NaN,
            (Finite(a), Finite(b)) => Decimal::finite(a * b),
            (Finite(x), Infinite { .. }) | (Infinite { .. }, Finite(x)) if x.is_zero() => NaN,
            _ => Infinite { negative },
        }
    }
}

impl Div for Decimal {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        use Decimal::*;
        let negative = self.signum() * rhs.signum() < 0;
        match (self, rhs) {
            (NaN, _) | (_, NaN) => NaN,
            (Infinite { .. }, Infinite { .. }) => NaN,
            (Finite(a), Finite(b)) if b.is_zero() => {
                match a.sign() {
                    Sign::NoSign => NaN,
                    Sign::Plus => Infinite { negative: false },
                    Sign::Minus => Infinite { negative: true },
                }
            }
            (Finite(a), Finite(b)) => Decimal::finite(a / b),
            (Finite(_), Infinite { .. }) => Decimal::zero(),
            (Infinite { negative: a }, Finite(b)) if b.is_zero() => Infinite { negative: a },
            (Infinite { .. }, Finite(_)) => Infinite { negative },
        }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use Decimal::*;
        match (self, other) {
            (NaN, _) | (_, NaN) => None,
            (Finite(a), Finite(b)) => a.partial_cmp(b),
            (Infinite { negative: a }, Infinite { negative: b }) => Some(b.cmp(a)),
            (Infinite { negative }, Finite(_)) => Some(if *negative {
                Ordering::Less
            } else {
                Ordering::Greater
            }),
            (Finite(_), Infinite { negative }) => Some(if *negative {
                Ordering::Greater
            } else {
                Ordering::Less
            }),
        }
    }
}

impl std::fmt::Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decimal::Finite(x) => write!(f, "{}", x.normalized()),
            Decimal::Infinite { negative: true } => write!(f, "-inf"),
            Decimal::Infinite { negative: false } => write!(f, "inf"),
            Decimal::NaN => write!(f, "nan"),
        }
    }
}

impl Numeric for Decimal {
    type Bits = Vec<u8>;
    const NAME: &'static str = "decimal";
    fn zero() -> Self {
        Decimal::zero()
    }
    fn from_f64(x: f64) -> Self {
        Decimal::from_f64(x)
    }
    fn from_posit_bits(bits: u32) -> Self {
        Posit32::from_bits(bits).to_decimal()
    }
    fn to_bits(&self) -> Vec<u8> {
        self.to_bytes()
    }
    fn from_bits(bits: Vec<u8>) -> Self {
        Decimal::from_bytes(&bits)
    }
    fn to_decimal(&self) -> Decimal {
        self.clone()
    }
    fn is_nan(&self) -> bool {
        Decimal::is_nan(self)
    }
}
