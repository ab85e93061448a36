//! 32-bit posit numbers with a configurable exponent size.
//!
//! Every operation decodes both operands into a sign, a binary scale and a
//! 64-bit significand, computes the exact result with integer arithmetic,
//! and rounds once (to nearest, ties to even) when packing back into 32 bits.
//! Posits saturate: nothing rounds to zero or to NaR except zero and NaR themselves.
use super::{Decimal, Numeric};
use std::cmp::Ordering;
use std::ops::{Add, Div, Mul};

/// The number format of the accelerator.
pub type Posit32 = Posit<3>;

const NAR_BITS: u32 = 0x8000_0000;
const MAXPOS_BITS: u32 = 0x7FFF_FFFF;
const MINPOS_BITS: u32 = 0x0000_0001;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Posit<const ES: u32>(u32);

/// A nonzero real posit: (-1)^neg * sig * 2^(scale - 63), top bit of sig set.
#[derive(Debug, Clone, Copy)]
struct Unpacked {
    neg: bool,
    scale: i32,
    sig: u64,
}

impl<const ES: u32> Posit<ES> {
    pub const ZERO: Self = Posit(0);
    pub const ONE: Self = Posit(0x4000_0000);
    pub const NAR: Self = Posit(NAR_BITS);
    pub const MAXPOS: Self = Posit(MAXPOS_BITS);
    pub const MINPOS: Self = Posit(MINPOS_BITS);
    /// log2 of the largest posit.
    pub const MAX_SCALE: i32 = 30 << ES;
    pub const fn from_bits(bits: u32) -> Self {
        Posit(bits)
    }
    pub const fn to_bits(self) -> u32 {
        self.0
    }
    pub fn is_nar(self) -> bool {
        self.0 == NAR_BITS
    }
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
    pub fn is_negative(self) -> bool {
        (self.0 as i32) < 0 && !self.is_nar()
    }
    fn unpack(self) -> Option<Unpacked> {
        if self.0 == 0 || self.0 == NAR_BITS {
            return None;
        }
        let neg = self.0 & NAR_BITS != 0;
        let abs = if neg { self.0.wrapping_neg() } else { self.0 };
        let body = abs << 1;
        let (run, k) = if body & NAR_BITS != 0 {
            let run = body.leading_ones();
            (run, run as i32 - 1)
        } else {
            let run = body.leading_zeros();
            (run, -(run as i32))
        };
        let rest = body.checked_shl(run + 1).unwrap_or(0);
        let exp = rest.checked_shr(32 - ES).unwrap_or(0);
        let frac = rest.checked_shl(ES).unwrap_or(0);
        let scale = k * (1 << ES) + exp as i32;
        let sig = (1 << 63) | ((frac as u64) << 31);
        Some(Unpacked { neg, scale, sig })
    }
    fn pack(neg: bool, scale: i32, sig: u64, sticky: bool) -> Self {
        debug_assert_eq!(sig >> 63, 1);
        let body = if scale > Self::MAX_SCALE {
            MAXPOS_BITS
        } else if scale < -Self::MAX_SCALE {
            MINPOS_BITS
        } else {
            let k = scale >> ES;
            let exp = (scale - k * (1 << ES)) as u128;
            let (regime, regime_len) = if k >= 0 {
                let ones = k as u32 + 1;
                (((1u128 << ones) - 1) << 1, ones + 1)
            } else {
                (1u128, (-k) as u32 + 1)
            };
            let frac = (sig << 1) as u128;
            let bits = (((regime << ES) | exp) << 64) | frac;
            let shift = regime_len + ES + 64 - 31;
            let mut body = (bits >> shift) as u32;
            let guard = (bits >> (shift - 1)) & 1 == 1;
            let rest = bits & ((1 << (shift - 1)) - 1) != 0 || sticky;
            if guard && (rest || body & 1 == 1) {
                body += 1;
            }
            body
        };
        if neg {
            Posit(body.wrapping_neg())
        } else {
            Posit(body)
        }
    }
    /// Exact conversion. NaR becomes NaN.
    pub fn to_f64(self) -> f64 {
        match self.unpack() {
            Some(Unpacked { neg, scale, sig }) => {
                let mantissa = (sig >> 32) as f64;
                let value = mantissa * pow2(scale - 31);
                if neg {
                    -value
                } else {
                    value
                }
            }
            None if self.is_nar() => f64::NAN,
            None => 0.0,
        }
    }
    /// Rounds `x` to the nearest posit. Infinities and NaN become NaR.
    pub fn from_f64(x: f64) -> Self {
        if x == 0.0 {
            return Self::ZERO;
        } else if !x.is_finite() {
            return Self::NAR;
        }
        let bits = x.to_bits();
        let neg = bits >> 63 == 1;
        let biased = ((bits >> 52) & 0x7FF) as i32;
        let frac = bits & ((1 << 52) - 1);
        let (mantissa, exp) = if biased == 0 {
            (frac, -1074)
        } else {
            (frac | (1 << 52), biased - 1075)
        };
        let lead = 63 - mantissa.leading_zeros() as i32;
        let sig = mantissa << (63 - lead);
        Self::pack(neg, exp + lead, sig, false)
    }
    /// True if `x` survives a round trip through this format unchanged.
    pub fn is_exact(x: f64) -> bool {
        Self::from_f64(x).to_f64() == x
    }
}

// 2^e for e within the normal range of f64.
fn pow2(e: i32) -> f64 {
    debug_assert!((-1022..=1023).contains(&e));
    f64::from_bits(((e + 1023) as u64) << 52)
}

fn shift_right_sticky(value: u128, shift: u32) -> (u128, bool) {
    if shift >= 128 {
        (0, value != 0)
    } else {
        (value >> shift, value & ((1 << shift) - 1) != 0)
    }
}

// Brings the leading one of a nonzero value to bit 63 of a u64.
fn normalize(value: u128) -> (i32, u64, bool) {
    let top = 127 - value.leading_zeros() as i32;
    if top >= 63 {
        let (sig, sticky) = shift_right_sticky(value, (top - 63) as u32);
        (top, sig as u64, sticky)
    } else {
        (top, (value << (63 - top)) as u64, false)
    }
}

impl<const ES: u32> Add for Posit<ES> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        if self.is_nar() || rhs.is_nar() {
            return Self::NAR;
        }
        let (a, b) = match (self.unpack(), rhs.unpack()) {
            (None, _) => return rhs,
            (_, None) => return self,
            (Some(a), Some(b)) => (a, b),
        };
        let (big, small) = if (a.scale, a.sig) >= (b.scale, b.sig) {
            (a, b)
        } else {
            (b, a)
        };
        let x = (big.sig as u128) << 62;
        let gap = (big.scale - small.scale) as u32;
        let (mut y, lost) = shift_right_sticky((small.sig as u128) << 62, gap);
        if lost {
            y |= 1;
        }
        let sum = if big.neg == small.neg { x + y } else { x - y };
        if sum == 0 {
            return Self::ZERO;
        }
        let (top, sig, sticky) = normalize(sum);
        Self::pack(big.neg, big.scale + top - 125, sig, sticky)
    }
}

impl<const ES: u32> Mul for Posit<ES> {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        if self.is_nar() || rhs.is_nar() {
            return Self::NAR;
        }
        let (a, b) = match (self.unpack(), rhs.unpack()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Self::ZERO,
        };
        let product = (a.sig as u128) * (b.sig as u128);
        let (top, sig, sticky) = normalize(product);
        Self::pack(a.neg != b.neg, a.scale + b.scale + top - 126, sig, sticky)
    }
}

impl<const ES: u32> Div for Posit<ES> {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        if self.is_nar() || rhs.is_nar() || rhs.is_zero() {
            return Self::NAR;
        }
        let (a, b) = match (self.unpack(), rhs.unpack()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Self::ZERO,
        };
        let numerator = (a.sig as u128) << 64;
        let denominator = b.sig as u128;
        let (quotient, remainder) = (numerator / denominator, numerator % denominator);
        let (top, sig, sticky) = normalize(quotient);
        let scale = a.scale - b.scale + top - 64;
        Self::pack(a.neg != b.neg, scale, sig, sticky || remainder != 0)
    }
}

// Posits order like two's complement integers; NaR sorts below everything.
impl<const ES: u32> Ord for Posit<ES> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.0 as i32).cmp(&(other.0 as i32))
    }
}

impl<const ES: u32> PartialOrd for Posit<ES> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const ES: u32> std::fmt::Display for Posit<ES> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_nar() {
            write!(f, "NaR")
        } else {
            write!(f, "{:e}", self.to_f64())
        }
    }
}

impl<const ES: u32> std::fmt::Debug for Posit<ES> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Posit<32,{}>({:#010x})", ES, self.0)
    }
}

impl<const ES: u32> Numeric for Posit<ES> {
    type Bits = u32;
    const NAME: &'static str = "posit";
    fn zero() -> Self {
        Self::ZERO
    }
    fn from_f64(x: f64) -> Self {
        Posit::from_f64(x)
    }
    fn from_posit_bits(bits: u32) -> Self {
        if ES == 3 {
            Posit(bits)
        } else {
            Posit::from_f64(Posit32::from_bits(bits).to_f64())
        }
    }
    fn to_bits(&self) -> u32 {
        self.0
    }
    fn from_bits(bits: u32) -> Self {
        Posit(bits)
    }
    fn to_decimal(&self) -> Decimal {
        if self.is_nar() {
            Decimal::NaN
        } else {
            Decimal::from_f64(self.to_f64())
        }
    }
    fn is_nan(&self) -> bool {
        self.is_nar()
    }
}
