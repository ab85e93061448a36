use super::{Decimal, Numeric, Posit32};

impl Numeric for f32 {
    type Bits = u32;
    const NAME: &'static str = "float";
    fn zero() -> Self {
        0f32
    }
    fn from_f64(x: f64) -> Self {
        x as f32
    }
    fn from_posit_bits(bits: u32) -> Self {
        Posit32::from_bits(bits).to_f64() as f32
    }
    fn to_bits(&self) -> u32 {
        f32::to_bits(*self)
    }
    fn from_bits(bits: u32) -> Self {
        f32::from_bits(bits)
    }
    fn to_decimal(&self) -> Decimal {
        Decimal::from_f64(*self as f64)
    }
    fn is_nan(&self) -> bool {
        f32::is_nan(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn decode_accelerator_words() {
        let half = Posit32::from_f64(0.5).to_bits();
        assert_eq!(<f32 as Numeric>::from_posit_bits(half), 0.5);
        assert!(<f32 as Numeric>::from_posit_bits(0x8000_0000).is_nan());
        // 2^-240 is far below the f32 range.
        assert_eq!(<f32 as Numeric>::from_posit_bits(1), 0.0);
    }
    #[test]
    fn bits_round_trip() {
        for &x in &[0.0f32, -0.0, 1.5, f32::MAX, f32::MIN_POSITIVE, f32::INFINITY] {
            let bits = Numeric::to_bits(&x);
            assert_eq!(<f32 as Numeric>::from_bits(bits).to_bits(), x.to_bits());
        }
        let nan = <f32 as Numeric>::from_bits(0x7fc0_0001);
        assert!(Numeric::is_nan(&nan));
        assert_eq!(Numeric::to_bits(&nan), 0x7fc0_0001);
    }
    #[test]
    fn widening_is_exact() {
        let x = 0.1f32;
        assert_eq!(x.to_decimal().to_f64(), x as f64);
    }
}
