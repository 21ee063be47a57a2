use super::Amount;
use crate::encoding::{Decode, Encode, Terminated};
use crate::{Error, Result};
use num_rational::Ratio as NumRatio;
use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub};
use rust_decimal::Decimal as NumDecimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::convert::TryFrom;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// An exact rational number with 64-bit numerator and denominator.
///
/// Fractions are not simplified when constructed. Arithmetic is carried out
/// in 128-bit space and the reduced result is narrowed back to 64 bits,
/// failing with [Error::Overflow] if it does not fit. Equality and ordering
/// compare by cross-multiplication, so `1/2 == 2/4`.
///
/// The sign is always carried by the numerator.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fraction {
    numer: i64,
    denom: i64,
}

impl Fraction {
    pub fn new(numer: i64, denom: i64) -> Result<Self> {
        if denom == 0 {
            return Err(Error::DivideByZero);
        }

        if denom < 0 {
            let numer = numer.checked_neg().ok_or(Error::Overflow)?;
            let denom = denom.checked_neg().ok_or(Error::Overflow)?;
            return Ok(Fraction { numer, denom });
        }

        Ok(Fraction { numer, denom })
    }

    pub const fn from_integer(value: i64) -> Self {
        Fraction {
            numer: value,
            denom: 1,
        }
    }

    /// `value / 100`
    pub const fn percent(value: i64) -> Self {
        Fraction {
            numer: value,
            denom: 100,
        }
    }

    pub const fn zero() -> Self {
        Self::from_integer(0)
    }

    pub const fn one() -> Self {
        Self::from_integer(1)
    }

    pub fn numer(&self) -> i64 {
        self.numer
    }

    pub fn denom(&self) -> i64 {
        self.denom
    }

    pub fn is_zero(&self) -> bool {
        self.numer == 0
    }

    pub fn is_negative(&self) -> bool {
        self.numer < 0
    }

    pub fn negate(&self) -> Result<Self> {
        Ok(Fraction {
            numer: self.numer.checked_neg().ok_or(Error::Overflow)?,
            denom: self.denom,
        })
    }

    /// Divides numerator and denominator by their greatest common divisor.
    pub fn simplify(&self) -> Result<Self> {
        Self::narrow(self.wide())
    }

    /// Rounds to the nearest integer, breaking exact ties towards the even
    /// integer (banker's rounding).
    pub fn evaluate(&self) -> Result<i64> {
        let rounded = round_half_even(self.numer as i128, self.denom as i128);
        i64::try_from(rounded).map_err(|_| Error::Overflow)
    }

    /// Rounds towards negative infinity.
    pub fn floor(&self) -> Result<i64> {
        let floored = (self.numer as i128).div_euclid(self.denom as i128);
        i64::try_from(floored).map_err(|_| Error::Overflow)
    }

    /// Rounds to `places` decimal places with banker's rounding, eg. 0.25
    /// becomes 0.2 and 0.15 becomes 0.2 at one place.
    pub fn round(&self, places: u32) -> Result<Self> {
        let scale = 10i128.checked_pow(places).ok_or(Error::Overflow)?;
        let scaled = (self.numer as i128)
            .checked_mul(scale)
            .ok_or(Error::Overflow)?;
        let rounded = round_half_even(scaled, self.denom as i128);
        Self::narrow(NumRatio::new(rounded, scale))
    }

    /// Converts a non-negative fraction into a coin amount with banker's
    /// rounding.
    pub fn amount(&self) -> Result<Amount> {
        if self.is_negative() {
            return Err(Error::Validation("Amounts may not be negative".into()));
        }
        let value = self.evaluate()?;
        Ok(Amount::new(value as u64))
    }

    /// Evaluates `self * mul / div` with banker's rounding. The product is
    /// kept in 128-bit space, so intermediate values may exceed 64 bits as
    /// long as the result fits.
    pub fn mul_div_evaluate(&self, mul: Fraction, div: Fraction) -> Result<i64> {
        if div.is_zero() {
            return Err(Error::DivideByZero);
        }
        let product = self
            .wide()
            .checked_mul(&mul.wide())
            .and_then(|value| value.checked_div(&div.wide()))
            .ok_or(Error::Overflow)?;
        let rounded = round_half_even(*product.numer(), *product.denom());
        i64::try_from(rounded).map_err(|_| Error::Overflow)
    }

    fn wide(&self) -> NumRatio<i128> {
        NumRatio::new_raw(self.numer as i128, self.denom as i128)
    }

    fn narrow(value: NumRatio<i128>) -> Result<Self> {
        let value = value.reduced();
        let numer = i64::try_from(*value.numer()).map_err(|_| Error::Overflow)?;
        let denom = i64::try_from(*value.denom()).map_err(|_| Error::Overflow)?;
        Self::new(numer, denom)
    }
}

fn round_half_even(numer: i128, denom: i128) -> i128 {
    let magnitude = numer.abs();
    let quotient = magnitude / denom;
    let remainder = magnitude % denom;

    let rounded = match (remainder * 2).cmp(&denom) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        Ordering::Equal if quotient % 2 == 0 => quotient,
        Ordering::Equal => quotient + 1,
    };

    if numer < 0 {
        -rounded
    } else {
        rounded
    }
}

impl Add for Fraction {
    type Output = Result<Fraction>;

    fn add(self, other: Fraction) -> Result<Fraction> {
        let sum = self
            .wide()
            .checked_add(&other.wide())
            .ok_or(Error::Overflow)?;
        Self::narrow(sum)
    }
}

impl Sub for Fraction {
    type Output = Result<Fraction>;

    fn sub(self, other: Fraction) -> Result<Fraction> {
        let difference = self
            .wide()
            .checked_sub(&other.wide())
            .ok_or(Error::Overflow)?;
        Self::narrow(difference)
    }
}

impl Mul for Fraction {
    type Output = Result<Fraction>;

    fn mul(self, other: Fraction) -> Result<Fraction> {
        let product = self
            .wide()
            .checked_mul(&other.wide())
            .ok_or(Error::Overflow)?;
        Self::narrow(product)
    }
}

impl Div for Fraction {
    type Output = Result<Fraction>;

    fn div(self, other: Fraction) -> Result<Fraction> {
        if other.is_zero() {
            return Err(Error::DivideByZero);
        }
        let quotient = self
            .wide()
            .checked_div(&other.wide())
            .ok_or(Error::Overflow)?;
        Self::narrow(quotient)
    }
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fraction {}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        // denominators are positive, so cross-multiplying keeps the order
        let lhs = self.numer as i128 * other.denom as i128;
        let rhs = other.numer as i128 * self.denom as i128;
        lhs.cmp(&rhs)
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<i64> for Fraction {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl TryFrom<u64> for Fraction {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        let value = i64::try_from(value).map_err(|_| Error::Overflow)?;
        Ok(Self::from_integer(value))
    }
}

impl TryFrom<Amount> for Fraction {
    type Error = Error;

    fn try_from(amount: Amount) -> Result<Self> {
        Self::try_from(amount.value())
    }
}

impl TryFrom<NumDecimal> for Fraction {
    type Error = Error;

    fn try_from(value: NumDecimal) -> Result<Self> {
        let numer = i64::try_from(value.mantissa()).map_err(|_| Error::Overflow)?;
        let denom = 10i64.checked_pow(value.scale()).ok_or(Error::Overflow)?;
        Self::new(numer, denom)
    }
}

impl std::fmt::Display for Fraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numer, self.denom)
    }
}

/// Parses either `"numer/denom"` or a decimal string such as `"0.07"`.
impl FromStr for Fraction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("Invalid fraction {:?}", s));

        match s.split_once('/') {
            Some((numer, denom)) => {
                let numer = numer.trim().parse().map_err(|_| invalid())?;
                let denom = denom.trim().parse().map_err(|_| invalid())?;
                Self::new(numer, denom)
            }
            None => {
                let value = NumDecimal::from_str(s.trim()).map_err(|_| invalid())?;
                Self::try_from(value)
            }
        }
    }
}

impl TryFrom<String> for Fraction {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Fraction> for String {
    fn from(value: Fraction) -> Self {
        value.to_string()
    }
}

impl Encode for Fraction {
    fn encode_into<W: std::io::Write>(&self, dest: &mut W) -> ed::Result<()> {
        self.numer.encode_into(dest)?;
        self.denom.encode_into(dest)
    }

    fn encoding_length(&self) -> ed::Result<usize> {
        Ok(8 * 2)
    }
}

impl Decode for Fraction {
    fn decode<R: std::io::Read>(mut input: R) -> ed::Result<Self> {
        let numer = i64::decode(&mut input)?;
        let denom = i64::decode(&mut input)?;
        Fraction::new(numer, denom).map_err(|_| ed::Error::UnexpectedByte(0))
    }
}

impl Terminated for Fraction {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn frac(numer: i64, denom: i64) -> Fraction {
        Fraction::new(numer, denom).unwrap()
    }

    #[test]
    fn zero_denominator() {
        assert!(matches!(Fraction::new(1, 0), Err(Error::DivideByZero)));
        assert!(matches!(frac(1, 2) / Fraction::zero(), Err(Error::DivideByZero)));
    }

    #[test]
    fn not_simplified_on_construction() {
        let value = frac(4, 8);
        assert_eq!(value.numer(), 4);
        assert_eq!(value.denom(), 8);

        let simplified = value.simplify().unwrap();
        assert_eq!(simplified.numer(), 1);
        assert_eq!(simplified.denom(), 2);
        assert_eq!(value, simplified);
    }

    #[test]
    fn sign_moves_to_numerator() {
        let value = frac(3, -4);
        assert_eq!(value.numer(), -3);
        assert_eq!(value.denom(), 4);
        assert!(value < Fraction::zero());
        assert!(matches!(Fraction::new(1, i64::MIN), Err(Error::Overflow)));
    }

    #[test]
    fn ops() -> Result<()> {
        let x = frac(3, 1);
        let y = frac(4, 1);
        let z = frac(2, 1);

        let a = ((x * y)? * z)?;
        assert_eq!(a, Fraction::from(24));

        assert_eq!((frac(1, 3) + frac(1, 6))?, frac(1, 2));
        assert_eq!((frac(1, 3) - frac(1, 2))?, frac(-1, 6));
        assert_eq!((frac(2, 3) / frac(4, 9))?, frac(3, 2));
        assert_eq!(frac(2, 3).negate()?, frac(-2, 3));
        Ok(())
    }

    #[test]
    fn ordering() {
        assert!(frac(1, 3) < frac(1, 2));
        assert!(frac(-1, 2) < frac(-1, 3));
        assert_eq!(frac(1, 2).cmp(&frac(50, 100)), Ordering::Equal);
        assert_eq!(frac(2, 4), frac(3, 6));
    }

    #[test]
    fn overflow_is_detected() {
        let big = Fraction::from(i64::MAX);
        assert!(matches!(big + Fraction::one(), Err(Error::Overflow)));
        assert!(matches!(big * frac(3, 1), Err(Error::Overflow)));
        assert!(matches!(Fraction::from(i64::MIN).negate(), Err(Error::Overflow)));
    }

    #[test]
    fn evaluate_bankers_rounding() {
        assert_eq!(frac(5, 100).evaluate().unwrap(), 0);
        assert_eq!(frac(1, 2).evaluate().unwrap(), 0);
        assert_eq!(frac(3, 2).evaluate().unwrap(), 2);
        assert_eq!(frac(5, 2).evaluate().unwrap(), 2);
        assert_eq!(frac(51, 20).evaluate().unwrap(), 3);
        assert_eq!(frac(249, 100).evaluate().unwrap(), 2);
        assert_eq!(frac(-5, 2).evaluate().unwrap(), -2);
        assert_eq!(frac(-7, 2).evaluate().unwrap(), -4);
        assert_eq!(frac(7, 1).evaluate().unwrap(), 7);
    }

    #[test]
    fn mul_div_in_wide_space() {
        let supply = Fraction::from(9_999_999_999_999_999);
        let rate = frac(123_456_789_011, 1_000_000_000_000);
        let hours = frac(876582, 100);
        assert!(matches!(supply * rate, Err(Error::Overflow)));
        assert_eq!(
            supply.mul_div_evaluate(rate, hours).unwrap(),
            140_838_836_539
        );
        assert!(matches!(
            supply.mul_div_evaluate(rate, Fraction::zero()),
            Err(Error::DivideByZero)
        ));
    }

    #[test]
    fn round_to_places() {
        assert_eq!(frac(15, 100).round(1).unwrap(), frac(2, 10));
        assert_eq!(frac(25, 100).round(1).unwrap(), frac(2, 10));
        assert_eq!(frac(35, 100).round(1).unwrap(), frac(4, 10));
        assert_eq!(frac(1, 3).round(3).unwrap(), frac(333, 1000));
        assert_eq!(frac(2, 3).round(0).unwrap(), Fraction::one());
    }

    #[test]
    fn floor() {
        assert_eq!(frac(7, 2).floor().unwrap(), 3);
        assert_eq!(frac(-7, 2).floor().unwrap(), -4);
    }

    #[test]
    fn parse() {
        assert_eq!("7/100".parse::<Fraction>().unwrap(), frac(7, 100));
        assert_eq!("0.07".parse::<Fraction>().unwrap(), frac(7, 100));
        assert_eq!("8765.82".parse::<Fraction>().unwrap(), frac(876582, 100));
        assert_eq!(Fraction::try_from(dec!(0.67)).unwrap(), frac(67, 100));
        assert!("1/0".parse::<Fraction>().is_err());
        assert!("abc".parse::<Fraction>().is_err());
    }

    #[test]
    fn serde_string_form() {
        let json = serde_json::to_string(&frac(13, 100)).unwrap();
        assert_eq!(json, "\"13/100\"");
        let parsed: Fraction = serde_json::from_str("\"0.2\"").unwrap();
        assert_eq!(parsed, frac(1, 5));
    }

    #[test]
    fn encoding() {
        let bytes = frac(-3, 4).encode().unwrap();
        assert_eq!(bytes.len(), 16);
        let decoded = Fraction::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded.numer(), -3);
        assert_eq!(decoded.denom(), 4);

        let zero_denom = [0u8; 16];
        assert!(Fraction::decode(&zero_denom[..]).is_err());
    }

    fn small_fraction() -> impl Strategy<Value = Fraction> {
        (-1_000_000i64..1_000_000, 1i64..1_000_000).prop_map(|(n, d)| frac(n, d))
    }

    proptest! {
        #[test]
        fn add_sub_roundtrip(a in small_fraction(), b in small_fraction()) {
            let sum = (a + b).unwrap();
            prop_assert_eq!((sum - b).unwrap(), a);
        }

        #[test]
        fn mul_div_roundtrip(a in small_fraction(), b in small_fraction()) {
            prop_assume!(!b.is_zero());
            let product = (a * b).unwrap();
            prop_assert_eq!((product / b).unwrap(), a);
        }

        #[test]
        fn evaluate_within_half(a in small_fraction()) {
            let rounded = Fraction::from(a.evaluate().unwrap());
            let distance = (rounded - a).unwrap();
            prop_assert!(distance <= frac(1, 2));
            prop_assert!(distance >= frac(-1, 2));
        }
    }
}
