use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of decimal places carried by [`Price`] and [`Qty`].
pub const PRECISION: u32 = 8;

/// Units per whole price or quantity.
pub const SCALE: i64 = 10_i64.pow(PRECISION);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty decimal string")]
    Empty,
    #[error("invalid decimal `{0}`")]
    Invalid(String),
    #[error("`{0}` has more than {PRECISION} significant decimals")]
    Precision(String),
    #[error("`{0}` is out of range")]
    Overflow(String),
}

fn parse_units(raw: &str) -> Result<i64, ParseError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ParseError::Empty);
    }

    let (negative, digits) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

    if whole.is_empty() && frac.is_empty() {
        return Err(ParseError::Invalid(raw.to_string()));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::Invalid(raw.to_string()));
    }

    let kept = frac.len().min(PRECISION as usize);
    if frac[kept..].bytes().any(|b| b != b'0') {
        return Err(ParseError::Precision(raw.to_string()));
    }

    let whole_units: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<i64>()
            .map_err(|_| ParseError::Overflow(raw.to_string()))?
    };

    let mut frac_units: i64 = 0;
    for b in frac[..kept].bytes() {
        frac_units = frac_units * 10 + i64::from(b - b'0');
    }
    frac_units *= 10_i64.pow(PRECISION - kept as u32);

    let units = whole_units
        .checked_mul(SCALE)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or_else(|| ParseError::Overflow(raw.to_string()))?;

    Ok(if negative { -units } else { units })
}

fn fmt_units(units: i64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if units < 0 { "-" } else { "" };
    let abs = units.unsigned_abs();
    let scale = SCALE as u64;
    write!(
        f,
        "{sign}{}.{:0width$}",
        abs / scale,
        abs % scale,
        width = PRECISION as usize
    )
}

fn units_from_f64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let scaled = (value * SCALE as f64).round();
    if scaled >= i64::MAX as f64 {
        i64::MAX
    } else if scaled <= i64::MIN as f64 {
        i64::MIN
    } else {
        scaled as i64
    }
}

fn de_units<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(f64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Str(s) => parse_units(&s).map_err(serde::de::Error::custom),
        Raw::Num(n) => Ok(units_from_f64(n)),
    }
}

/// Fixed-point price, `units` are 10^-8 of the quote currency.
///
/// Used as the canonical key of a price level: two decimal strings that denote
/// the same value always map to the same `Price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price {
    pub units: i64,
}

impl Price {
    pub const ZERO: Price = Price { units: 0 };

    pub const fn from_units(units: i64) -> Self {
        Self { units }
    }

    pub fn from_f64(value: f64) -> Self {
        Self::from_units(units_from_f64(value))
    }

    pub fn to_f64(self) -> f64 {
        self.units as f64 / SCALE as f64
    }

    /// Multiplies the price by `factor`, rounding back onto the fixed-point grid.
    pub fn scaled(self, factor: f64) -> Self {
        Self::from_f64(self.to_f64() * factor)
    }
}

impl FromStr for Price {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_units(s).map(Self::from_units)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_units(self.units, f)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        de_units(deserializer).map(Self::from_units)
    }
}

/// Fixed-point, signed volume. Negative values only appear as deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Qty {
    pub units: i64,
}

impl Qty {
    pub const ZERO: Qty = Qty { units: 0 };

    pub const fn from_units(units: i64) -> Self {
        Self { units }
    }

    pub fn from_f64(value: f64) -> Self {
        Self::from_units(units_from_f64(value))
    }

    pub fn to_f64(self) -> f64 {
        self.units as f64 / SCALE as f64
    }

    pub fn is_negative(self) -> bool {
        self.units < 0
    }

    /// Clamps negative values to zero.
    pub fn non_negative(self) -> Self {
        Self::from_units(self.units.max(0))
    }
}

impl num_traits::Zero for Qty {
    fn zero() -> Self {
        Qty::ZERO
    }

    fn is_zero(&self) -> bool {
        self.units == 0
    }
}

impl Add for Qty {
    type Output = Qty;

    fn add(self, rhs: Qty) -> Qty {
        Qty::from_units(self.units.saturating_add(rhs.units))
    }
}

impl AddAssign for Qty {
    fn add_assign(&mut self, rhs: Qty) {
        *self = *self + rhs;
    }
}

impl Sub for Qty {
    type Output = Qty;

    fn sub(self, rhs: Qty) -> Qty {
        Qty::from_units(self.units.saturating_sub(rhs.units))
    }
}

impl SubAssign for Qty {
    fn sub_assign(&mut self, rhs: Qty) {
        *self = *self - rhs;
    }
}

impl Neg for Qty {
    type Output = Qty;

    fn neg(self) -> Qty {
        Qty::from_units(self.units.saturating_neg())
    }
}

impl std::iter::Sum for Qty {
    fn sum<I: Iterator<Item = Qty>>(iter: I) -> Qty {
        iter.fold(Qty::ZERO, Add::add)
    }
}

impl FromStr for Qty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_units(s).map(Self::from_units)
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_units(self.units, f)
    }
}

impl Serialize for Qty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Qty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        de_units(deserializer).map(Self::from_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_decimals_share_a_key() {
        let a: Price = "1.0".parse().unwrap();
        let b: Price = "1.00000000".parse().unwrap();
        let c: Price = "01.000".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.units, 100_000_000);
    }

    #[test]
    fn parses_fractional_and_signed() {
        assert_eq!("0.00012345".parse::<Price>().unwrap().units, 12_345);
        assert_eq!(".5".parse::<Qty>().unwrap().units, 50_000_000);
        assert_eq!("-2.5".parse::<Qty>().unwrap().units, -250_000_000);
    }

    #[test]
    fn rejects_garbage_and_excess_precision() {
        assert!(matches!("".parse::<Price>(), Err(ParseError::Empty)));
        assert!(matches!("1.2.3".parse::<Price>(), Err(ParseError::Invalid(_))));
        assert!(matches!("abc".parse::<Qty>(), Err(ParseError::Invalid(_))));
        assert!(matches!(
            "0.123456789".parse::<Qty>(),
            Err(ParseError::Precision(_))
        ));
        // trailing zeros past the precision are harmless
        assert!("0.1234567800".parse::<Qty>().is_ok());
    }

    #[test]
    fn display_is_fixed_precision() {
        assert_eq!(Price::from_units(230_000_000).to_string(), "2.30000000");
        assert_eq!(Qty::from_units(-5).to_string(), "-0.00000005");
    }

    #[test]
    fn saturating_arithmetic() {
        let max = Qty::from_units(i64::MAX);
        assert_eq!((max + Qty::from_units(1)).units, i64::MAX);
        assert_eq!((Qty::ZERO - Qty::from_units(3)).non_negative(), Qty::ZERO);
    }

    #[test]
    fn serde_accepts_strings_and_numbers() {
        let p: Price = serde_json::from_str("\"2.30\"").unwrap();
        let q: Qty = serde_json::from_str("18.2").unwrap();
        assert_eq!(p.units, 230_000_000);
        assert_eq!(q.units, 1_820_000_000);
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"2.30000000\"");
    }
}
