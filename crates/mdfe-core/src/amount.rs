//! Fixed two-decimal amounts
//!
//! Monetary values and weights are carried as integer hundredths so the
//! rendered text is exact and locale-independent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Non-float decimal with exactly two fractional digits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "AmountRepr", into = "String")]
pub struct Decimal2(i64);

impl Decimal2 {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// From hundredths (`1050` → `10.50`)
    #[inline]
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// From whole units (`10` → `10.00`)
    #[inline]
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// Raw hundredths
    #[inline]
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// True when strictly greater than zero
    #[inline]
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Decimal2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Error for unparsable amount text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid decimal amount: '{0}'")]
pub struct AmountParseError(pub String);

impl FromStr for Decimal2 {
    type Err = AmountParseError;

    /// Accepts `123`, `123.4`, `123.45`, `-1.5`. More than two fractional
    /// digits is rejected rather than rounded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AmountParseError(s.to_string());
        let text = s.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty()
            || frac_part.len() > 2
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err());
        }

        let units: i64 = int_part.parse().map_err(|_| err())?;
        let frac: i64 = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<i64>().map_err(|_| err())? * 10,
            _ => frac_part.parse().map_err(|_| err())?,
        };
        let cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(err)?;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl TryFrom<AmountRepr> for Decimal2 {
    type Error = AmountParseError;

    fn try_from(value: AmountRepr) -> Result<Self, Self::Error> {
        match value {
            AmountRepr::Text(text) => text.parse(),
            AmountRepr::Integer(units) => units
                .checked_mul(100)
                .map(Self)
                .ok_or_else(|| AmountParseError(units.to_string())),
            #[allow(clippy::cast_possible_truncation)]
            AmountRepr::Float(value) if value.is_finite() => Ok(Self((value * 100.0).round() as i64)),
            AmountRepr::Float(value) => Err(AmountParseError(value.to_string())),
        }
    }
}

impl From<Decimal2> for String {
    fn from(value: Decimal2) -> Self {
        value.to_string()
    }
}
