use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_CODE: &str = "KES";

const CENTS_PER_UNIT: i64 = 100;
const BASIS_POINTS: i64 = 10_000;

//--------------------------------------       Money         ---------------------------------------------------------
/// A currency-precise amount, held as an integer number of minor units (cents).
///
/// On the wire, amounts are written as a decimal number of major units (e.g. `4030.5`), which is what storefront
/// clients expect. Internally all arithmetic happens on the integer representation, so totals never drift.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    /// Saturates at the representable range. Use [`Money::checked_mul`] where an overflow must be reported.
    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0.saturating_mul(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a currency amount: {0}")]
pub struct MoneyConversionError(String);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn from_units(units: i64) -> Self {
        Self(units * CENTS_PER_UNIT)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// The amount in whole currency units, rounded up. Mobile-money gateways only accept whole units, and rounding up
    /// guarantees the customer is never asked for less than the order total.
    pub fn whole_units_ceil(&self) -> i64 {
        (self.0 + CENTS_PER_UNIT - 1).div_euclid(CENTS_PER_UNIT)
    }

    /// Calculates `rate_bps` basis points of this amount (100 bps = 1%), rounding half away from zero to the nearest
    /// cent.
    pub fn basis_points(&self, rate_bps: u32) -> Self {
        let raw = self.0 as i128 * rate_bps as i128;
        let half = (BASIS_POINTS / 2) as i128;
        let rounded = if raw >= 0 { (raw + half) / BASIS_POINTS as i128 } else { (raw - half) / BASIS_POINTS as i128 };
        #[allow(clippy::cast_possible_truncation)]
        Self(rounded as i64)
    }

    pub fn try_from_units_f64(units: f64) -> Result<Self, MoneyConversionError> {
        if !units.is_finite() {
            return Err(MoneyConversionError(format!("{units} is not a finite number")));
        }
        let cents = (units * CENTS_PER_UNIT as f64).round();
        if cents.abs() > i64::MAX as f64 / 2.0 {
            return Err(MoneyConversionError(format!("{units} is too large")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(cents as i64))
    }

    pub fn as_units_f64(&self) -> f64 {
        self.0 as f64 / CENTS_PER_UNIT as f64
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{CURRENCY_CODE} {sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_units_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let units = f64::deserialize(deserializer)?;
        Money::try_from_units_f64(units).map_err(de::Error::custom)
    }
}
