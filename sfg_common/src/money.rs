use std::{fmt::Display, iter::Sum, ops::Add, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "USD";

//--------------------------------------       Money        ----------------------------------------------------------
/// An exact monetary amount in minor currency units (cents for two-decimal currencies).
///
/// Stored as a signed 64-bit integer so that arithmetic is exact; there is no floating point anywhere in the money
/// path. The payment provider reports amounts in minor units as well, so webhook amounts convert losslessly.
/// `Display` renders the major-unit form with two decimals (`1234` -> `12.34`).
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a monetary amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("{value} is too large for a minor-unit amount")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    /// Parses a major-unit amount with at most two decimals, e.g. `12.34`, `7`, `0.05`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MoneyConversionError(format!("'{s}' is not a valid amount"));
        let (sign, s) = match s.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, s),
        };
        let (major, minor) = match s.split_once('.') {
            Some((maj, min)) if min.len() <= 2 && !min.is_empty() => {
                let scale = if min.len() == 1 { 10 } else { 1 };
                (maj, min.parse::<i64>().map_err(|_| err())? * scale)
            },
            Some(_) => return Err(err()),
            None => (s, 0),
        };
        let major = major.parse::<i64>().map_err(|_| err())?;
        major
            .checked_mul(100)
            .and_then(|v| v.checked_add(minor))
            .and_then(|v| v.checked_mul(sign))
            .map(Self)
            .ok_or_else(err)
    }
}

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn from_major_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// The raw minor-unit value.
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `price × quantity` with overflow detection. Used when totalling an order.
    pub fn checked_mul(self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Self)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}
