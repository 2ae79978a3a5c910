use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const RM_CURRENCY_CODE: &str = "MYR";
pub const RM_CURRENCY_CODE_LOWER: &str = "myr";

//--------------------------------------       Money        ----------------------------------------------------------
/// A signed monetary amount in sen (cents of RM). All ledger arithmetic happens on this type so that
/// rounding is never an issue at the storage layer.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in sen: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to Money", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}RM{}.{:02}", cents / 100, cents % 100)
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Whole ringgit, e.g. `Money::from_rm(10)` is RM10.00
    pub fn from_rm(rm: i64) -> Self {
        Self(rm * 100)
    }

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_formats_rm_and_sen() {
        assert_eq!(Money::from_rm(10).to_string(), "RM10.00");
        assert_eq!(Money::from_cents(1050).to_string(), "RM10.50");
        assert_eq!(Money::from_cents(5).to_string(), "RM0.05");
        assert_eq!(Money::from_cents(-950).to_string(), "-RM9.50");
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_rm(20);
        let b = Money::from_cents(1050);
        assert_eq!(a - b, Money::from_cents(950));
        assert_eq!(-b, Money::from_cents(-1050));
        assert_eq!(b * 2, Money::from_cents(2100));
        let total: Money = [a, b, -b].into_iter().sum();
        assert_eq!(total, a);
    }
}
