use std::fmt;
use std::ops::{Add, Mul, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An exact, arbitrary-precision monetary amount.
///
/// Backed by a scaled decimal rather than a float so that
/// `price = Σ items.subTotal` can be checked for exact equality, and by a
/// decimal rather than integer cents so a unit price can itself carry
/// fractional-cent precision during multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn from_i64(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Sums an iterator of money values, short-circuiting on overflow is not
    /// possible with `Decimal` (it panics on overflow instead), which is
    /// acceptable for order-sized amounts.
    pub fn sum<I: IntoIterator<Item = Money>>(amounts: I) -> Money {
        amounts.into_iter().fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Money;

    fn mul(self, rhs: u32) -> Self::Output {
        Money(self.0 * Decimal::from(rhs))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Money(Decimal::from_str_exact(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn addition_is_exact_and_associative() {
        let a = Money::from_str("50.00").unwrap();
        let b = Money::from_str("150.00").unwrap();
        let total = a + b;
        assert_eq!(total, Money::from_str("200.00").unwrap());
    }

    #[test]
    fn multiplication_by_quantity_is_exact() {
        let unit_price = Money::from_str("19.99").unwrap();
        let subtotal = unit_price * 3;
        assert_eq!(subtotal, Money::from_str("59.97").unwrap());
    }

    #[test]
    fn zero_and_sign_checks() {
        assert!(Money::ZERO.is_zero());
        assert!(!Money::ZERO.is_negative());
        assert!(Money::from_str("-1").unwrap().is_negative());
        assert!(Money::from_str("1").unwrap().is_positive());
    }

    #[test]
    fn sum_over_items_matches_sequential_addition() {
        let items = vec![
            Money::from_str("50").unwrap(),
            Money::from_str("150").unwrap(),
        ];
        assert_eq!(Money::sum(items), Money::from_str("200").unwrap());
    }
}
