use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),
}

/// A monetary amount in BRL. Arithmetic is exact; rounding only happens where
/// a table defines it (`from_decimal`) or at presentation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Rounds to centavos, half away from zero.
    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Parses a pt-BR formatted amount: `.` groups thousands, `,` separates
    /// the decimals (`"1.234,56"`).
    pub fn parse_br(s: &str) -> Result<Self, MoneyError> {
        let normalized = s.trim().replace('.', "").replace(',', ".");
        Decimal::from_str(&normalized)
            .map(Money)
            .map_err(|_| MoneyError::InvalidAmount(s.trim().to_string()))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn amount(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn half(self) -> Self {
        Money(self.0 * Decimal::new(5, 1))
    }

    pub fn times(self, quantity: u64) -> Self {
        Money(self.0 * Decimal::from(quantity))
    }

    /// Arithmetic mean of `total` over `count` entries. `None` when `count`
    /// is zero.
    pub fn mean(total: Money, count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }
        Some(Money(total.0 / Decimal::from(count as u64)))
    }

    /// Two-decimal plain rendering (`"1234.50"`), as written to tabular output.
    pub fn to_plain_string(self) -> String {
        format!(
            "{:.2}",
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R$ {}", self.to_plain_string())
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}
