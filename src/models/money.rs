//! Money type for representing currency amounts
//!
//! Internally stores amounts in cents (i64) to avoid floating-point precision
//! issues. The operators saturate at the i64 bounds; aggregations that feed
//! decisions use the `checked_*` methods instead. Also provides formatting
//! and conversion to `rust_decimal::Decimal` for ratio computations.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Default currency symbol (Brazilian real)
pub const DEFAULT_CURRENCY_SYMBOL: &str = "R$";

/// Largest amount a single record may carry: R$ 1 trillion
pub const MAX_AMOUNT: Money = Money(100_000_000_000_000);

/// Represents a monetary amount stored as cents (hundredths of the currency unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use mendoza_contas::models::Money;
    /// let amount = Money::from_cents(1050); // R$ 10.50
    /// assert_eq!(amount.cents(), 1050);
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a zero Money amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the amount in cents
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Get the whole units portion (truncated toward zero)
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Get the cents portion (0-99)
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Get the absolute value
    pub const fn abs(&self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Whether the amount is within `MAX_AMOUNT` in either direction
    pub const fn is_within_limit(&self) -> bool {
        self.0.saturating_abs() <= MAX_AMOUNT.0
    }

    /// Clamp negative amounts to zero
    pub fn non_negative(self) -> Self {
        if self.is_negative() {
            Self::zero()
        } else {
            self
        }
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn checked_neg(self) -> Option<Self> {
        self.0.checked_neg().map(Self)
    }

    /// Sum of `amounts`, or `None` if any partial total leaves the i64 range
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::zero(), |total, amount| total.checked_add(amount))
    }

    /// Exact decimal value in currency units (e.g. 1050 cents -> 10.50)
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Convert a decimal amount in currency units to Money
    ///
    /// Rounds to the nearest cent, midpoints away from zero. `None` when the
    /// result does not fit in i64 cents.
    pub fn checked_from_decimal(value: Decimal) -> Option<Self> {
        value
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
    }

    /// Like `checked_from_decimal`, saturating at the i64 bounds
    pub fn from_decimal(value: Decimal) -> Self {
        Self::checked_from_decimal(value).unwrap_or(if value.is_sign_negative() {
            Self(i64::MIN)
        } else {
            Self(i64::MAX)
        })
    }

    /// Parse a money amount from a string
    ///
    /// Accepts formats: "10.50", "-10.50", "R$ 10.50", "10,50", "1.234,56",
    /// "1.234", "10". A dot followed by exactly three digits groups
    /// thousands; otherwise a lone dot is the decimal point. More than two
    /// fractional digits, or an amount beyond `MAX_AMOUNT`, is an error.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let invalid = || MoneyParseError::InvalidFormat(s.to_string());
        let trimmed = s.trim();

        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, trimmed),
        };

        let rest = rest
            .strip_prefix(DEFAULT_CURRENCY_SYMBOL)
            .or_else(|| rest.strip_prefix('$'))
            .unwrap_or(rest)
            .trim();

        let (units_str, cents_str) = split_amount(rest).ok_or_else(invalid)?;
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (units_str.is_empty() && cents_str.is_empty())
            || !all_digits(units_str.as_str())
            || !all_digits(cents_str)
            || cents_str.len() > 2
        {
            return Err(invalid());
        }

        let out_of_range = || MoneyParseError::OutOfRange(s.to_string());
        // Only digits remain, so a failed parse means the value is too large
        let units: i64 = if units_str.is_empty() {
            0
        } else {
            units_str.parse().map_err(|_| out_of_range())?
        };
        let cents: i64 = match cents_str.len() {
            0 => 0,
            1 => cents_str.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => cents_str.parse().map_err(|_| invalid())?,
        };

        let total = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(cents))
            .map(Self)
            .filter(Money::is_within_limit)
            .ok_or_else(out_of_range)?;

        Ok(if negative { -total } else { total })
    }

/// Format with a currency symbol
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        if self.is_negative() {
            format!("-{} {}.{:02}", symbol, self.units().abs(), self.cents_part())
        } else {
            format!("{} {}.{:02}", symbol, self.units(), self.cents_part())
        }
    }

    /// Plain decimal string without symbol (used in CSV export)
    pub fn to_plain_string(&self) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

/// Split an amount into its integer digits and fractional digits
///
/// Brazilian notation: '.' groups thousands and ',' separates cents.
fn split_amount(s: &str) -> Option<(String, &str)> {
    if s.is_empty() {
        return None;
    }
    if let Some((units, cents)) = s.split_once(',') {
        if cents.contains(['.', ',']) {
            return None;
        }
        return Some((ungroup(units)?, cents));
    }

    let groups: Vec<&str> = s.split('.').collect();
    match groups.as_slice() {
        [units] => Some((units.to_string(), "")),
        [units, cents] if cents.len() != 3 => Some((units.to_string(), *cents)),
        _ => Some((ungroup(s)?, "")),
    }
}

/// Drop '.' thousands separators, requiring full groups of three digits
fn ungroup(s: &str) -> Option<String> {
    let mut groups = s.split('.');
    let first = groups.next().unwrap_or_default();
    let mut digits = first.to_string();
    for group in groups {
        if first.is_empty() || first.len() > 3 || first.starts_with('0') || group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.format_with_symbol(DEFAULT_CURRENCY_SYMBOL))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
    OutOfRange(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
            MoneyParseError::OutOfRange(s) => write!(f, "Amount out of range: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}
