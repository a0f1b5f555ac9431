//! Money amounts and the fixed checkout tax.

use serde::{Deserialize, Serialize};

/// Tax applied at checkout, in basis points (500 = 5%).
pub const TAX_RATE_BPS: i64 = 500;

/// Money amount in paise to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from minor units (paise).
    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates an amount from whole rupees.
    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees * 100)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    pub fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise remainder after whole rupees.
    pub fn paise_part(&self) -> i64 {
        self.0.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies by a quantity, saturating at the `i64` bounds.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Applies a basis-point rate, rounding half away from zero.
    pub fn apply_bps(&self, bps: i64) -> Money {
        let scaled = i128::from(self.0) * i128::from(bps);
        let rounded = if scaled >= 0 {
            (scaled + 5_000) / 10_000
        } else {
            (scaled - 5_000) / 10_000
        };
        Money(rounded.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{sign}₹{}.{:02}",
            group_indian(self.rupees().unsigned_abs()),
            self.paise_part()
        )
    }
}

/// Formats with the Indian digit grouping (last three, then pairs): 4,50,000.
fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, right) = rest.split_at(rest.len() - 2);
        groups.push(right);
        rest = left;
    }
    groups.push(rest);
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Price breakdown shown at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl Totals {
    /// Computes tax and grand total for a subtotal at the fixed rate.
    pub fn from_subtotal(subtotal: Money) -> Self {
        let tax = subtotal.apply_bps(TAX_RATE_BPS);
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_parts() {
        let money = Money::from_minor(123_456);
        assert_eq!(money.rupees(), 1234);
        assert_eq!(money.paise_part(), 56);
        assert_eq!(Money::from_rupees(50).minor(), 5000);
    }

    #[test]
    fn test_money_display_uses_indian_grouping() {
        assert_eq!(Money::from_rupees(450_000).to_string(), "₹4,50,000.00");
        assert_eq!(Money::from_rupees(18_500).to_string(), "₹18,500.00");
        assert_eq!(Money::from_minor(505).to_string(), "₹5.05");
        assert_eq!(Money::from_rupees(12_345_678).to_string(), "₹1,23,45,678.00");
        assert_eq!(Money::from_minor(-1234).to_string(), "-₹12.34");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);
        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!(a.multiply(3).minor(), 3000);
        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.minor(), 2000);
    }

    #[test]
    fn test_five_percent_tax() {
        let totals = Totals::from_subtotal(Money::from_minor(450_000));
        assert_eq!(totals.tax.minor(), 22_500);
        assert_eq!(totals.total.minor(), 472_500);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 5% of 10 = 0.5 -> 1, 5% of 9 = 0.45 -> 0
        assert_eq!(Money::from_minor(10).apply_bps(TAX_RATE_BPS).minor(), 1);
        assert_eq!(Money::from_minor(9).apply_bps(TAX_RATE_BPS).minor(), 0);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let large = Money::from_minor(i64::MAX / 2);
        assert_eq!(large.checked_multiply(2).map(|m| m.minor()), Some(i64::MAX - 1));
        assert!(large.checked_multiply(3).is_none());
        assert!(large.checked_add(large).is_some());
        assert!(Money::from_minor(i64::MAX).checked_add(Money::from_minor(1)).is_none());
    }

    #[test]
    fn test_large_amounts_saturate_instead_of_wrapping() {
        let large = Money::from_minor(i64::MAX / 2);
        assert_eq!(large.multiply(3).minor(), i64::MAX);
        assert_eq!((large + large + large).minor(), i64::MAX);

        let totals = Totals::from_subtotal(Money::from_minor(i64::MAX));
        assert!(totals.tax.is_positive());
        assert_eq!(totals.total.minor(), i64::MAX);
    }
}
