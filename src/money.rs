//! Decimal money arithmetic shared by billing, the payment ledger and reporting.
//!
//! Every stored or reported amount is rounded half away from zero to two decimal places.
//! Amounts leave the service as JSON strings (`"27.54"`) so no client ever sees a float.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

pub const MONEY_SCALE: u32 = 2;

/// Largest unit price a `numeric(12,2)` column holds.
pub const MAX_UNIT_PRICE: Decimal = dec!(9999999999.99);

/// Largest line, bill or payment amount a `numeric(14,2)` column holds.
pub const MAX_AMOUNT: Decimal = dec!(999999999999.99);

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Rounds to cents, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// True when `value` carries no more precision than whole cents.
pub fn has_money_scale(value: Decimal) -> bool {
    value.normalize().scale() <= MONEY_SCALE
}

fn within_amount_limit(value: Decimal) -> Option<Decimal> {
    (value.abs() <= MAX_AMOUNT).then_some(value)
}

/// `quantity * unit_price` in cents, or `None` when it cannot be stored.
pub fn line_total(quantity: i32, unit_price: Decimal) -> Option<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .map(round_money)
        .and_then(within_amount_limit)
}

/// Header amounts derived from a bill's line totals and tax percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillTotals {
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl BillTotals {
    /// Returns `None` when any header amount overflows or exceeds [`MAX_AMOUNT`].
    pub fn compute<I>(line_totals: I, tax_rate: Decimal) -> Option<Self>
    where
        I: IntoIterator<Item = Decimal>,
    {
        let sum = line_totals
            .into_iter()
            .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line))?;
        let subtotal = within_amount_limit(round_money(sum))?;
        let tax_rate = round_money(tax_rate);
        let tax_amount = subtotal
            .checked_mul(tax_rate)?
            .checked_div(ONE_HUNDRED)
            .map(round_money)
            .and_then(within_amount_limit)?;
        let total = subtotal
            .checked_add(tax_amount)
            .map(round_money)
            .and_then(within_amount_limit)?;
        Some(Self {
            subtotal,
            tax_rate,
            tax_amount,
            total,
        })
    }
}

/// What has been paid against a bill and what is still owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub total: Decimal,
    pub paid: Decimal,
    pub outstanding: Decimal,
}

impl Balance {
    /// Derives paid and outstanding amounts from a bill total and its payment amounts.
    /// Outstanding never goes below zero.
    pub fn derive<I>(total: Decimal, payments: I) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        let total = round_money(total);
        let paid = round_money(payments.into_iter().map(round_money).sum());
        Self {
            total,
            paid,
            outstanding: (total - paid).max(Decimal::ZERO),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.outstanding.is_zero()
    }
}

/// Formats a bill number such as `INV-000042`.
pub fn format_bill_number(prefix: &str, sequence: i64) -> String {
    format!("{}{:06}", prefix, sequence)
}

/// Formats an amount the way it appears on the wire: always exactly two decimals.
pub fn format_money(value: Decimal) -> String {
    format!("{:.2}", round_money(value))
}

/// `#[serde(with = "crate::money::serde_money")]` for amounts exposed over HTTP.
pub mod serde_money {
    use super::{format_money, round_money};
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_money(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        <Decimal as Deserialize>::deserialize(deserializer).map(round_money)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(dec!(2.005)), dec!(2.01));
        assert_eq!(round_money(dec!(2.004)), dec!(2.00));
        assert_eq!(round_money(dec!(-2.005)), dec!(-2.01));
    }

    #[test]
    fn computes_worked_example_totals() {
        let lines = [
            line_total(2, dec!(10.00)).unwrap(),
            line_total(1, dec!(5.50)).unwrap(),
        ];
        assert_eq!(line_total(3, dec!(4.25)), Some(dec!(12.75)));

        let totals = BillTotals::compute(lines, dec!(8)).unwrap();
        assert_eq!(totals.subtotal, dec!(25.50));
        assert_eq!(totals.tax_amount, dec!(2.04));
        assert_eq!(totals.total, dec!(27.54));
    }

    #[test]
    fn zero_tax_rate_leaves_total_equal_to_subtotal() {
        let totals = BillTotals::compute([dec!(10.10), dec!(0.90)], Decimal::ZERO).unwrap();
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.total, dec!(11.00));
    }

    #[test]
    fn oversized_amounts_are_refused_instead_of_overflowing() {
        assert_eq!(line_total(2, Decimal::MAX), None);
        assert_eq!(line_total(1_000, MAX_UNIT_PRICE), None);
        assert_eq!(line_total(1, MAX_UNIT_PRICE), Some(MAX_UNIT_PRICE));

        assert!(BillTotals::compute([MAX_AMOUNT, dec!(0.01)], Decimal::ZERO).is_none());
        assert!(BillTotals::compute([MAX_AMOUNT], dec!(8)).is_none());
        assert!(BillTotals::compute([MAX_AMOUNT], Decimal::ZERO).is_some());
    }

    #[test]
    fn balance_never_goes_negative() {
        let balance = Balance::derive(dec!(100.00), [dec!(60), dec!(50)]);
        assert_eq!(balance.paid, dec!(110.00));
        assert_eq!(balance.outstanding, Decimal::ZERO);
        assert!(balance.is_settled());

        let open = Balance::derive(dec!(100.00), [dec!(40.00)]);
        assert_eq!(open.outstanding, dec!(60.00));
        assert!(!open.is_settled());
    }

    #[test]
    fn detects_sub_cent_precision() {
        assert!(has_money_scale(dec!(10.50)));
        assert!(has_money_scale(dec!(10.500)));
        assert!(!has_money_scale(dec!(10.505)));
    }

    #[test]
    fn formats_bill_numbers_and_amounts() {
        assert_eq!(format_bill_number("INV-", 42), "INV-000042");
        assert_eq!(format_bill_number("INV-", 1_234_567), "INV-1234567");
        assert_eq!(format_money(dec!(27.5)), "27.50");
        assert_eq!(format_money(dec!(3)), "3.00");
    }

    #[test]
    fn serializes_money_as_two_decimal_string() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wire {
            #[serde(with = "super::serde_money")]
            amount: Decimal,
        }

        let json = serde_json::to_value(Wire { amount: dec!(27.54) }).unwrap();
        assert_eq!(json, serde_json::json!({ "amount": "27.54" }));

        let parsed: Wire = serde_json::from_str(r#"{"amount":"10.005"}"#).unwrap();
        assert_eq!(parsed.amount, dec!(10.01));
    }
}
