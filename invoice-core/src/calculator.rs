//! Line-item math: quantity display, row descriptions, extended
//! amounts and the order total.
//!
//! Defaults: a missing quantity counts as 0 and a missing unit price
//! counts as 1, so an item with a quantity but no price still has a
//! non-zero amount. Negative quantities are treated as 0.
//!
//! Arithmetic saturates at the `Decimal` range instead of panicking.
//! `checked_amount` and `InvoiceTotals::checked_from_rows` report when
//! that happened so callers can reject the order.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::request::LineItem;

/// Which of the two sale dimensions an item uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Primary(Decimal),
    Secondary(Decimal),
    Both(Decimal, Decimal),
    None,
}

impl Quantity {
    pub fn of(item: &LineItem) -> Self {
        let primary = quantity(item.primary_quantity);
        let secondary = quantity(item.secondary_quantity);
        match (primary > Decimal::ZERO, secondary > Decimal::ZERO) {
            (true, false) => Quantity::Primary(primary),
            (false, true) => Quantity::Secondary(secondary),
            (true, true) => Quantity::Both(primary, secondary),
            (false, false) => Quantity::None,
        }
    }

    /// Text for the QTY column; `None` renders blank.
    pub fn label(&self) -> Option<String> {
        match self {
            Quantity::Primary(n) | Quantity::Secondary(n) => Some(number(*n)),
            Quantity::Both(p, s) => Some(format!("{}/{}", number(*p), number(*s))),
            Quantity::None => None,
        }
    }

    /// Prefix naming the unit of sale.
    pub fn unit_label(&self) -> &'static str {
        match self {
            Quantity::Primary(_) => "Case - ",
            Quantity::Secondary(_) => "Unit - ",
            Quantity::Both(..) | Quantity::None => "Case / Unit - ",
        }
    }
}

fn quantity(q: Option<Decimal>) -> Decimal {
    q.unwrap_or(Decimal::ZERO).max(Decimal::ZERO)
}

fn price(p: Option<Decimal>) -> Decimal {
    p.unwrap_or(Decimal::ONE)
}

/// Drop trailing fractional zeros: `2.00` prints as `2`.
fn number(n: Decimal) -> String {
    n.normalize().to_string()
}

pub fn quantity_label(item: &LineItem) -> Option<String> {
    Quantity::of(item).label()
}

pub fn unit_label(item: &LineItem) -> &'static str {
    Quantity::of(item).unit_label()
}

/// Unit label followed by the item name, e.g. `"Case - Apples"`.
pub fn description(item: &LineItem) -> String {
    describe(Quantity::of(item), &item.name)
}

fn describe(quantity: Quantity, name: &str) -> String {
    format!("{}{}", quantity.unit_label(), name)
}

/// Exact extended amount of one item, saturating at the `Decimal`
/// bounds.
pub fn amount(item: &LineItem) -> Decimal {
    let primary = quantity(item.primary_quantity).saturating_mul(price(item.primary_unit_price));
    let secondary =
        quantity(item.secondary_quantity).saturating_mul(price(item.secondary_unit_price));
    primary.saturating_add(secondary)
}

/// Exact extended amount, or `None` if it does not fit in a `Decimal`.
pub fn checked_amount(item: &LineItem) -> Option<Decimal> {
    let primary = quantity(item.primary_quantity).checked_mul(price(item.primary_unit_price))?;
    let secondary =
        quantity(item.secondary_quantity).checked_mul(price(item.secondary_unit_price))?;
    primary.checked_add(secondary)
}

/// Sum of exact item amounts. Rounding happens only when formatting.
pub fn order_total(items: &[LineItem]) -> InvoiceTotals {
    InvoiceTotals {
        total: saturating_sum(items.iter().map(amount)),
    }
}

fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

/// One table row derived from one line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedRow {
    pub quantity_label: Option<String>,
    pub description: String,
    pub amount: Decimal,
}

impl RenderedRow {
    pub fn from_item(item: &LineItem) -> Self {
        let quantity = Quantity::of(item);
        RenderedRow {
            quantity_label: quantity.label(),
            description: describe(quantity, &item.name),
            amount: amount(item),
        }
    }

    /// Amount as shown in the AMOUNT column, e.g. `"$10.00"`.
    pub fn amount_label(&self) -> String {
        money(self.amount)
    }
}

/// Grand total of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct InvoiceTotals {
    total: Decimal,
}

impl InvoiceTotals {
    pub fn from_rows(rows: &[RenderedRow]) -> Self {
        InvoiceTotals {
            total: saturating_sum(rows.iter().map(|r| r.amount)),
        }
    }

    /// Like `from_rows`, but `None` when the sum leaves the `Decimal`
    /// range.
    pub fn checked_from_rows(rows: &[RenderedRow]) -> Option<Self> {
        let total = rows
            .iter()
            .try_fold(Decimal::ZERO, |sum, row| sum.checked_add(row.amount))?;
        Some(InvoiceTotals { total })
    }

    /// Unrounded total.
    pub fn exact(&self) -> Decimal {
        self.total
    }

    /// Total rounded to cents.
    pub fn rounded(&self) -> Decimal {
        round_cents(self.total)
    }

    /// Two-decimal string, e.g. `"20.00"`.
    pub fn formatted(&self) -> String {
        fixed2(self.total)
    }

    /// Currency string, e.g. `"$20.00"`.
    pub fn display(&self) -> String {
        money(self.total)
    }

    /// Rounded total in cents, for comparing against a charge amount
    /// reported by the payment processor. `None` if it does not fit.
    pub fn minor_units(&self) -> Option<i64> {
        self.rounded()
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
    }

    /// Whether a charge of `amount_cents` covers exactly this invoice.
    pub fn matches_charge(&self, amount_cents: i64) -> bool {
        self.minor_units() == Some(amount_cents)
    }
}

fn round_cents(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn fixed2(d: Decimal) -> String {
    format!("{:.2}", round_cents(d))
}

/// `$` followed by the two-decimal amount; negatives as `-$1.00`.
pub fn money(d: Decimal) -> String {
    let s = fixed2(d);
    match s.strip_prefix('-') {
        Some(abs) => format!("-${}", abs),
        None => format!("${}", s),
    }
}
