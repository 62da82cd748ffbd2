//! Pricing
//!
//! Derives order totals from the current line items. All monetary values
//! are [`Decimal`], so repeated accumulation never drifts; rounding to two
//! fraction digits happens only at presentation time via
//! [`PricingSummary::rounded`].

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::items::LineItem;

/// Business rules for deriving order totals.
///
/// Deserializable so a host can load the rules from configuration; the
/// defaults match the storefront's standing policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PricingPolicy {
    /// Tax applied to the subtotal.
    pub tax_rate: Decimal,

    /// Subtotals strictly above this amount ship free.
    pub free_shipping_threshold: Decimal,

    /// Flat fee charged when the order does not ship free.
    pub flat_shipping_fee: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            tax_rate: Decimal::new(18, 2),
            free_shipping_threshold: Decimal::from(500),
            flat_shipping_fee: Decimal::from(50),
        }
    }
}

impl PricingPolicy {
    /// Shipping charged for a given subtotal.
    ///
    /// An empty order ships nothing, so it is charged nothing. Free
    /// shipping requires the subtotal to strictly exceed the threshold; an
    /// order landing exactly on it still pays the flat fee.
    fn shipping_fee(&self, subtotal: Decimal) -> Decimal {
        if subtotal.is_zero() || subtotal > self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.flat_shipping_fee
        }
    }

    /// How much more must be spent before shipping becomes free, for the
    /// "add X more for free shipping" banner. `None` once the threshold is
    /// reached.
    pub fn amount_to_free_shipping(&self, subtotal: Decimal) -> Option<Decimal> {
        if subtotal < self.free_shipping_threshold {
            Some(self.free_shipping_threshold - subtotal)
        } else {
            None
        }
    }
}

/// Derived order totals. Recomputed on every read, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSummary {
    /// Sum of effective unit price times quantity over all lines.
    pub subtotal: Decimal,

    /// Tax on the subtotal.
    pub tax_amount: Decimal,

    /// Shipping fee for the order.
    pub shipping_fee: Decimal,

    /// Grand total: subtotal plus tax plus shipping.
    pub total: Decimal,
}

impl PricingSummary {
    /// The two-fraction-digit display form, midpoint rounding away from
    /// zero. Accumulation itself never rounds.
    #[must_use]
    pub fn rounded(&self) -> Self {
        let round =
            |value: Decimal| value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        PricingSummary {
            subtotal: round(self.subtotal),
            tax_amount: round(self.tax_amount),
            shipping_fee: round(self.shipping_fee),
            total: round(self.total),
        }
    }
}

/// Compute the pricing summary for a set of line items under `policy`.
///
/// The subtotal prefers each variant's selling price over its list price,
/// the same rule the catalog displays with.
pub fn summarize(items: &[LineItem], policy: &PricingPolicy) -> PricingSummary {
    let subtotal = items
        .iter()
        .fold(Decimal::ZERO, |sum, item| sum + item.line_total());
    let tax_amount = subtotal * policy.tax_rate;
    let shipping_fee = policy.shipping_fee(subtotal);

    PricingSummary {
        subtotal,
        tax_amount,
        shipping_fee,
        total: subtotal + tax_amount + shipping_fee,
    }
}
