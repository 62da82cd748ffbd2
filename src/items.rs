//! Line Items

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::products::ProductVariant;

/// One cart entry: a specific product variant and how many of it.
///
/// The stored field name for the variant is `product`, matching the
/// persisted layout older carts were written with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Derived identifier; see [`crate::identity::line_item_id`].
    pub id: String,

    /// Units of this variant. At least 1 while the item is in a cart.
    pub quantity: u32,

    /// Variant snapshot captured when the item was first added.
    #[serde(rename = "product")]
    pub variant: ProductVariant,
}

impl LineItem {
    /// Price for the whole line: effective unit price times quantity.
    pub fn line_total(&self) -> Decimal {
        self.variant.unit_price() * Decimal::from(self.quantity)
    }
}
