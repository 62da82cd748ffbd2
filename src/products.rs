//! Products
//!
//! Variant snapshots captured at the moment of selection. Later catalog
//! changes never retroactively update a snapshot already placed in a cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Vendor details denormalized onto a product snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    /// Vendor identifier.
    pub id: u64,

    /// Vendor display name.
    pub name: String,

    /// Logo URL, when the vendor has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    /// Average shopper rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    /// Number of products the vendor lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_count: Option<u32>,
}

/// A colour choice offered for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorOption {
    /// Colour name, e.g. `"Midnight Blue"`.
    pub name: String,

    /// Hex code for swatch rendering.
    pub hex: String,

    /// Image of the product in this colour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A product together with a specific colour/size selection.
///
/// Serialized with camelCase field names so previously stored carts remain
/// readable. Unknown fields are ignored on read and missing optional fields
/// default, so adding snapshot fields never breaks old data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    /// Catalog product identifier.
    pub id: u64,

    /// Product display name.
    pub name: String,

    /// Product description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// List price.
    pub price: Decimal,

    /// Discounted selling price, when the product is on offer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<Decimal>,

    /// Manufacturer's retail price, used for strike-through display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrp: Option<Decimal>,

    /// Product image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Units in stock at selection time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,

    /// Whether the product was listed as active.
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Vendor the product belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<Vendor>,

    /// Colour the shopper selected, if the product has colour options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<ColorOption>,

    /// Size the shopper selected, if the product has size options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<String>,
}

fn default_active() -> bool {
    true
}

impl ProductVariant {
    /// Create a minimal snapshot with just an id, name and list price.
    ///
    /// All optional display fields start empty; set them directly as needed.
    pub fn new(id: u64, name: impl Into<String>, price: Decimal) -> Self {
        ProductVariant {
            id,
            name: name.into(),
            description: None,
            price,
            selling_price: None,
            mrp: None,
            image_url: None,
            stock: None,
            is_active: true,
            vendor: None,
            selected_color: None,
            selected_size: None,
        }
    }

    /// The price a shopper actually pays per unit: the selling price when
    /// one is present, otherwise the list price.
    pub fn unit_price(&self) -> Decimal {
        self.selling_price.unwrap_or(self.price)
    }

    /// Image to display for this selection, preferring the selected colour's
    /// image over the generic product image.
    pub fn display_image_url(&self) -> Option<&str> {
        self.selected_color
            .as_ref()
            .and_then(|color| color.image_url.as_deref())
            .or(self.image_url.as_deref())
    }

    /// Whether the MRP exceeds the effective unit price, meaning a saving
    /// is worth showing.
    pub fn has_markdown(&self) -> bool {
        self.mrp.is_some_and(|mrp| mrp > self.unit_price())
    }
}
