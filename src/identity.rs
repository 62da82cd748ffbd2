//! Variant Identity
//!
//! Derives the stable identifier that decides whether two selections are
//! "the same line item". Identity is a pure function of the product id,
//! colour name and size label; price, stock and image deliberately do not
//! contribute, so catalog updates never fragment existing cart lines.

use crate::products::ProductVariant;

/// Joins id components; not expected to appear in a colour name or size.
const SEPARATOR: &str = "::";

/// Derive the line-item identifier for a variant selection.
///
/// Two selections of the same product with the same colour and size always
/// yield the same id; any difference in product, colour or size yields a
/// different one. An absent colour or size contributes an empty sentinel, so
/// a product without options collapses to an id keyed by product id alone.
pub fn line_item_id(variant: &ProductVariant) -> String {
    let color = variant
        .selected_color
        .as_ref()
        .map_or("", |color| color.name.as_str());
    let size = variant.selected_size.as_deref().unwrap_or("");

    format!("{}{SEPARATOR}{color}{SEPARATOR}{size}", variant.id)
}
