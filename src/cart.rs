//! Cart
//!
//! The pure cart state: an ordered sequence of line items keyed by unique
//! id, with merge-on-add semantics. No I/O happens here; persistence and
//! change notification are layered on by [`crate::store::CartStore`].

use serde::Serialize;

use crate::{identity::line_item_id, items::LineItem, products::ProductVariant};

/// An ordered collection of line items.
///
/// Insertion order is preserved across persistence round-trips. No two
/// items share an id, and no stored quantity is ever zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Rebuild a cart from deserialized line items.
    ///
    /// Stored data is not trusted: zero-quantity entries are dropped and a
    /// duplicated id folds into the first occurrence, re-establishing the
    /// cart invariants regardless of what an older writer left behind.
    pub fn from_items(items: impl IntoIterator<Item = LineItem>) -> Self {
        let mut cart = Cart::new();

        for item in items {
            if item.quantity == 0 {
                continue;
            }

            match cart.position_of(&item.id) {
                Some(index) => cart.bump_quantity(index, item.quantity),
                None => cart.items.push(item),
            }
        }

        cart
    }

    /// Add `quantity` units of a variant, merging into an existing line when
    /// the same variant is already present. Returns the line-item id.
    ///
    /// Repeated adds accumulate quantity rather than duplicating lines. A
    /// quantity of zero is treated as one so an add can never violate the
    /// positive-quantity invariant.
    pub fn add(&mut self, variant: ProductVariant, quantity: u32) -> String {
        let id = line_item_id(&variant);
        let quantity = quantity.max(1);

        match self.position_of(&id) {
            Some(index) => self.bump_quantity(index, quantity),
            None => self.items.push(LineItem {
                id: id.clone(),
                quantity,
                variant,
            }),
        }

        id
    }

    fn position_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn bump_quantity(&mut self, index: usize, by: u32) {
        if let Some(item) = self.items.get_mut(index) {
            item.quantity = item.quantity.saturating_add(by);
        }
    }

    /// Overwrite the quantity of an existing line item.
    ///
    /// A quantity of zero or an unknown id is a no-op; deletions must go
    /// through [`Cart::remove`]. Returns whether the cart changed.
    pub fn set_quantity(&mut self, id: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }

        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Delete the line item with the given id, if present.
    ///
    /// Returns whether an item was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// The line items, in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Look up a line item by id.
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Number of distinct line items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines, e.g. for a cart badge.
    pub fn total_units(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |sum, item| sum.saturating_add(item.quantity))
    }
}
