//! Checkout Example
//!
//! Builds a cart over an in-memory backend, merges a repeated add,
//! adjusts a quantity and prints the order summary a checkout page
//! would render.

use anyhow::Result;
use rust_decimal::Decimal;

use trolley::prelude::*;

fn trail_shoe(color: &str, size: &str) -> ProductVariant {
    let mut variant = ProductVariant::new(12, "Trail Shoe", Decimal::from(300));
    variant.selling_price = Some(Decimal::from(250));
    variant.mrp = Some(Decimal::from(320));
    variant.selected_color = Some(ColorOption {
        name: color.into(),
        hex: "#b22222".into(),
        image_url: Some(format!("shoe-{color}.jpg")),
    });
    variant.selected_size = Some(size.into());
    variant
}

/// Checkout Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let store = CartStore::new(MemoryBackend::new());
    let policy = PricingPolicy::default();

    store.subscribe(|items| {
        let units: u32 = items.iter().map(|item| item.quantity).sum();
        println!("[cart badge] {units} unit(s)");
    });

    store.add(trail_shoe("Red", "42"), 1)?;
    store.add(trail_shoe("Red", "42"), 1)?;
    store.add(trail_shoe("Blue", "42"), 1)?;

    let red_id = line_item_id(&trail_shoe("Red", "42"));
    store.set_quantity(&red_id, 1)?;

    println!("\nYour Shopping Cart");
    for item in store.get_all() {
        let color = item
            .variant
            .selected_color
            .as_ref()
            .map_or("-", |c| c.name.as_str());
        println!(
            "  {} (colour {color}) x{} @ {} = {}",
            item.variant.name,
            item.quantity,
            item.variant.unit_price(),
            item.line_total()
        );
    }

    let summary = store.summary(&policy).rounded();
    println!("\nOrder Summary");
    println!("  Subtotal: {}", summary.subtotal);
    println!("  Tax:      {}", summary.tax_amount);
    println!("  Shipping: {}", summary.shipping_fee);
    if let Some(more) = policy.amount_to_free_shipping(summary.subtotal) {
        println!("  (add {more} more for free shipping)");
    }
    println!("  Total:    {}", summary.total);

    // Order placed: the checkout flow clears the cart.
    store.clear()?;
    println!("\nOrder placed, cart cleared ({} items)", store.len());

    Ok(())
}
