//! Trolley prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::Cart,
    identity::line_item_id,
    items::LineItem,
    pricing::{PricingPolicy, PricingSummary, summarize},
    products::{ColorOption, ProductVariant, Vendor},
    storage::{CART_KEY, CartSlot, FileBackend, MemoryBackend, StorageBackend, StorageError},
    store::{CartStore, SubscriptionId},
    sync::{CartWatcher, DEFAULT_POLL_INTERVAL},
};
