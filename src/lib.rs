//! Trolley
//!
//! Trolley is a client-resident shopping cart engine for multi-vendor
//! storefronts: variant-aware line items with merge-on-add semantics,
//! write-through persistence over a pluggable key-value backend, change
//! propagation across contexts sharing one store, and decimal-safe order
//! pricing.
//!
//! The [`store::CartStore`] is the single owner of cart state; UI layers
//! call its narrow add/update/remove/clear/read API and subscribe for
//! change notifications. [`sync::CartWatcher`] reconciles writes made by
//! other contexts, and [`pricing`] derives order totals on every read.

pub mod cart;
pub mod identity;
pub mod items;
pub mod pricing;
pub mod prelude;
pub mod products;
pub mod storage;
pub mod store;
pub mod sync;
