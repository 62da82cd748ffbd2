//! Cart Store
//!
//! The single owner of mutable cart state. Every mutation goes through the
//! store, which writes through to its storage slot and then notifies
//! subscribers with the post-mutation snapshot. Collaborators never touch
//! storage directly; all reads go through [`CartStore::get_all`] or a
//! subscription, so the store stays the only source of truth.

use std::{
    fmt,
    sync::{
        Arc, Mutex, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use tracing::{debug, warn};

use crate::{
    cart::Cart,
    items::LineItem,
    pricing::{PricingPolicy, PricingSummary, summarize},
    products::ProductVariant,
    storage::{CartSlot, StorageBackend, StorageError},
};

/// Handle identifying one change subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&[LineItem]) + Send + Sync>;

/// Owns the in-memory cart, writes through to storage and fans out change
/// notifications.
///
/// All operations take `&self`; share the store across threads with an
/// [`Arc`]. Mutations run to completion before any observer is notified,
/// so within one context there is no interleaving hazard.
///
/// A failed write-through never corrupts in-memory state: the store keeps
/// its last-known-good cart and reports the storage failure to the caller,
/// leaving the cart usable for the rest of the session.
pub struct CartStore<B> {
    slot: CartSlot<B>,
    cart: RwLock<Cart>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
}

impl<B> fmt::Debug for CartStore<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.cart.read().map(|cart| cart.len()).ok())
            .finish_non_exhaustive()
    }
}

impl<B: StorageBackend> CartStore<B> {
    /// Create a store over `backend`, seeded from whatever the slot holds.
    ///
    /// A missing, unreadable or corrupt slot seeds an empty cart.
    pub fn new(backend: B) -> Self {
        let slot = CartSlot::new(backend);
        let cart = slot.load();

        CartStore {
            slot,
            cart: RwLock::new(cart),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    /// Add `quantity` units of a variant, merging into an existing line
    /// when the same variant is already in the cart.
    ///
    /// # Errors
    ///
    /// Valid input has no failure mode of its own; an `Err` means only
    /// that the write-through failed and the cart may not persist. The
    /// in-memory mutation stands either way.
    pub fn add(&self, variant: ProductVariant, quantity: u32) -> Result<(), StorageError> {
        self.mutate(|cart| {
            cart.add(variant, quantity);
            true
        })
    }

    /// Overwrite the quantity of an existing line item.
    ///
    /// A quantity of zero or an unknown id is a silent no-op: deletions are
    /// expected to go through [`CartStore::remove`], so quantities can never
    /// reach zero through this call.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the write-through failed.
    pub fn set_quantity(&self, id: &str, quantity: u32) -> Result<(), StorageError> {
        self.mutate(|cart| cart.set_quantity(id, quantity))
    }

    /// Delete the line item with the given id; absent ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the write-through failed.
    pub fn remove(&self, id: &str) -> Result<(), StorageError> {
        self.mutate(|cart| cart.remove(id))
    }

    /// Empty the cart and delete the storage slot.
    ///
    /// Called by the checkout flow after a completed order. The slot is
    /// removed outright rather than overwritten with an empty array,
    /// leaving storage as a first visit would find it.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the slot could not be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        {
            let mut cart = self
                .cart
                .write()
                .map_err(|_| StorageError::Unavailable("cart lock poisoned".into()))?;
            cart.clear();
        }

        let persisted = self.slot.clear();
        self.notify(&[]);

        persisted
    }

    /// A snapshot of the current line items, in insertion order.
    ///
    /// The returned list is a copy; mutating it has no effect on the store.
    pub fn get_all(&self) -> Vec<LineItem> {
        self.cart
            .read()
            .map(|cart| cart.items().to_vec())
            .unwrap_or_default()
    }

    /// Total units across all lines, e.g. for the header cart badge.
    pub fn total_units(&self) -> u32 {
        self.cart.read().map(|cart| cart.total_units()).unwrap_or(0)
    }

    /// Number of distinct line items.
    pub fn len(&self) -> usize {
        self.cart.read().map(|cart| cart.len()).unwrap_or(0)
    }

    /// Whether the cart holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Derive the order totals for the current cart under `policy`.
    pub fn summary(&self, policy: &PricingPolicy) -> PricingSummary {
        summarize(&self.get_all(), policy)
    }

    /// Register an observer called with the post-change snapshot after
    /// every mutation and every reconciled external change.
    pub fn subscribe(
        &self,
        subscriber: impl Fn(&[LineItem]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));

        match self.subscribers.lock() {
            Ok(mut subscribers) => subscribers.push((id, Arc::new(subscriber))),
            Err(_) => warn!("subscriber registry poisoned, dropping subscription"),
        }

        id
    }

    /// Drop the subscription with the given id; unknown ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|(existing, _)| *existing != id);
        }
    }

    /// Re-read the storage slot and reconcile with the in-memory cart.
    ///
    /// If the stored snapshot differs from the in-memory one, the store
    /// adopts it (last write wins) and notifies subscribers. Both external
    /// triggers feed through here: the platform's storage-change event
    /// (host calls this on delivery) and the fallback poll of
    /// [`crate::sync::CartWatcher`]. Comparing snapshots deduplicates the
    /// two sources.
    ///
    /// Returns whether a change was adopted. An unreadable backend skips
    /// the tick rather than wiping the last-known-good cart.
    pub fn refresh(&self) -> bool {
        let latest = match self.slot.try_load() {
            Ok(cart) => cart,
            Err(err) => {
                debug!(error = %err, "skipping cart refresh, storage unreadable");
                return false;
            }
        };

        let snapshot = {
            let Ok(mut cart) = self.cart.write() else {
                return false;
            };

            if *cart == latest {
                return false;
            }

            *cart = latest;
            cart.clone()
        };

        self.notify(snapshot.items());

        true
    }

    /// Run a mutation, then persist and notify if it changed the cart.
    ///
    /// The cart lock is released before persistence and callbacks run, so
    /// subscribers may freely read the store from their callback.
    fn mutate(&self, op: impl FnOnce(&mut Cart) -> bool) -> Result<(), StorageError> {
        let snapshot = {
            let mut cart = self
                .cart
                .write()
                .map_err(|_| StorageError::Unavailable("cart lock poisoned".into()))?;

            if !op(&mut cart) {
                return Ok(());
            }

            cart.clone()
        };

        let persisted = self.slot.save(&snapshot);
        if let Err(err) = &persisted {
            warn!(error = %err, "cart write-through failed, keeping in-memory state");
        }

        self.notify(snapshot.items());

        persisted
    }

    /// Fan the snapshot out to subscribers, outside of any lock they might
    /// want to re-enter.
    fn notify(&self, items: &[LineItem]) {
        let subscribers: Vec<Subscriber> = match self.subscribers.lock() {
            Ok(subscribers) => subscribers
                .iter()
                .map(|(_, subscriber)| Arc::clone(subscriber))
                .collect(),
            Err(_) => {
                warn!("subscriber registry poisoned, skipping notification");
                return;
            }
        };

        for subscriber in subscribers {
            subscriber(items);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::storage::{CART_KEY, MemoryBackend};

    use super::*;

    fn kettle() -> ProductVariant {
        ProductVariant::new(1, "Kettle", Decimal::from(300))
    }

    fn mug() -> ProductVariant {
        ProductVariant::new(2, "Mug", Decimal::from(10))
    }

    #[test]
    fn add_persists_and_get_all_reflects_it() -> TestResult {
        let backend = MemoryBackend::new();
        let store = CartStore::new(backend.clone());

        store.add(kettle(), 2)?;

        let items = store.get_all();
        assert_eq!(items.len(), 1);
        assert_eq!(store.total_units(), 2);
        assert!(
            backend.get(CART_KEY)?.is_some(),
            "mutation must write through to storage"
        );

        Ok(())
    }

    #[test]
    fn get_all_returns_a_detached_snapshot() -> TestResult {
        let store = CartStore::new(MemoryBackend::new());
        store.add(kettle(), 1)?;

        let mut items = store.get_all();
        if let Some(item) = items.first_mut() {
            item.quantity = 99;
        }

        assert_eq!(store.total_units(), 1, "store must not see the mutation");

        Ok(())
    }

    #[test]
    fn new_store_seeds_from_existing_slot() -> TestResult {
        let backend = MemoryBackend::new();
        let first = CartStore::new(backend.clone());
        first.add(kettle(), 2)?;

        let second = CartStore::new(backend);

        assert_eq!(second.total_units(), 2);

        Ok(())
    }

    #[test]
    fn set_quantity_zero_never_reaches_the_cart() -> TestResult {
        let store = CartStore::new(MemoryBackend::new());
        store.add(kettle(), 2)?;
        let id = store
            .get_all()
            .first()
            .map(|item| item.id.clone())
            .unwrap_or_default();

        store.set_quantity(&id, 0)?;

        assert!(
            store.get_all().iter().all(|item| item.quantity >= 1),
            "no operation may leave a non-positive quantity"
        );
        assert_eq!(store.total_units(), 2);

        Ok(())
    }

    #[test]
    fn remove_then_clear_totality() -> TestResult {
        let backend = MemoryBackend::new();
        let store = CartStore::new(backend.clone());
        store.add(kettle(), 1)?;
        store.add(mug(), 1)?;

        store.remove("1::::")?;
        assert_eq!(store.len(), 1);

        store.clear()?;
        assert!(store.get_all().is_empty(), "cleared store must read empty");
        assert_eq!(
            backend.get(CART_KEY)?,
            None,
            "clear must leave storage as a first visit finds it"
        );

        Ok(())
    }

    #[test]
    fn subscriber_sees_each_mutation_synchronously() -> TestResult {
        let store = CartStore::new(MemoryBackend::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_by_subscriber = Arc::clone(&seen);
        store.subscribe(move |items| {
            seen_by_subscriber.store(items.len(), Ordering::SeqCst);
        });

        store.add(kettle(), 1)?;
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        store.add(mug(), 1)?;
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        store.clear()?;
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        Ok(())
    }

    #[test]
    fn unsubscribed_observer_stops_receiving() -> TestResult {
        let store = CartStore::new(MemoryBackend::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_by_subscriber = Arc::clone(&calls);
        let id = store.subscribe(move |_| {
            calls_by_subscriber.fetch_add(1, Ordering::SeqCst);
        });

        store.add(kettle(), 1)?;
        store.unsubscribe(id);
        store.add(mug(), 1)?;

        assert_eq!(calls.load(Ordering::SeqCst), 1);

        Ok(())
    }

    #[test]
    fn subscriber_may_read_the_store_reentrantly() -> TestResult {
        let backend = MemoryBackend::new();
        let store = Arc::new(CartStore::new(backend));
        let observed = Arc::new(AtomicUsize::new(0));

        let store_in_callback = Arc::clone(&store);
        let observed_in_callback = Arc::clone(&observed);
        store.subscribe(move |_| {
            let units = store_in_callback.total_units();
            observed_in_callback.store(units as usize, Ordering::SeqCst);
        });

        store.add(kettle(), 3)?;

        assert_eq!(observed.load(Ordering::SeqCst), 3);

        Ok(())
    }

    #[test]
    fn noop_mutations_do_not_notify() -> TestResult {
        let store = CartStore::new(MemoryBackend::new());
        store.add(kettle(), 1)?;

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_by_subscriber = Arc::clone(&calls);
        store.subscribe(move |_| {
            calls_by_subscriber.fetch_add(1, Ordering::SeqCst);
        });

        store.remove("unknown")?;
        store.set_quantity("unknown", 4)?;

        assert_eq!(calls.load(Ordering::SeqCst), 0, "no-ops must stay silent");

        Ok(())
    }

    /// Backend whose writes always fail, e.g. a storage quota exhausted.
    #[derive(Debug, Clone, Default)]
    struct FullBackend;

    impl StorageBackend for FullBackend {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }
    }

    #[test]
    fn failed_write_through_keeps_state_and_still_notifies() {
        let store = CartStore::new(FullBackend);

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_by_subscriber = Arc::clone(&seen);
        store.subscribe(move |items| {
            seen_by_subscriber.store(items.len(), Ordering::SeqCst);
        });

        let result = store.add(kettle(), 2);

        assert!(result.is_err(), "the failed write-through must be reported");
        assert_eq!(
            store.total_units(),
            2,
            "the in-memory mutation must stand as last-known-good"
        );
        assert_eq!(
            seen.load(Ordering::SeqCst),
            1,
            "observers must still see the new state"
        );

        // The cart stays usable for the rest of the session.
        let result = store.set_quantity("1::::", 5);
        assert!(result.is_err(), "every failed write keeps reporting");
        assert_eq!(store.total_units(), 5);
    }

    #[test]
    fn failed_clear_still_empties_the_in_memory_cart() {
        let store = CartStore::new(FullBackend);
        assert!(store.add(kettle(), 2).is_err(), "seed write fails too");

        assert!(store.clear().is_err(), "slot removal failure is reported");
        assert!(store.get_all().is_empty(), "in-memory cart is still cleared");
    }

    #[test]
    fn refresh_adopts_a_foreign_write_once() -> TestResult {
        let backend = MemoryBackend::new();
        let ours = CartStore::new(backend.clone());
        let theirs = CartStore::new(backend);

        theirs.add(kettle(), 2)?;

        assert!(ours.refresh(), "first refresh adopts the foreign write");
        assert_eq!(ours.total_units(), 2);
        assert!(!ours.refresh(), "second refresh sees nothing new");

        Ok(())
    }

    #[test]
    fn refresh_ignores_our_own_writes() -> TestResult {
        let store = CartStore::new(MemoryBackend::new());
        store.add(kettle(), 1)?;

        assert!(
            !store.refresh(),
            "a write-through must not echo back as a change"
        );

        Ok(())
    }
}
