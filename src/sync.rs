//! Change Propagation
//!
//! Keeps observers current when the shared storage slot is written by a
//! different context. Same-context mutations already notify synchronously
//! from [`crate::store::CartStore`]; the platform's storage-change event,
//! when the host receives one, should be routed to
//! [`crate::store::CartStore::refresh`]. Because that event is not
//! guaranteed to fire for every write, [`CartWatcher`] polls the slot as a
//! fallback. Both sources are deduplicated by snapshot comparison inside
//! `refresh`, so neither is trusted exclusively and neither can double-fire.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use tracing::{debug, warn};

use crate::{storage::StorageBackend, store::CartStore};

/// Fallback poll cadence; propagation is "eventually consistent within one
/// poll interval", not milliseconds-exact.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Background poller that reconciles a store with its shared slot.
///
/// Stops when dropped or when [`CartWatcher::stop`] is called.
#[derive(Debug)]
pub struct CartWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CartWatcher {
    /// Spawn a watcher polling `store` at [`DEFAULT_POLL_INTERVAL`].
    pub fn spawn<B>(store: Arc<CartStore<B>>) -> Self
    where
        B: StorageBackend + 'static,
    {
        CartWatcher::spawn_with_interval(store, DEFAULT_POLL_INTERVAL)
    }

    /// Spawn a watcher polling `store` at a custom interval.
    ///
    /// Tests use short intervals; production hosts should stay near the
    /// default, since each tick re-reads and deserializes the slot.
    pub fn spawn_with_interval<B>(store: Arc<CartStore<B>>, interval: Duration) -> Self
    where
        B: StorageBackend + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_in_thread = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            debug!(?interval, "cart watcher started");

            while !stop_in_thread.load(Ordering::Relaxed) {
                thread::sleep(interval);

                if stop_in_thread.load(Ordering::Relaxed) {
                    break;
                }

                if store.refresh() {
                    debug!("cart changed in another context");
                }
            }

            debug!("cart watcher stopped");
        });

        CartWatcher {
            stop,
            handle: Some(handle),
        }
    }

    /// Stop polling and wait for the watcher thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("cart watcher thread panicked");
            }
        }
    }
}

impl Drop for CartWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
