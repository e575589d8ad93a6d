//! Entities, owned by the storages (spec section 3) per design note 9:
//! "an entity accesses its neighbors through the storage, never through a
//! direct reference." Every cross-entity link here is an opaque id.

pub mod browsing_context;
pub mod cdp_target;
pub mod input_state;
pub mod preload_script;
pub mod realm;

/// A one-shot, edge-triggered signal reset on each new navigation (spec
/// section 4.3 "`awaitUnblocked` / `awaitLoaded`"). Backed by a `watch`
/// channel so a late waiter still observes a signal already fired, which a
/// plain `Notify` would miss.
#[derive(Debug)]
pub struct Signal {
    tx: tokio::sync::watch::Sender<bool>,
}

impl Signal {
    pub fn new() -> Self {
        let (tx, _rx) = tokio::sync::watch::channel(false);
        Self { tx }
    }

    pub fn fire(&self) {
        let _ = self.tx.send(true);
    }

    pub fn reset(&self) {
        let _ = self.tx.send(false);
    }

    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// An owned receiver, so a caller can await it without holding a
    /// borrow of whatever container owns this `Signal` across the `.await`.
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        if *rx.borrow() {
            return;
        }
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}
