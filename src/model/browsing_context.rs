//! The browsing-context navigation state machine (spec section 4.3).

use std::collections::HashMap;

use tokio::sync::oneshot;

use crate::bidi::browsing_context::ReadinessState;
use crate::bidi::{BrowsingContextId, RealmId};
use crate::cdp::page::LoaderId;
use crate::cdp::target::TargetId;
use crate::error::BidiError;
use crate::model::Signal;

/// `Initial → Navigating → Loading → Interactive → Complete` (+ `Deleted`),
/// driven purely by CDP lifecycle events (spec section 4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    Initial,
    Navigating,
    Loading,
    Interactive,
    Complete,
    Deleted,
}

/// A navigation command waiting on a specific readiness state for a
/// specific loader id.
struct NavigationWaiter {
    loader_id: LoaderId,
    wait: ReadinessState,
    tx: oneshot::Sender<Result<(), BidiError>>,
}

pub struct BrowsingContext {
    pub id: BrowsingContextId,
    pub parent_id: Option<BrowsingContextId>,
    pub target_id: TargetId,
    pub url: String,
    pub state: NavigationState,
    /// The loader id of the navigation currently in flight or most recently
    /// committed (spec Glossary "Navigable / navigableId").
    pub navigable_id: Option<LoaderId>,
    /// Realms keyed by sandbox name; `None` is the principal realm (spec
    /// section 3 "a map of realms by sandbox name").
    pub realms_by_sandbox: HashMap<Option<String>, RealmId>,
    pub loaded: Signal,
    pub unblocked: Signal,
    waiters: Vec<NavigationWaiter>,
}

impl BrowsingContext {
    pub fn new(id: BrowsingContextId, parent_id: Option<BrowsingContextId>, target_id: TargetId) -> Self {
        Self {
            id,
            parent_id,
            target_id,
            url: "about:blank".to_string(),
            state: NavigationState::Initial,
            navigable_id: None,
            realms_by_sandbox: HashMap::new(),
            loaded: Signal::new(),
            unblocked: Signal::new(),
            waiters: Vec::new(),
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Begins a new navigation: resets the per-navigation signals (spec
    /// 4.3 "edge-triggered one-shot signals reset on each new navigation")
    /// and transitions to `Navigating`.
    pub fn begin_navigation(&mut self) {
        self.state = NavigationState::Navigating;
        self.loaded.reset();
        self.unblocked.reset();
    }

    /// `Page.frameNavigated` committed the navigation: records the loader id
    /// and moves to `Loading`.
    pub fn on_committed(&mut self, loader_id: LoaderId, url: String) {
        self.navigable_id = Some(loader_id);
        self.url = url;
        self.state = NavigationState::Loading;
    }

    /// Registers a waiter for `wait` on `loader_id`; resolves immediately
    /// if that condition already holds.
    pub fn wait_for(&mut self, loader_id: LoaderId, wait: ReadinessState) -> oneshot::Receiver<Result<(), BidiError>> {
        let (tx, rx) = oneshot::channel();
        if self.satisfies(&loader_id, wait) {
            let _ = tx.send(Ok(()));
        } else {
            self.waiters.push(NavigationWaiter { loader_id, wait, tx });
        }
        rx
    }

    fn satisfies(&self, loader_id: &LoaderId, wait: ReadinessState) -> bool {
        if self.navigable_id.as_ref() != Some(loader_id) {
            return false;
        }
        match wait {
            ReadinessState::None => true,
            ReadinessState::Interactive => matches!(
                self.state,
                NavigationState::Interactive | NavigationState::Complete
            ),
            ReadinessState::Complete => matches!(self.state, NavigationState::Complete),
        }
    }

    /// `Page.lifecycleEvent(name='DOMContentLoaded')`.
    pub fn on_dom_content_loaded(&mut self, loader_id: &LoaderId) {
        if self.navigable_id.as_ref() == Some(loader_id) {
            self.state = NavigationState::Interactive;
            self.resolve_ready(loader_id);
        }
    }

    /// `Page.lifecycleEvent(name='load')`. Also unblocks the context (spec
    /// 4.3 "`unblocked` … set once the bootstrap `about:blank` has
    /// finished"): the first `load` a context ever sees is that bootstrap,
    /// and every subsequent one re-fires it after `begin_navigation` reset
    /// it, which is harmless since `unblocked` is only ever awaited, never
    /// required to stay false.
    pub fn on_load(&mut self, loader_id: &LoaderId) {
        if self.navigable_id.as_ref() == Some(loader_id) {
            self.state = NavigationState::Complete;
            self.loaded.fire();
            self.unblocked.fire();
            self.resolve_ready(loader_id);
        }
    }

    fn resolve_ready(&mut self, loader_id: &LoaderId) {
        let mut remaining = Vec::with_capacity(self.waiters.len());
        for waiter in self.waiters.drain(..) {
            if waiter.loader_id == *loader_id && self.satisfies(&waiter.loader_id, waiter.wait) {
                let _ = waiter.tx.send(Ok(()));
            } else {
                remaining.push(waiter);
            }
        }
        self.waiters = remaining;
    }

    /// Fails every pending navigation waiter; called when the context is
    /// destroyed mid-navigation (spec 4.3 "If the context is destroyed
    /// mid-navigation, fail the pending navigation").
    pub fn abort_navigation(&mut self) {
        self.state = NavigationState::Deleted;
        for waiter in self.waiters.drain(..) {
            let _ = waiter.tx.send(Err(BidiError::unknown_error("navigation aborted")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> BrowsingContext {
        BrowsingContext::new(
            BrowsingContextId("C1".into()),
            None,
            TargetId("T1".into()),
        )
    }

    #[tokio::test]
    async fn complete_wait_resolves_on_load() {
        let mut c = ctx();
        c.begin_navigation();
        c.on_committed(LoaderId("L1".into()), "http://x/".into());
        let rx = c.wait_for(LoaderId("L1".into()), ReadinessState::Complete);
        c.on_dom_content_loaded(&LoaderId("L1".into()));
        assert!(rx.try_recv().is_err());
        c.on_load(&LoaderId("L1".into()));
        assert!(rx.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn abort_fails_pending_waiters() {
        let mut c = ctx();
        c.begin_navigation();
        c.on_committed(LoaderId("L1".into()), "http://x/".into());
        let rx = c.wait_for(LoaderId("L1".into()), ReadinessState::Complete);
        c.abort_navigation();
        assert!(rx.await.unwrap().is_err());
    }
}
