//! `Context` — wires every collaborator together (design note 9:
//! "Singletons … threaded through as explicit collaborators into a single
//! `Context` struct constructed at startup — no globals"). Single-threaded
//! cooperative scheduling (spec section 5) means every store here is a
//! plain `RefCell`, not a `Mutex`: re-entrancy is the only hazard, and it is
//! avoided by completing each mutation before the next `.await` point.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};

use crate::bidi::{BrowsingContextId, OutgoingMessage};
use crate::cdp::target::TargetId;
use crate::config::MapperConfig;
use crate::conn::CdpSender;
use crate::error::BidiError;
use crate::event_manager::EventManager;
use crate::model::cdp_target::CdpTarget;
use crate::model::input_state::InputState;
use crate::storage::{BrowsingContextStorage, PreloadScriptStorage, RealmStorage};

pub struct Context {
    pub config: MapperConfig,
    pub cdp: CdpSender,
    pub contexts: RefCell<BrowsingContextStorage>,
    pub realms: RefCell<RealmStorage>,
    pub preload_scripts: RefCell<PreloadScriptStorage>,
    pub targets: RefCell<HashMap<TargetId, CdpTarget>>,
    pub input_states: RefCell<HashMap<BrowsingContextId, InputState>>,
    pub events: RefCell<EventManager>,
    /// Resolved by the event router's `Target.detachedFromTarget` handler
    /// (spec 8 scenario 6: `browsingContext.close` resolves only once the
    /// detach has actually been observed, not merely acknowledged).
    close_waiters: RefCell<HashMap<TargetId, Vec<oneshot::Sender<()>>>>,
    outbound: mpsc::UnboundedSender<OutgoingMessage>,
    next_context_seq: Cell<u64>,
    next_realm_seq: Cell<u64>,
}

impl Context {
    pub fn new(config: MapperConfig, cdp: CdpSender, outbound: mpsc::UnboundedSender<OutgoingMessage>) -> Self {
        Self {
            config,
            cdp,
            contexts: RefCell::new(BrowsingContextStorage::new()),
            realms: RefCell::new(RealmStorage::new()),
            preload_scripts: RefCell::new(PreloadScriptStorage::new()),
            targets: RefCell::new(HashMap::new()),
            input_states: RefCell::new(HashMap::new()),
            events: RefCell::new(EventManager::new()),
            close_waiters: RefCell::new(HashMap::new()),
            outbound,
            next_context_seq: Cell::new(0),
            next_realm_seq: Cell::new(0),
        }
    }

    /// Registers interest in `target_id`'s detach; must be called before
    /// issuing the CDP command that triggers it, so the waiter is in place
    /// before the event router can observe the detach.
    pub fn wait_for_detach(&self, target_id: TargetId) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.close_waiters.borrow_mut().entry(target_id).or_default().push(tx);
        rx
    }

    /// Resolves every waiter registered for `target_id` (called by the
    /// event router on `Target.detachedFromTarget`).
    pub fn notify_detached(&self, target_id: &TargetId) {
        if let Some(waiters) = self.close_waiters.borrow_mut().remove(target_id) {
            for tx in waiters {
                let _ = tx.send(());
            }
        }
    }

    /// Awaits `context`'s `unblocked` signal (spec 4.3 "every operation
    /// that needs a fully initialized context … first awaits the context's
    /// `unblocked` signal"). The receiver is obtained and the `RefCell`
    /// borrow dropped before awaiting, so a concurrent CDP event handler
    /// can still mutate `contexts` while this is pending.
    pub async fn await_unblocked(&self, context: &BrowsingContextId) -> Result<(), BidiError> {
        let mut rx = {
            let contexts = self.contexts.borrow();
            contexts.get_context(context)?.unblocked.subscribe()
        };
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                break;
            }
        }
        Ok(())
    }

    /// Awaits `context`'s `loaded` signal (spec 4.3's optional second half
    /// of `awaitUnblocked` / `awaitLoaded`).
    pub async fn await_loaded(&self, context: &BrowsingContextId) -> Result<(), BidiError> {
        let mut rx = {
            let contexts = self.contexts.borrow();
            contexts.get_context(context)?.loaded.subscribe()
        };
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                break;
            }
        }
        Ok(())
    }

    pub fn next_context_id(&self) -> BrowsingContextId {
        let n = self.next_context_seq.get();
        self.next_context_seq.set(n + 1);
        BrowsingContextId(format!("context-{n}"))
    }

    pub fn next_realm_id(&self) -> crate::bidi::RealmId {
        let n = self.next_realm_seq.get();
        self.next_realm_seq.set(n + 1);
        crate::bidi::RealmId(format!("realm-{n}"))
    }

    /// Sends one outbound wire message (response or event) to the host's
    /// outgoing-BiDi-string sink.
    pub fn emit(&self, message: OutgoingMessage) {
        let _ = self.outbound.send(message);
    }

    /// The CDP session id owning `context`, used by every operation that
    /// must issue a CDP command scoped to that context's target.
    pub fn session_for_context(&self, context: &BrowsingContextId) -> Result<crate::cdp::target::SessionId, BidiError> {
        let contexts = self.contexts.borrow();
        let ctx = contexts.get_context(context)?;
        let targets = self.targets.borrow();
        let target = targets
            .get(&ctx.target_id)
            .ok_or_else(|| BidiError::no_such_frame(format!("target for {} is gone", context.0)))?;
        Ok(target.session_id.clone())
    }

    /// Fails if `target_id` is the mediator's own hosting tab (spec
    /// invariant 6: "filtered out of all public responses").
    pub fn is_self_target(&self, target_id: &TargetId) -> bool {
        target_id.0 == self.config.self_target_id
    }
}
