//! `Mapper` — the host embedding entry point and the cooperative event loop
//! (SPEC_FULL 6.1, spec section 5). This is the Rust-idiomatic rendering of
//! the three platform-provided hooks in spec section 6: a function to send
//! CDP strings out (wired straight into [`CdpConnection`]), a callback fed
//! incoming BiDi strings ([`BidiInboundHandle::feed`]), and a function to
//! send outgoing BiDi strings (the `bidi_outbound` channel passed to
//! [`Mapper::new`]). `Mapper::run` also owns CDP event routing — turning
//! raw `Target.*`/`Page.*`/`Runtime.*` events into mutations on the model
//! entities — since that, too, is part of the single event loop design
//! note 9 calls for ("Express handlers as message-passing into the
//! processor loop rather than as direct upcalls").

use std::rc::Rc;

use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::bidi::{BrowsingContextId, OutgoingMessage, RealmType};
use crate::cdp::page::{
    EventFrameAttached, EventFrameDetached, EventFrameNavigated, EventFrameRequestedNavigation, EventLifecycleEvent,
};
use crate::cdp::runtime::{EventExecutionContextCreated, EventExecutionContextDestroyed};
use crate::cdp::target::{EventAttachedToTarget, EventDetachedFromTarget, SessionId, TargetId};
use crate::cdp::CdpEventMessage;
use crate::config::MapperConfig;
use crate::conn::CdpConnection;
use crate::context::Context;
use crate::model::browsing_context::BrowsingContext;
use crate::model::cdp_target::CdpTarget;
use crate::model::realm::Realm;
use crate::processor::CommandProcessor;

/// Fed by the host's "deliver a CDP string" hook (spec section 6). Backed
/// by a bounded channel sized from [`MapperConfig::channel_buffer_size`];
/// a full channel means the mediator has fallen behind and the message is
/// dropped rather than blocking the host's I/O thread.
pub struct CdpInboundHandle(mpsc::Sender<String>);
impl CdpInboundHandle {
    pub fn feed(&self, text: String) {
        if self.0.try_send(text).is_err() {
            warn!("cdp inbound channel full, dropping message");
        }
    }
}

/// Fed by the host's "deliver a BiDi string" hook (spec section 6).
pub struct BidiInboundHandle(mpsc::Sender<String>);
impl BidiInboundHandle {
    pub fn feed(&self, text: String) {
        if self.0.try_send(text).is_err() {
            warn!("bidi inbound channel full, dropping message");
        }
    }
}

pub struct Mapper {
    ctx: Rc<Context>,
    conn: CdpConnection,
    cdp_text_rx: mpsc::Receiver<String>,
    bidi_text_rx: mpsc::Receiver<String>,
    outgoing_rx: mpsc::UnboundedReceiver<OutgoingMessage>,
    bidi_outbound: mpsc::UnboundedSender<String>,
    processor: CommandProcessor,
}

impl Mapper {
    pub fn new(
        config: MapperConfig,
        cdp_outbound: mpsc::UnboundedSender<String>,
        bidi_outbound: mpsc::UnboundedSender<String>,
    ) -> (Self, CdpInboundHandle, BidiInboundHandle) {
        let (conn, cdp_sender) = CdpConnection::new(cdp_outbound);
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let buffer = config.channel_buffer_size;
        let ctx = Rc::new(Context::new(config, cdp_sender, outgoing_tx));
        let processor = CommandProcessor::new(ctx.clone());

        let (cdp_text_tx, cdp_text_rx) = mpsc::channel(buffer);
        let (bidi_text_tx, bidi_text_rx) = mpsc::channel(buffer);

        let mapper = Self {
            ctx,
            conn,
            cdp_text_rx,
            bidi_text_rx,
            outgoing_rx,
            bidi_outbound,
            processor,
        };
        (mapper, CdpInboundHandle(cdp_text_tx), BidiInboundHandle(bidi_text_tx))
    }

    /// The cooperative event loop (spec section 5): a single `select!` over
    /// outbound CDP command submission, inbound CDP text, inbound BiDi
    /// text, and the mediator's own outgoing BiDi traffic. Must run inside a
    /// `tokio::task::LocalSet` (`CommandProcessor` spawns `!Send` tasks).
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(()) = self.conn.next_command() => {}
                text = self.cdp_text_rx.recv() => {
                    match text {
                        Some(text) => {
                            if let Some(event) = self.conn.handle_incoming_text(&text) {
                                route_cdp_event(&self.ctx, event);
                            }
                        }
                        None => {
                            self.conn.disconnect_all();
                            break;
                        }
                    }
                }
                text = self.bidi_text_rx.recv() => {
                    match text {
                        Some(text) => self.processor.handle_incoming_text(&text),
                        None => break,
                    }
                }
                msg = self.outgoing_rx.recv() => {
                    match msg {
                        Some(msg) => {
                            if let Ok(text) = serde_json::to_string(&msg) {
                                let _ = self.bidi_outbound.send(text);
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    }
}

fn route_cdp_event(ctx: &Rc<Context>, event: CdpEventMessage) {
    match event.method.as_ref() {
        "Target.attachedToTarget" => on_attached_to_target(ctx, event),
        "Target.detachedFromTarget" => on_detached_from_target(ctx, event),
        "Page.frameAttached" => on_frame_attached(ctx, event),
        "Page.frameDetached" => on_frame_detached(ctx, event),
        "Page.frameNavigated" => on_frame_navigated(ctx, event),
        "Page.frameRequestedNavigation" => on_frame_requested_navigation(ctx, event),
        "Page.lifecycleEvent" => on_lifecycle_event(ctx, event),
        "Runtime.executionContextCreated" => on_execution_context_created(ctx, event),
        "Runtime.executionContextDestroyed" => on_execution_context_destroyed(ctx, event),
        "Runtime.executionContextsCleared" => on_execution_contexts_cleared(ctx, event),
        other => debug!(method = %other, "unhandled cdp event"),
    }
}

fn on_attached_to_target(ctx: &Rc<Context>, event: CdpEventMessage) {
    let parsed: EventAttachedToTarget = match serde_json::from_value(event.params) {
        Ok(p) => p,
        Err(err) => return warn!(%err, "malformed attachedToTarget"),
    };
    if ctx.is_self_target(&parsed.target_info.target_id) {
        return;
    }
    let target_id = parsed.target_info.target_id.clone();
    let session_id = parsed.session_id;

    // OOPIF handoff (spec 4.3): a context with this target id already
    // exists, so this is a process swap, not a brand-new context.
    let is_oopif_swap = ctx
        .contexts
        .borrow()
        .find_context(&BrowsingContextId(target_id.0.clone()))
        .is_some();

    if !is_oopif_swap {
        let context_id = BrowsingContextId(target_id.0.clone());
        ctx.contexts
            .borrow_mut()
            .add_context(BrowsingContext::new(context_id.clone(), None, target_id.clone()));
        let flushed = ctx.events.borrow_mut().register_event(
            "browsingContext.contextCreated",
            &context_id,
            json!({ "context": context_id.0, "url": "about:blank", "parent": null }),
        );
        for msg in flushed {
            ctx.emit(msg);
        }
    }

    ctx.targets
        .borrow_mut()
        .insert(target_id.clone(), CdpTarget::new(target_id.clone(), session_id));

    let ctx = ctx.clone();
    tokio::task::spawn_local(async move {
        let top_level = BrowsingContextId(target_id.0.clone());
        let preload: Vec<(String, String)> = ctx
            .preload_scripts
            .borrow()
            .scripts_for_new_target(&top_level)
            .into_iter()
            .map(|s| (s.id.0.clone(), s.function_source.clone()))
            .collect();

        // As in `processor::input::perform_actions`, the entry is removed
        // for the duration of the `.await` rather than held under a live
        // `RefCell` borrow, then reinserted once `initialize` settles.
        let Some(mut target) = ctx.targets.borrow_mut().remove(&target_id) else {
            return;
        };
        match target.initialize(&ctx.cdp, preload).await {
            Ok(()) => {
                // Write each installation back onto its owning BiDi record
                // (spec 4.6 "append the (target, cdpId) pair to that
                // record") so teardown and future removal can find it.
                let mut preload_scripts = ctx.preload_scripts.borrow_mut();
                for (record_id, cdp_id) in &target.installed_preload_scripts {
                    preload_scripts.record_installation(
                        &crate::model::preload_script::PreloadScriptId(record_id.clone()),
                        target_id.clone(),
                        cdp_id.clone(),
                    );
                }
            }
            Err(err) => {
                warn!(%err, target = %target_id.0, "target initialization failed");
                target.mark_failed();
            }
        }
        ctx.targets.borrow_mut().insert(target_id, target);
    });
}

fn on_detached_from_target(ctx: &Rc<Context>, event: CdpEventMessage) {
    let parsed: EventDetachedFromTarget = match serde_json::from_value(event.params) {
        Ok(p) => p,
        Err(err) => return warn!(%err, "malformed detachedFromTarget"),
    };
    let target_id = parsed.target_id.or_else(|| target_id_for_session(ctx, &parsed.session_id));
    let Some(target_id) = target_id else { return };

    let context_id = BrowsingContextId(target_id.0.clone());
    let removed = ctx.contexts.borrow_mut().delete_context(&context_id);
    for removed_ctx in &removed {
        ctx.realms.borrow_mut().delete_realms_for_context(&removed_ctx.id);
        ctx.events.borrow_mut().discard_buffer(&removed_ctx.id);
    }
    ctx.preload_scripts.borrow_mut().remove_cdp_preload_scripts(&target_id);
    ctx.targets.borrow_mut().remove(&target_id);
    ctx.notify_detached(&target_id);
}

fn target_id_for_session(ctx: &Context, session_id: &SessionId) -> Option<TargetId> {
    ctx.targets
        .borrow()
        .values()
        .find(|t| &t.session_id == session_id)
        .map(|t| t.target_id.clone())
}

fn on_frame_attached(ctx: &Rc<Context>, event: CdpEventMessage) {
    let parsed: EventFrameAttached = match serde_json::from_value(event.params) {
        Ok(p) => p,
        Err(err) => return warn!(%err, "malformed frameAttached"),
    };
    let parent_id = BrowsingContextId(parsed.parent_frame_id.0);
    let child_id = BrowsingContextId(parsed.frame_id.0);
    let mut contexts = ctx.contexts.borrow_mut();
    if contexts.find_context(&child_id).is_some() {
        return;
    }
    let Some(parent) = contexts.find_context(&parent_id) else { return };
    let target_id = parent.target_id.clone();
    contexts.add_context(BrowsingContext::new(child_id.clone(), Some(parent_id), target_id));
    drop(contexts);

    let flushed = ctx.events.borrow_mut().register_event(
        "browsingContext.contextCreated",
        &child_id,
        json!({ "context": child_id.0, "url": "about:blank" }),
    );
    for msg in flushed {
        ctx.emit(msg);
    }
}

fn on_frame_detached(ctx: &Rc<Context>, event: CdpEventMessage) {
    let parsed: EventFrameDetached = match serde_json::from_value(event.params) {
        Ok(p) => p,
        Err(err) => return warn!(%err, "malformed frameDetached"),
    };
    // `swap` precedes an OOPIF handoff, not a real removal (spec 4.3).
    if parsed.reason == "swap" {
        return;
    }
    let context_id = BrowsingContextId(parsed.frame_id.0);
    let removed = ctx.contexts.borrow_mut().delete_context(&context_id);
    for removed_ctx in &removed {
        ctx.realms.borrow_mut().delete_realms_for_context(&removed_ctx.id);
        ctx.events.borrow_mut().discard_buffer(&removed_ctx.id);
    }
}

fn on_frame_navigated(ctx: &Rc<Context>, event: CdpEventMessage) {
    let parsed: EventFrameNavigated = match serde_json::from_value(event.params) {
        Ok(p) => p,
        Err(err) => return warn!(%err, "malformed frameNavigated"),
    };
    let context_id = BrowsingContextId(parsed.frame.id.0);
    let mut contexts = ctx.contexts.borrow_mut();
    let Ok(c) = contexts.get_context_mut(&context_id) else { return };
    c.on_committed(parsed.frame.loader_id, parsed.frame.url);
    drop(contexts);
    ctx.realms.borrow_mut().delete_realms_for_context(&context_id);
}

/// The browser itself initiated a navigation (e.g. a link click or a
/// `window.location` assignment the client never asked for). Spec 4.3's
/// `Initial → Navigating` transition fires the same way as a BiDi-issued
/// `browsingContext.navigate`, just without a pending command to resolve.
fn on_frame_requested_navigation(ctx: &Rc<Context>, event: CdpEventMessage) {
    let parsed: EventFrameRequestedNavigation = match serde_json::from_value(event.params) {
        Ok(p) => p,
        Err(err) => return warn!(%err, "malformed frameRequestedNavigation"),
    };
    let context_id = BrowsingContextId(parsed.frame_id.0);
    let mut contexts = ctx.contexts.borrow_mut();
    let Ok(c) = contexts.get_context_mut(&context_id) else { return };
    c.begin_navigation();
}

fn on_lifecycle_event(ctx: &Rc<Context>, event: CdpEventMessage) {
    let parsed: EventLifecycleEvent = match serde_json::from_value(event.params) {
        Ok(p) => p,
        Err(err) => return warn!(%err, "malformed lifecycleEvent"),
    };
    let context_id = BrowsingContextId(parsed.frame_id.0);

    let (matched, url, navigation) = {
        let mut contexts = ctx.contexts.borrow_mut();
        let Ok(c) = contexts.get_context_mut(&context_id) else {
            return;
        };
        let navigation = c.navigable_id.as_ref().map(|l| l.0.clone()).unwrap_or_default();
        match parsed.name.as_str() {
            "DOMContentLoaded" => {
                c.on_dom_content_loaded(&parsed.loader_id);
                (Some("browsingContext.domContentLoaded"), c.url.clone(), navigation)
            }
            "load" => {
                c.on_load(&parsed.loader_id);
                (Some("browsingContext.load"), c.url.clone(), navigation)
            }
            _ => (None, String::new(), navigation),
        }
    };

    if let Some(event_name) = matched {
        let flushed = ctx.events.borrow_mut().register_event(
            event_name,
            &context_id,
            json!({ "context": context_id.0, "url": url, "navigation": navigation }),
        );
        for msg in flushed {
            ctx.emit(msg);
        }
    }
}

fn on_execution_context_created(ctx: &Rc<Context>, event: CdpEventMessage) {
    let parsed: EventExecutionContextCreated = match serde_json::from_value(event.params) {
        Ok(p) => p,
        Err(err) => return warn!(%err, "malformed executionContextCreated"),
    };
    let Some(session_id) = event.session_id.map(SessionId) else { return };
    let Some(frame_id) = parsed.context.aux_data.as_ref().and_then(|a| a.frame_id.clone()) else {
        return;
    };
    let context_id = BrowsingContextId(frame_id);
    if ctx.contexts.borrow().find_context(&context_id).is_none() {
        return;
    }

    let sandbox = parsed
        .context
        .aux_data
        .as_ref()
        .filter(|a| a.world_type.as_deref() == Some("isolated"))
        .and_then(|a| a.name.clone());
    let realm = Realm {
        id: ctx.next_realm_id(),
        context_id: context_id.clone(),
        execution_context_id: parsed.context.id,
        session_id,
        origin: parsed.context.origin,
        realm_type: RealmType::Window,
        sandbox: sandbox.clone(),
    };
    let realm_id = realm.id.clone();
    ctx.realms.borrow_mut().add_realm(realm);
    if let Ok(c) = ctx.contexts.borrow_mut().get_context_mut(&context_id) {
        c.realms_by_sandbox.insert(sandbox, realm_id);
    }
}

fn on_execution_context_destroyed(ctx: &Rc<Context>, event: CdpEventMessage) {
    let parsed: EventExecutionContextDestroyed = match serde_json::from_value(event.params) {
        Ok(p) => p,
        Err(err) => return warn!(%err, "malformed executionContextDestroyed"),
    };
    // Execution-context ids are only unique per session, so this must be
    // scoped the same way `on_execution_contexts_cleared` scopes its purge,
    // or a same-numbered realm in another target/session gets deleted too.
    let Some(session_id) = event.session_id.map(SessionId) else { return };
    let mut realms = ctx.realms.borrow_mut();
    let doomed: Vec<_> = realms
        .find_realms(&crate::storage::realm_storage::RealmFilter {
            session_id: Some(session_id),
            ..Default::default()
        })
        .into_iter()
        .filter(|r| r.execution_context_id == parsed.execution_context_id)
        .map(|r| r.id.clone())
        .collect();
    for id in doomed {
        realms.delete_realm(&id);
    }
}

fn on_execution_contexts_cleared(ctx: &Rc<Context>, event: CdpEventMessage) {
    let Some(session_id) = event.session_id.map(SessionId) else { return };
    let mut realms = ctx.realms.borrow_mut();
    let doomed: Vec<_> = realms
        .find_realms(&crate::storage::realm_storage::RealmFilter {
            session_id: Some(session_id),
            ..Default::default()
        })
        .into_iter()
        .map(|r| r.id.clone())
        .collect();
    for id in doomed {
        realms.delete_realm(&id);
    }
}
