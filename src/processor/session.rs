//! `session.*` — subscription bookkeeping plus the minimal session
//! negotiation surface this mediator supports (SPEC_FULL 4.6).

use serde_json::{json, Value};

use crate::bidi::session::{SubscribeParams, UnsubscribeParams};
use crate::context::Context;
use crate::error::{BidiError, BidiErrorCode};

pub async fn status(_ctx: &Context) -> Result<Value, BidiError> {
    Ok(json!({ "ready": true, "message": "" }))
}

/// This mediator always mediates exactly one already-established session
/// (SPEC_FULL 4.6); it never negotiates a new one.
pub async fn new(_ctx: &Context, _params: Value) -> Result<Value, BidiError> {
    Err(BidiError::new(
        BidiErrorCode::SessionNotCreated,
        "this mediator bridges a single, already-established session",
    ))
}

/// Tears down every storage and detaches every target, mirroring the
/// target-detach cascade in spec section 3.
pub async fn end(ctx: &Context) -> Result<Value, BidiError> {
    let target_ids: Vec<_> = ctx.targets.borrow().keys().cloned().collect();
    for target_id in target_ids {
        let _ = ctx
            .cdp
            .send_command(crate::cdp::target::CloseTargetParams { target_id }, None)
            .await;
    }
    ctx.targets.borrow_mut().clear();
    *ctx.contexts.borrow_mut() = crate::storage::BrowsingContextStorage::new();
    *ctx.realms.borrow_mut() = crate::storage::RealmStorage::new();
    *ctx.preload_scripts.borrow_mut() = crate::storage::PreloadScriptStorage::new();
    *ctx.events.borrow_mut() = crate::event_manager::EventManager::new();
    ctx.input_states.borrow_mut().clear();
    Ok(json!({}))
}

pub async fn subscribe(ctx: &Context, params: SubscribeParams) -> Result<Value, BidiError> {
    let flushed = ctx.events.borrow_mut().subscribe(params.events, params.contexts, params.channel);
    for msg in flushed {
        ctx.emit(msg);
    }
    Ok(json!({}))
}

pub async fn unsubscribe(ctx: &Context, params: UnsubscribeParams) -> Result<Value, BidiError> {
    ctx.events.borrow_mut().unsubscribe(params.events, params.contexts, params.channel);
    Ok(json!({}))
}
