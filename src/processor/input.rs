//! `InputProcessor` — `input.performActions` / `input.releaseActions`
//! (spec section 4.5), delegating the tick decomposition to
//! [`crate::model::input_state::InputState`].

use serde_json::{json, Value};

use crate::bidi::input::{PerformActionsParams, ReleaseActionsParams};
use crate::context::Context;
use crate::error::BidiError;
use crate::model::input_state::InputState;

/// The top-level context that owns a per-tree `InputState` (spec 4.5:
/// "per top-level context").
fn top_level_of(ctx: &Context, context: &crate::bidi::BrowsingContextId) -> Result<crate::bidi::BrowsingContextId, BidiError> {
    let contexts = ctx.contexts.borrow();
    let mut current = contexts.get_context(context)?;
    while let Some(parent_id) = &current.parent_id {
        current = contexts.get_context(parent_id)?;
    }
    Ok(current.id.clone())
}

pub async fn perform_actions(ctx: &Context, params: PerformActionsParams) -> Result<Value, BidiError> {
    let top_level = top_level_of(ctx, &params.context)?;
    let session = ctx.session_for_context(&top_level)?;
    ctx.await_unblocked(&top_level).await?;

    // Each source's actions run against the session owning the top-level
    // context; the `InputState` itself must outlive the `.await` inside
    // `perform_actions`, so it is removed from the map for the duration and
    // reinserted afterward rather than held under a live `RefCell` borrow.
    let mut state = ctx
        .input_states
        .borrow_mut()
        .remove(&top_level)
        .unwrap_or_else(InputState::new);

    let result = state.perform_actions(&ctx.cdp, &session, params.actions).await;
    ctx.input_states.borrow_mut().insert(top_level, state);
    result?;
    Ok(json!({}))
}

pub async fn release_actions(ctx: &Context, params: ReleaseActionsParams) -> Result<Value, BidiError> {
    let top_level = top_level_of(ctx, &params.context)?;
    let session = ctx.session_for_context(&top_level)?;

    if let Some(mut state) = ctx.input_states.borrow_mut().remove(&top_level) {
        state.release_actions(&ctx.cdp, &session).await?;
    }
    Ok(json!({}))
}
