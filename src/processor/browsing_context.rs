//! `BrowsingContextProcessor` (component E) — navigation, tree
//! enumeration, screenshot/print, create/close (spec section 4.3).

use serde_json::{json, Value};

use crate::bidi::browsing_context::{
    CaptureScreenshotParams, CloseParams, CreateParams, CreateType, GetTreeParams, NavigateParams,
    PrintParams,
};
use crate::bidi::BrowsingContextId;
use crate::cdp::page;
use crate::cdp::target::{self as cdp_target, CreateTargetParams};
use crate::context::Context;
use crate::error::{cdp_error_to_bidi, BidiError};
use crate::model::browsing_context::BrowsingContext;

pub async fn navigate(ctx: &Context, params: NavigateParams) -> Result<Value, BidiError> {
    let session = ctx.session_for_context(&params.context)?;
    ctx.await_unblocked(&params.context).await?;

    {
        let mut contexts = ctx.contexts.borrow_mut();
        let c = contexts.get_context_mut(&params.context)?;
        c.begin_navigation();
    }

    let result = ctx
        .cdp
        .send_command(
            page::NavigateParams {
                url: params.url.clone(),
                frame_id: Some(page::FrameId(params.context.0.clone())),
            },
            Some(session),
        )
        .await
        .map_err(|e| cdp_error_to_bidi(e, true))?;

    if let Some(error_text) = result.error_text {
        return Err(BidiError::unknown_error(error_text));
    }
    let loader_id = result
        .loader_id
        .ok_or_else(|| BidiError::unknown_error("Page.navigate returned no loaderId"))?;

    let wait = params.wait.unwrap_or_default();
    let rx = {
        let mut contexts = ctx.contexts.borrow_mut();
        let c = contexts.get_context_mut(&params.context)?;
        c.on_committed(loader_id.clone(), params.url.clone());
        c.wait_for(loader_id.clone(), wait)
    };
    rx.await
        .map_err(|_| BidiError::unknown_error("navigation aborted"))??;

    Ok(json!({ "navigation": loader_id.0, "url": params.url }))
}

pub async fn create(ctx: &Context, params: CreateParams) -> Result<Value, BidiError> {
    let url = "about:blank".to_string();
    let result = ctx
        .cdp
        .send_command(CreateTargetParams::new(url), None)
        .await
        .map_err(|e| cdp_error_to_bidi(e, false))?;

    let context_id = BrowsingContextId(result.target_id.0.clone());
    let parent = match params.create_type {
        CreateType::Tab | CreateType::Window => None,
    };
    ctx.contexts
        .borrow_mut()
        .add_context(BrowsingContext::new(context_id.clone(), parent, result.target_id));

    let flushed = ctx.events.borrow_mut().register_event(
        "browsingContext.contextCreated",
        &context_id,
        json!({ "context": context_id.0, "url": "about:blank", "parent": null }),
    );
    for msg in flushed {
        ctx.emit(msg);
    }

    Ok(json!({ "context": context_id.0 }))
}

pub async fn close(ctx: &Context, params: CloseParams) -> Result<Value, BidiError> {
    let target_id = {
        let contexts = ctx.contexts.borrow();
        let c = contexts.get_context(&params.context)?;
        if !c.is_top_level() {
            return Err(BidiError::invalid_argument(
                "browsingContext.close requires a top-level context",
            ));
        }
        c.target_id.clone()
    };

    // Registered before the command is issued so the waiter is in place no
    // matter how quickly the detach event follows (spec 8 scenario 6:
    // close resolves only once the detach has actually been observed).
    let detached = ctx.wait_for_detach(target_id.clone());

    ctx.cdp
        .send_command(cdp_target::CloseTargetParams { target_id: target_id.clone() }, None)
        .await
        .map_err(|e| cdp_error_to_bidi(e, true))?;

    // The event router (`mapper::on_detached_from_target`) performs the
    // actual context/realm/target cleanup when the detach arrives.
    let _ = detached.await;

    Ok(json!({}))
}

pub async fn get_tree(ctx: &Context, params: GetTreeParams) -> Result<Value, BidiError> {
    let contexts = ctx.contexts.borrow();
    let roots: Vec<BrowsingContextId> = match &params.root {
        Some(id) => {
            contexts.get_context(id)?;
            vec![id.clone()]
        }
        None => contexts.get_top_level_contexts().map(|c| c.id.clone()).collect(),
    };

    let tree: Vec<Value> = roots
        .iter()
        .filter_map(|id| contexts.find_context(id))
        .filter(|c| !ctx.is_self_target(&c.target_id))
        .map(|c| describe(&contexts, c, params.max_depth))
        .collect();

    Ok(json!({ "contexts": tree }))
}

fn describe(contexts: &crate::storage::BrowsingContextStorage, context: &BrowsingContext, max_depth: Option<u32>) -> Value {
    let children: Vec<Value> = if max_depth != Some(0) {
        contexts
            .children_of(&context.id)
            .map(|child| describe(contexts, child, max_depth.map(|d| d.saturating_sub(1))))
            .collect()
    } else {
        Vec::new()
    };
    json!({
        "context": context.id.0,
        "url": context.url,
        "children": children,
        "parent": context.parent_id.as_ref().map(|p| p.0.clone()),
    })
}

pub async fn capture_screenshot(ctx: &Context, params: CaptureScreenshotParams) -> Result<Value, BidiError> {
    let session = ctx.session_for_context(&params.context)?;
    // Open question (b): only `unblocked` is awaited here, not `loaded` —
    // the upstream mapper screenshots a not-yet-loaded frame as-is.
    ctx.await_unblocked(&params.context).await?;
    let result = ctx
        .cdp
        .send_command(page::CaptureScreenshotParams::default(), Some(session))
        .await
        .map_err(|e| cdp_error_to_bidi(e, true))?;
    Ok(json!({ "data": result.data }))
}

pub async fn print(ctx: &Context, params: PrintParams) -> Result<Value, BidiError> {
    let session = ctx.session_for_context(&params.context)?;
    ctx.await_unblocked(&params.context).await?;
    let result = ctx
        .cdp
        .send_command(page::PrintToPdfParams::default(), Some(session))
        .await
        .map_err(|e| cdp_error_to_bidi(e, true))?;
    Ok(json!({ "data": result.data }))
}
