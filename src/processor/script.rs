//! `ScriptProcessor` — evaluation, function calls, handle disown (spec
//! section 4.4).

use serde_json::{json, Value};
use tracing::warn;

use crate::bidi::script::{
    AddPreloadScriptParams, CallFunctionParams, DisownParams, EvaluateParams, RemovePreloadScriptParams,
    Target as ScriptTarget,
};
use crate::bidi::{Handle, RealmId};
use crate::cdp::page;
use crate::cdp::target::{SessionId, TargetId};
use crate::context::Context;
use crate::error::{cdp_error_to_bidi, BidiError};
use crate::storage::realm_storage::RealmFilter;

fn resolve_realm_id(ctx: &Context, target: &ScriptTarget) -> Result<RealmId, BidiError> {
    match target {
        ScriptTarget::Realm { realm } => Ok(realm.clone()),
        ScriptTarget::Context { context, sandbox } => {
            let filter = RealmFilter {
                context_id: Some(context.clone()),
                sandbox: sandbox.clone(),
                ..Default::default()
            };
            let realms = ctx.realms.borrow();
            let realm = realms.get_realm(&filter)?;
            Ok(realm.id.clone())
        }
    }
}

/// The context owning `realm_id`, used to await `unblocked` before running
/// script against it (spec 4.3).
fn context_of_realm(ctx: &Context, realm_id: &RealmId) -> Result<crate::bidi::BrowsingContextId, BidiError> {
    let realms = ctx.realms.borrow();
    let realm = realms
        .get_realm_by_id(realm_id)
        .ok_or_else(|| BidiError::no_such_handle("realm no longer exists"))?;
    Ok(realm.context_id.clone())
}

pub async fn evaluate(ctx: &Context, params: EvaluateParams) -> Result<Value, BidiError> {
    let realm_id = resolve_realm_id(ctx, &params.target)?;
    ctx.await_unblocked(&context_of_realm(ctx, &realm_id)?).await?;
    let remote_value = {
        let realms = ctx.realms.borrow();
        let realm = realms
            .get_realm_by_id(&realm_id)
            .ok_or_else(|| BidiError::no_such_handle("realm no longer exists"))?;
        realm
            .evaluate(&ctx.cdp, params.expression, params.await_promise, params.result_ownership)
            .await
    };
    let mut value = remote_value.map_err(|e| cdp_error_to_bidi(e, true))?;
    if let Some(handle) = value.handle.clone() {
        ctx.realms.borrow_mut().register_handle(Handle(handle), realm_id);
    }
    Ok(serde_json::to_value(value).unwrap_or(Value::Null))
}

pub async fn call_function(ctx: &Context, params: CallFunctionParams) -> Result<Value, BidiError> {
    let realm_id = resolve_realm_id(ctx, &params.target)?;
    ctx.await_unblocked(&context_of_realm(ctx, &realm_id)?).await?;
    let remote_value = {
        let realms = ctx.realms.borrow();
        let realm = realms
            .get_realm_by_id(&realm_id)
            .ok_or_else(|| BidiError::no_such_handle("realm no longer exists"))?;
        // Open question (a): a `this` handle belonging to a different realm
        // is passed through unchecked, matching the upstream mapper's
        // behavior of proceeding rather than rejecting it.
        realm
            .call_function(
                &ctx.cdp,
                params.function_declaration,
                params.this,
                params.arguments,
                params.await_promise,
                params.result_ownership,
            )
            .await
    };
    let mut value = remote_value.map_err(|e| cdp_error_to_bidi(e, true))?;
    if let Some(handle) = value.handle.clone() {
        ctx.realms.borrow_mut().register_handle(Handle(handle), realm_id);
    }
    Ok(serde_json::to_value(value).unwrap_or(Value::Null))
}

/// Idempotent: disowning an unknown handle or one belonging to a different
/// realm than the caller expected is a silent no-op (spec 4.4 "Disown").
pub async fn disown(ctx: &Context, params: DisownParams) -> Result<Value, BidiError> {
    let realm_id = resolve_realm_id(ctx, &params.target)?;
    for handle in &params.handles {
        let owner = ctx.realms.borrow().realm_for_handle(handle).cloned();
        if owner.as_ref() == Some(&realm_id) {
            ctx.realms.borrow_mut().forget_handle(handle);
        }
    }
    Ok(json!({}))
}

/// Every currently attached target whose top-level context matches
/// `context_filter` — the live targets a freshly added record must be
/// materialized on immediately (spec 4.6 "iterate all BiDi records"; this is
/// the symmetric operation run at `addPreloadScript` time rather than at
/// target-attach time).
fn live_targets_for(ctx: &Context, context_filter: &Option<crate::bidi::BrowsingContextId>) -> Vec<(TargetId, SessionId)> {
    let contexts = ctx.contexts.borrow();
    let targets = ctx.targets.borrow();
    contexts
        .get_top_level_contexts()
        .filter(|c| match context_filter {
            None => true,
            Some(id) => &c.id == id,
        })
        .filter_map(|c| targets.get(&c.target_id).map(|t| (c.target_id.clone(), t.session_id.clone())))
        .collect()
}

/// `script.addPreloadScript` (spec 4.6 Component D): registers the record,
/// then installs it on every already-attached target it applies to. Targets
/// that attach afterward pick it up via `CdpTarget::initialize`.
pub async fn add_preload_script(ctx: &Context, params: AddPreloadScriptParams) -> Result<Value, BidiError> {
    if !params.arguments.is_empty() {
        return Err(BidiError::unsupported_operation(
            "script.addPreloadScript arguments are not supported",
        ));
    }
    let context_filter = params.context_filter();
    let id = ctx.preload_scripts.borrow_mut().add_preload_script(
        context_filter.clone(),
        params.function_declaration.clone(),
        params.sandbox.clone(),
    );

    for (target_id, session_id) in live_targets_for(ctx, &context_filter) {
        match ctx
            .cdp
            .send_command(
                page::AddScriptToEvaluateOnNewDocumentParams {
                    source: params.function_declaration.clone(),
                },
                Some(session_id),
            )
            .await
        {
            Ok(result) => ctx
                .preload_scripts
                .borrow_mut()
                .record_installation(&id, target_id, result.identifier),
            Err(err) => warn!(%err, target = %target_id.0, "failed to install preload script on live target"),
        }
    }

    Ok(json!({ "script": id.0 }))
}

/// `script.removePreloadScript`: drops the BiDi record and tears down every
/// CDP materialization it accumulated (spec 4.6, testable property
/// "addPreloadScript followed by removePreloadScript(id) leaves the CDP
/// preload-script set unchanged on every affected target").
pub async fn remove_preload_script(ctx: &Context, params: RemovePreloadScriptParams) -> Result<Value, BidiError> {
    let removed = ctx
        .preload_scripts
        .borrow_mut()
        .remove_bidi_preload_script(&params.script)
        .ok_or_else(|| BidiError::no_such_script("no such preload script"))?;

    for (target_id, cdp_id) in removed.installed {
        let session_id = ctx.targets.borrow().get(&target_id).map(|t| t.session_id.clone());
        if let Some(session_id) = session_id {
            let _ = ctx
                .cdp
                .send_command(
                    page::RemoveScriptToEvaluateOnNewDocumentParams { identifier: cdp_id },
                    Some(session_id),
                )
                .await;
        }
    }

    Ok(json!({}))
}
