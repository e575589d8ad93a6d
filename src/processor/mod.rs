//! `CommandProcessor` (component F, dispatch half) — parses inbound BiDi
//! envelopes and routes them to a domain processor (spec section 4.6).
//! Commands run concurrently (spec 4.6 "multiple commands may be in flight
//! at once"): each inbound message is spawned as its own `!Send` task on
//! the mediator's `LocalSet`, so a slow navigation never blocks an
//! unrelated `session.status`.

pub mod browsing_context;
pub mod cdp;
pub mod input;
pub mod script;
pub mod session;

use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::bidi::{parse_envelope, OutgoingMessage};
use crate::context::Context;
use crate::error::BidiError;

fn parse<T: DeserializeOwned>(params: Value) -> Result<T, BidiError> {
    serde_json::from_value(params).map_err(|e| BidiError::invalid_argument(e.to_string()))
}

pub struct CommandProcessor {
    ctx: Rc<Context>,
}

impl CommandProcessor {
    pub fn new(ctx: Rc<Context>) -> Self {
        Self { ctx }
    }

    /// Feeds one inbound BiDi text message (spec 4.6 step 1-3).
    pub fn handle_incoming_text(&self, text: &str) {
        match parse_envelope(text) {
            Ok(cmd) => {
                let ctx = self.ctx.clone();
                tokio::task::spawn_local(async move {
                    let outcome = dispatch(&ctx, &cmd.method, cmd.params).await;
                    match outcome {
                        Ok(result) => ctx.emit(OutgoingMessage::success(cmd.id, result, cmd.channel)),
                        Err(err) => ctx.emit(OutgoingMessage::error(Some(cmd.id), &err, cmd.channel)),
                    }
                });
            }
            Err((id, err)) => self.ctx.emit(OutgoingMessage::error(id, &err, None)),
        }
    }
}

async fn dispatch(ctx: &Context, method: &str, params: Value) -> Result<Value, BidiError> {
    match method {
        "session.status" => session::status(ctx).await,
        "session.new" => session::new(ctx, params).await,
        "session.end" => session::end(ctx).await,
        "session.subscribe" => session::subscribe(ctx, parse(params)?).await,
        "session.unsubscribe" => session::unsubscribe(ctx, parse(params)?).await,
        "browsingContext.navigate" => browsing_context::navigate(ctx, parse(params)?).await,
        "browsingContext.create" => browsing_context::create(ctx, parse(params)?).await,
        "browsingContext.close" => browsing_context::close(ctx, parse(params)?).await,
        "browsingContext.getTree" => browsing_context::get_tree(ctx, parse(params)?).await,
        "browsingContext.captureScreenshot" => browsing_context::capture_screenshot(ctx, parse(params)?).await,
        "browsingContext.print" => browsing_context::print(ctx, parse(params)?).await,
        "script.evaluate" => script::evaluate(ctx, parse(params)?).await,
        "script.callFunction" => script::call_function(ctx, parse(params)?).await,
        "script.disown" => script::disown(ctx, parse(params)?).await,
        "script.addPreloadScript" => script::add_preload_script(ctx, parse(params)?).await,
        "script.removePreloadScript" => script::remove_preload_script(ctx, parse(params)?).await,
        "input.performActions" => input::perform_actions(ctx, parse(params)?).await,
        "input.releaseActions" => input::release_actions(ctx, parse(params)?).await,
        "cdp.sendCommand" => cdp::send_command(ctx, parse(params)?).await,
        "cdp.getSession" => cdp::get_session(ctx, parse(params)?).await,
        other => Err(BidiError::unknown_command(other)),
    }
}
