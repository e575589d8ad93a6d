//! `CdpProcessor` — the raw passthrough bridge (SPEC_FULL 4.7).

use serde_json::{json, Value};

use crate::bidi::cdp::{GetSessionParams, SendCommandParams};
use crate::context::Context;
use crate::error::{cdp_error_to_bidi, BidiError};

struct RawCommand {
    method: std::borrow::Cow<'static, str>,
    params: Value,
}
impl crate::cdp::Method for RawCommand {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        self.method.clone()
    }
}
impl serde::Serialize for RawCommand {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.params.serialize(s)
    }
}
impl crate::cdp::Command for RawCommand {
    type Response = Value;
}

pub async fn send_command(ctx: &Context, params: SendCommandParams) -> Result<Value, BidiError> {
    let session = params.session.map(crate::cdp::target::SessionId);
    let result = ctx
        .cdp
        .send_command(
            RawCommand {
                method: params.method.into(),
                params: params.params,
            },
            session,
        )
        .await
        .map_err(|e| cdp_error_to_bidi(e, false))?;
    Ok(result)
}

pub async fn get_session(ctx: &Context, params: GetSessionParams) -> Result<Value, BidiError> {
    let session = ctx.session_for_context(&params.context)?;
    Ok(json!({ "session": session.0 }))
}
