//! `cdp.*` — the raw CDP passthrough bridge (SPEC_FULL 4.7). Restored from
//! the real BiDi/CDP bridge surface; it is ambient plumbing on top of the
//! already-specified [`crate::conn::CdpConnection`], not a new subsystem.

use serde::Deserialize;
use serde_json::Value;

use super::BrowsingContextId;

#[derive(Debug, Clone, Deserialize)]
pub struct SendCommandParams {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(rename = "session", default)]
    pub session: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetSessionParams {
    pub context: BrowsingContextId,
}
