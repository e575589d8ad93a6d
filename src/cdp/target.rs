//! `Target.*` — attach/detach lifecycle that drives the CdpTarget / session
//! state machine (spec section 3 "Lifecycle").

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::{Command, Method};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TargetId(pub String);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BrowserContextId(pub String);

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TargetInfo {
    #[serde(rename = "targetId")]
    pub target_id: TargetId,
    #[serde(rename = "type")]
    pub target_type: String,
    pub title: String,
    pub url: String,
    pub attached: bool,
    #[serde(rename = "openerId", default)]
    pub opener_id: Option<TargetId>,
    #[serde(rename = "browserContextId", default)]
    pub browser_context_id: Option<BrowserContextId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventAttachedToTarget {
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    #[serde(rename = "targetInfo")]
    pub target_info: TargetInfo,
    #[serde(rename = "waitingForDebugger")]
    pub waiting_for_debugger: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventDetachedFromTarget {
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    #[serde(rename = "targetId", default)]
    pub target_id: Option<TargetId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetAutoAttachParams {
    #[serde(rename = "autoAttach")]
    pub auto_attach: bool,
    #[serde(rename = "waitForDebuggerOnStart")]
    pub wait_for_debugger_on_start: bool,
    pub flatten: bool,
}

impl Method for SetAutoAttachParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Target.setAutoAttach".into()
    }
}
impl Command for SetAutoAttachParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachToTargetParams {
    #[serde(rename = "targetId")]
    pub target_id: TargetId,
    pub flatten: bool,
}
impl Method for AttachToTargetParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Target.attachToTarget".into()
    }
}
#[derive(Debug, Clone, Deserialize)]
pub struct AttachToTargetResult {
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
}
impl Command for AttachToTargetParams {
    type Response = AttachToTargetResult;
}

#[derive(Debug, Clone, Serialize)]
pub struct DetachFromTargetParams {
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}
impl Method for DetachFromTargetParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Target.detachFromTarget".into()
    }
}
impl Command for DetachFromTargetParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct CloseTargetParams {
    #[serde(rename = "targetId")]
    pub target_id: TargetId,
}
impl Method for CloseTargetParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Target.closeTarget".into()
    }
}
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CloseTargetResult {
    #[serde(default)]
    pub success: bool,
}
impl Command for CloseTargetParams {
    type Response = CloseTargetResult;
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CreateTargetParams {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none", rename = "browserContextId")]
    pub browser_context_id: Option<BrowserContextId>,
}
impl CreateTargetParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            browser_context_id: None,
        }
    }
}
impl Method for CreateTargetParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Target.createTarget".into()
    }
}
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTargetResult {
    #[serde(rename = "targetId")]
    pub target_id: TargetId,
}
impl Command for CreateTargetParams {
    type Response = CreateTargetResult;
}

#[derive(Debug, Clone, Serialize)]
pub struct SetDiscoverTargetsParams {
    pub discover: bool,
}
impl SetDiscoverTargetsParams {
    pub fn new(discover: bool) -> Self {
        Self { discover }
    }
}
impl Method for SetDiscoverTargetsParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Target.setDiscoverTargets".into()
    }
}
impl Command for SetDiscoverTargetsParams {
    type Response = serde_json::Value;
}
