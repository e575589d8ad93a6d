//! `Page.*` — navigation, lifecycle events, screenshot/print, preload
//! scripts (spec sections 3, 4.3).

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::{Command, Method};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct FrameId(pub String);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct LoaderId(pub String);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ScriptIdentifier(pub String);

#[derive(Debug, Clone, Serialize, Default)]
pub struct EnableParams {}
impl Method for EnableParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Page.enable".into()
    }
}
impl Command for EnableParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct SetLifecycleEventsEnabledParams {
    pub enabled: bool,
}
impl Method for SetLifecycleEventsEnabledParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Page.setLifecycleEventsEnabled".into()
    }
}
impl Command for SetLifecycleEventsEnabledParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct NavigateParams {
    pub url: String,
    #[serde(rename = "frameId", skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<FrameId>,
}
impl Method for NavigateParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Page.navigate".into()
    }
}
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NavigateResult {
    #[serde(rename = "frameId")]
    pub frame_id: FrameId,
    #[serde(rename = "loaderId", default)]
    pub loader_id: Option<LoaderId>,
    #[serde(rename = "errorText", default)]
    pub error_text: Option<String>,
}
impl Command for NavigateParams {
    type Response = NavigateResult;
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CaptureScreenshotParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}
impl Method for CaptureScreenshotParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Page.captureScreenshot".into()
    }
}
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureScreenshotResult {
    pub data: String,
}
impl Command for CaptureScreenshotParams {
    type Response = CaptureScreenshotResult;
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct PrintToPdfParams {}
impl Method for PrintToPdfParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Page.printToPDF".into()
    }
}
#[derive(Debug, Clone, Deserialize)]
pub struct PrintToPdfResult {
    pub data: String,
}
impl Command for PrintToPdfParams {
    type Response = PrintToPdfResult;
}

#[derive(Debug, Clone, Serialize)]
pub struct AddScriptToEvaluateOnNewDocumentParams {
    pub source: String,
}
impl Method for AddScriptToEvaluateOnNewDocumentParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Page.addScriptToEvaluateOnNewDocument".into()
    }
}
#[derive(Debug, Clone, Deserialize)]
pub struct AddScriptToEvaluateOnNewDocumentResult {
    pub identifier: ScriptIdentifier,
}
impl Command for AddScriptToEvaluateOnNewDocumentParams {
    type Response = AddScriptToEvaluateOnNewDocumentResult;
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveScriptToEvaluateOnNewDocumentParams {
    pub identifier: ScriptIdentifier,
}
impl Method for RemoveScriptToEvaluateOnNewDocumentParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Page.removeScriptToEvaluateOnNewDocument".into()
    }
}
impl Command for RemoveScriptToEvaluateOnNewDocumentParams {
    type Response = serde_json::Value;
}

// --- Events ---

#[derive(Debug, Clone, Deserialize)]
pub struct EventFrameAttached {
    #[serde(rename = "frameId")]
    pub frame_id: FrameId,
    #[serde(rename = "parentFrameId")]
    pub parent_frame_id: FrameId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventFrameDetached {
    #[serde(rename = "frameId")]
    pub frame_id: FrameId,
    /// `"remove"` or `"swap"`. Only `"remove"` deletes the context, per
    /// spec's OOPIF handling in section 4.3.
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrameInfo {
    pub id: FrameId,
    #[serde(rename = "parentId", default)]
    pub parent_id: Option<FrameId>,
    #[serde(rename = "loaderId")]
    pub loader_id: LoaderId,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventFrameNavigated {
    pub frame: FrameInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventFrameRequestedNavigation {
    #[serde(rename = "frameId")]
    pub frame_id: FrameId,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventLifecycleEvent {
    #[serde(rename = "frameId")]
    pub frame_id: FrameId,
    #[serde(rename = "loaderId")]
    pub loader_id: LoaderId,
    pub name: String,
}
