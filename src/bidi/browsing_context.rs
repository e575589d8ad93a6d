//! `browsingContext.*` — navigation, tree enumeration, screenshot/print,
//! create/close (spec section 4.3).

use serde::Deserialize;

use super::BrowsingContextId;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessState {
    None,
    #[default]
    Interactive,
    Complete,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigateParams {
    pub context: BrowsingContextId,
    pub url: String,
    #[serde(default)]
    pub wait: Option<ReadinessState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetTreeParams {
    #[serde(default)]
    pub root: Option<BrowsingContextId>,
    #[serde(default)]
    pub max_depth: Option<u32>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CreateType {
    #[default]
    Tab,
    Window,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateParams {
    #[serde(rename = "type", default)]
    pub create_type: CreateType,
    #[serde(default)]
    pub reference_context: Option<BrowsingContextId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloseParams {
    pub context: BrowsingContextId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureScreenshotParams {
    pub context: BrowsingContextId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrintParams {
    pub context: BrowsingContextId,
}
