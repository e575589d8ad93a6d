//! `BidiPreloadScript` — a preload-script record and its per-target CDP
//! materializations (spec section 3, 4.6).

use serde::{Deserialize, Serialize};

use crate::bidi::BrowsingContextId;
use crate::cdp::page::ScriptIdentifier;
use crate::cdp::target::TargetId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreloadScriptId(pub String);

pub struct BidiPreloadScript {
    pub id: PreloadScriptId,
    /// `None` means it applies to every existing and future top-level
    /// context (spec invariant 5).
    pub context_filter: Option<BrowsingContextId>,
    pub function_source: String,
    pub sandbox: Option<String>,
    /// `(target, cdp id)` pairs materializing this record (spec section 3).
    pub installed: Vec<(TargetId, ScriptIdentifier)>,
}

impl BidiPreloadScript {
    pub fn applies_to(&self, context: &BrowsingContextId) -> bool {
        match &self.context_filter {
            None => true,
            Some(id) => id == context,
        }
    }
}
