//! `script.*` — evaluation, function calls, handle disown (spec section
//! 4.4), and the `RemoteValue` shape script results are rendered into.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BrowsingContextId, Handle, RealmId};
use crate::model::preload_script::PreloadScriptId;

/// Either a browsing-context realm (optionally a named sandbox) or a realm
/// referenced directly by id (spec section 3 "Realm").
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Context {
        context: BrowsingContextId,
        #[serde(default)]
        sandbox: Option<String>,
    },
    Realm {
        realm: RealmId,
    },
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResultOwnership {
    Root,
    #[default]
    None,
}

/// A value passed as an argument to `script.callFunction`: either a literal
/// JSON value or a reference to a previously obtained handle.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LocalValue {
    RemoteReference { handle: Handle },
    Raw(Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateParams {
    pub expression: String,
    pub target: Target,
    #[serde(rename = "awaitPromise", default)]
    pub await_promise: bool,
    #[serde(rename = "resultOwnership", default)]
    pub result_ownership: ResultOwnership,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallFunctionParams {
    #[serde(rename = "functionDeclaration")]
    pub function_declaration: String,
    pub target: Target,
    #[serde(default)]
    pub this: Option<LocalValue>,
    #[serde(default)]
    pub arguments: Vec<LocalValue>,
    #[serde(rename = "awaitPromise", default)]
    pub await_promise: bool,
    #[serde(rename = "resultOwnership", default)]
    pub result_ownership: ResultOwnership,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisownParams {
    pub handles: Vec<Handle>,
    pub target: Target,
}

/// `script.addPreloadScript` (spec section 4.6 Component D). `contexts`
/// carries at most one top-level context in this single-client mediator, so
/// it is modeled as the same optional single-context filter
/// `BidiPreloadScript` stores rather than the full BiDi list shape.
#[derive(Debug, Clone, Deserialize)]
pub struct AddPreloadScriptParams {
    #[serde(rename = "functionDeclaration")]
    pub function_declaration: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
    #[serde(default)]
    pub contexts: Option<Vec<BrowsingContextId>>,
    #[serde(default)]
    pub sandbox: Option<String>,
}

impl AddPreloadScriptParams {
    /// The first (only, in this mediator) context named in `contexts`, or
    /// `None` for a global script (spec invariant 5).
    pub fn context_filter(&self) -> Option<BrowsingContextId> {
        self.contexts.as_ref().and_then(|c| c.first().cloned())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemovePreloadScriptParams {
    pub script: PreloadScriptId,
}

/// The BiDi rendering of a script result (spec 4.4 "Serialization").
#[derive(Debug, Clone, Serialize, Default)]
pub struct RemoteValue {
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(rename = "internalId", skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    #[serde(rename = "sharedId", skip_serializing_if = "Option::is_none")]
    pub shared_id: Option<String>,
}
