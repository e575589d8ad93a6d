//! `Runtime.*` — execution contexts and script evaluation (spec section 4.4).

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::{Command, Method};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ExecutionContextId(pub i64);

#[derive(Debug, Clone, Serialize, Default)]
pub struct EnableParams {}
impl Method for EnableParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Runtime.enable".into()
    }
}
impl Command for EnableParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct RunIfWaitingForDebuggerParams {}
impl Method for RunIfWaitingForDebuggerParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Runtime.runIfWaitingForDebugger".into()
    }
}
impl Command for RunIfWaitingForDebuggerParams {
    type Response = serde_json::Value;
}

/// Mirrors CDP's `serializationOptions`, forwarded verbatim from the BiDi
/// `resultOwnership` request (spec section 4.4 "Serialization").
#[derive(Debug, Clone, Serialize, Default)]
pub struct SerializationOptions {
    pub serialization: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallArgument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluateParams {
    pub expression: String,
    #[serde(rename = "contextId", skip_serializing_if = "Option::is_none")]
    pub context_id: Option<ExecutionContextId>,
    #[serde(rename = "awaitPromise")]
    pub await_promise: bool,
    #[serde(rename = "serializationOptions", skip_serializing_if = "Option::is_none")]
    pub serialization_options: Option<SerializationOptions>,
}
impl Method for EvaluateParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Runtime.evaluate".into()
    }
}
impl Command for EvaluateParams {
    type Response = EvaluateResult;
}
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateResult {
    pub result: RemoteObject,
    #[serde(rename = "exceptionDetails", default)]
    pub exception_details: Option<ExceptionDetails>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallFunctionOnParams {
    #[serde(rename = "functionDeclaration")]
    pub function_declaration: String,
    #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(rename = "executionContextId", skip_serializing_if = "Option::is_none")]
    pub execution_context_id: Option<ExecutionContextId>,
    pub arguments: Vec<CallArgument>,
    #[serde(rename = "awaitPromise")]
    pub await_promise: bool,
    #[serde(rename = "serializationOptions", skip_serializing_if = "Option::is_none")]
    pub serialization_options: Option<SerializationOptions>,
}
impl Method for CallFunctionOnParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Runtime.callFunctionOn".into()
    }
}
impl Command for CallFunctionOnParams {
    type Response = CallFunctionOnResult;
}
#[derive(Debug, Clone, Deserialize)]
pub struct CallFunctionOnResult {
    pub result: RemoteObject,
    #[serde(rename = "exceptionDetails", default)]
    pub exception_details: Option<ExceptionDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExceptionDetails {
    pub text: String,
    #[serde(default)]
    pub exception: Option<RemoteObject>,
}

/// CDP's `Runtime.RemoteObject`, carrying either an `objectId` handle or an
/// inline `deepSerializedValue` depending on the requested serialization.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RemoteObject {
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(rename = "subtype", default)]
    pub subtype: Option<String>,
    #[serde(rename = "objectId", default)]
    pub object_id: Option<String>,
    #[serde(rename = "deepSerializedValue", default)]
    pub deep_serialized_value: Option<DeepSerializedValue>,
}

/// CDP's `deepSerializedValue`, the input to the BiDi `RemoteValue`
/// transform described in spec 4.4.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DeepSerializedValue {
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(rename = "weakLocalObjectReference", default, skip_serializing_if = "Option::is_none")]
    pub weak_local_object_reference: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseObjectParams {
    #[serde(rename = "objectId")]
    pub object_id: String,
}
impl Method for ReleaseObjectParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Runtime.releaseObject".into()
    }
}
impl Command for ReleaseObjectParams {
    type Response = serde_json::Value;
}

// --- Events ---

#[derive(Debug, Clone, Deserialize)]
pub struct AuxData {
    #[serde(rename = "frameId", default)]
    pub frame_id: Option<String>,
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
    #[serde(rename = "type", default)]
    pub world_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionContextDescription {
    pub id: ExecutionContextId,
    pub origin: String,
    pub name: String,
    #[serde(rename = "auxData", default)]
    pub aux_data: Option<AuxData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventExecutionContextCreated {
    pub context: ExecutionContextDescription,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventExecutionContextDestroyed {
    #[serde(rename = "executionContextId")]
    pub execution_context_id: ExecutionContextId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventExecutionContextsCleared {}
