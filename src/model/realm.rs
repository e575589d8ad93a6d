//! `Realm` — a JavaScript execution realm and the script evaluation /
//! serialization contracts it exposes (spec section 4.4).

use serde_json::Value;

use crate::bidi::script::{LocalValue, ResultOwnership, Target as ScriptTarget};
use crate::bidi::{BrowsingContextId, Handle, RealmId, RealmType};
use crate::bidi::script::RemoteValue;
use crate::cdp::runtime::{
    CallArgument, CallFunctionOnParams, EvaluateParams, ExecutionContextId, ReleaseObjectParams,
    RemoteObject, SerializationOptions,
};
use crate::cdp::target::SessionId;
use crate::conn::CdpSender;
use crate::error::CdpError;

/// The literal four-character divider between a navigable id and a backend
/// node id in a `sharedId` (spec 4.4 "Serialization" — kept as a single
/// constant used everywhere a `sharedId` is built or parsed).
pub const SHARED_ID_DIVIDER: &str = "_el_";

pub struct Realm {
    pub id: RealmId,
    pub context_id: BrowsingContextId,
    pub execution_context_id: ExecutionContextId,
    pub session_id: SessionId,
    pub origin: String,
    pub realm_type: RealmType,
    pub sandbox: Option<String>,
}

impl Realm {
    pub fn matches_target(&self, target: &ScriptTarget) -> bool {
        match target {
            ScriptTarget::Realm { realm } => &self.id == realm,
            ScriptTarget::Context { context, sandbox } => {
                &self.context_id == context && sandbox.as_deref() == self.sandbox.as_deref()
            }
        }
    }

    pub async fn evaluate(
        &self,
        cdp: &CdpSender,
        expression: String,
        await_promise: bool,
        ownership: ResultOwnership,
    ) -> Result<RemoteValue, CdpError> {
        let result = cdp
            .send_command(
                EvaluateParams {
                    expression,
                    context_id: Some(self.execution_context_id),
                    await_promise,
                    serialization_options: Some(SerializationOptions {
                        serialization: "deep".into(),
                    }),
                },
                Some(self.session_id.clone()),
            )
            .await?;
        self.finish(cdp, result.result, ownership).await
    }

    pub async fn call_function(
        &self,
        cdp: &CdpSender,
        function_declaration: String,
        this: Option<LocalValue>,
        arguments: Vec<LocalValue>,
        await_promise: bool,
        ownership: ResultOwnership,
    ) -> Result<RemoteValue, CdpError> {
        let this_object_id = this.and_then(local_value_object_id);
        let args = arguments.into_iter().map(local_value_to_call_argument).collect();

        let result = cdp
            .send_command(
                CallFunctionOnParams {
                    function_declaration,
                    object_id: this_object_id,
                    execution_context_id: Some(self.execution_context_id),
                    arguments: args,
                    await_promise,
                    serialization_options: Some(SerializationOptions {
                        serialization: "deep".into(),
                    }),
                },
                Some(self.session_id.clone()),
            )
            .await?;
        self.finish(cdp, result.result, ownership).await
    }

    async fn finish(
        &self,
        cdp: &CdpSender,
        remote: RemoteObject,
        ownership: ResultOwnership,
    ) -> Result<RemoteValue, CdpError> {
        let navigable_id = self.context_id.0.clone();
        let mut value = serialize_cdp_object(&remote, &navigable_id);

        match (ownership, remote.object_id) {
            (ResultOwnership::Root, Some(object_id)) => {
                value.handle = Some(object_id);
            }
            (ResultOwnership::None, Some(object_id)) => {
                if let Err(err) = cdp
                    .send_command(
                        ReleaseObjectParams { object_id },
                        Some(self.session_id.clone()),
                    )
                    .await
                {
                    if !err.is_invalid_remote_object_id() {
                        return Err(err);
                    }
                }
            }
            _ => {}
        }
        Ok(value)
    }
}

fn local_value_object_id(value: LocalValue) -> Option<String> {
    match value {
        LocalValue::RemoteReference { handle } => Some(handle.0),
        LocalValue::Raw(_) => None,
    }
}

fn local_value_to_call_argument(value: LocalValue) -> CallArgument {
    match value {
        LocalValue::RemoteReference { handle } => CallArgument {
            value: None,
            object_id: Some(handle.0),
        },
        LocalValue::Raw(v) => CallArgument {
            value: Some(v),
            object_id: None,
        },
    }
}

/// Renders a CDP `RemoteObject` into the BiDi `RemoteValue` shape (spec
/// 4.4 "Serialization"): `weakLocalObjectReference` becomes `internalId`,
/// `platformobject` collapses to a bare `object`, and `node` values gain a
/// `sharedId` built from the navigable id and backend node id.
pub fn serialize_cdp_object(remote: &RemoteObject, navigable_id: &str) -> RemoteValue {
    match &remote.deep_serialized_value {
        Some(dsv) => transform(dsv, navigable_id),
        None => RemoteValue {
            value_type: remote.object_type.clone(),
            ..Default::default()
        },
    }
}

fn transform(dsv: &crate::cdp::runtime::DeepSerializedValue, navigable_id: &str) -> RemoteValue {
    let value_type = if dsv.value_type == "platformobject" {
        "object".to_string()
    } else {
        dsv.value_type.clone()
    };

    if value_type == "node" {
        if let Some(backend_node_id) = dsv
            .value
            .as_ref()
            .and_then(|v| v.get("backendNodeId"))
            .and_then(|v| v.as_i64())
        {
            return RemoteValue {
                value_type,
                value: dsv.value.clone(),
                handle: None,
                internal_id: dsv.weak_local_object_reference.clone(),
                shared_id: Some(format!("{navigable_id}{SHARED_ID_DIVIDER}{backend_node_id}")),
            };
        }
    }

    let value = dsv.value.as_ref().map(|v| transform_value(v, navigable_id));

    RemoteValue {
        value_type,
        value,
        handle: None,
        internal_id: dsv.weak_local_object_reference.clone(),
        shared_id: None,
    }
}

/// Recurses into array/set elements and object/map entries, which CDP
/// represents as nested deep-serialized-value-shaped JSON.
fn transform_value(value: &Value, navigable_id: &str) -> Value {
    match value {
        Value::Array(items) => {
            // Heuristic: an array of 2-element [key, value] pairs where the
            // first element is a string is a Map/Object entry list; anything
            // else is a plain array/set of nested values.
            let is_entries = !items.is_empty()
                && items.iter().all(|item| {
                    item.as_array().map(|pair| pair.len() == 2).unwrap_or(false)
                });
            if is_entries {
                Value::Array(
                    items
                        .iter()
                        .map(|pair| {
                            let pair = pair.as_array().unwrap();
                            Value::Array(vec![
                                transform_nested(&pair[0], navigable_id),
                                transform_nested(&pair[1], navigable_id),
                            ])
                        })
                        .collect(),
                )
            } else {
                Value::Array(items.iter().map(|v| transform_nested(v, navigable_id)).collect())
            }
        }
        other => other.clone(),
    }
}

fn transform_nested(value: &Value, navigable_id: &str) -> Value {
    if let Ok(dsv) = serde_json::from_value::<crate::cdp::runtime::DeepSerializedValue>(value.clone()) {
        if value.get("type").is_some() {
            return serde_json::to_value(transform(&dsv, navigable_id)).unwrap_or(Value::Null);
        }
    }
    value.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::runtime::DeepSerializedValue;

    #[test]
    fn platformobject_collapses_to_object() {
        let dsv = DeepSerializedValue {
            value_type: "platformobject".into(),
            value: None,
            weak_local_object_reference: None,
        };
        let rv = transform(&dsv, "NAV1");
        assert_eq!(rv.value_type, "object");
    }

    #[test]
    fn node_gets_shared_id() {
        let dsv = DeepSerializedValue {
            value_type: "node".into(),
            value: Some(serde_json::json!({"backendNodeId": 42})),
            weak_local_object_reference: None,
        };
        let rv = transform(&dsv, "NAV1");
        assert_eq!(rv.shared_id.as_deref(), Some("NAV1_el_42"));
    }

    #[test]
    fn weak_local_reference_becomes_internal_id() {
        let dsv = DeepSerializedValue {
            value_type: "object".into(),
            value: Some(serde_json::json!([])),
            weak_local_object_reference: Some("wlor-1".into()),
        };
        let rv = transform(&dsv, "NAV1");
        assert_eq!(rv.internal_id.as_deref(), Some("wlor-1"));
    }
}
