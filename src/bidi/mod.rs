//! The BiDi wire layer: envelope parsing and outbound message shapes (spec
//! section 6). The BiDi protocol schema itself is treated as an external,
//! already-typed collaborator per spec section 1 — what lives here is the
//! thin envelope around it (ids, method dispatch key, channel) plus the
//! per-domain param/result types needed to build the typed variants the
//! processors consume.

pub mod browsing_context;
pub mod cdp;
pub mod input;
pub mod script;
pub mod session;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BidiError, BidiErrorCode};

/// A client-assigned string echoed on responses/events so the client can
/// demultiplex (spec Glossary "Channel"). An empty string on the wire is
/// normalized to `None` (spec 4.6 step 1, testable property "Empty-string
/// `channel`").
pub type Channel = Option<String>;

fn normalize_channel(raw: Option<String>) -> Channel {
    match raw {
        Some(s) if s.is_empty() => None,
        other => other,
    }
}

/// The raw inbound envelope before per-method param validation.
#[derive(Debug, Clone)]
pub struct IncomingCommand {
    pub id: u64,
    pub method: String,
    pub params: Value,
    pub channel: Channel,
}

/// Parses the outer envelope (spec 4.6 step 1). Returns the recovered `id`
/// alongside the failure when the payload was at least well-formed JSON, so
/// the caller can still echo it per the testable boundary behaviors.
pub fn parse_envelope(text: &str) -> Result<IncomingCommand, (Option<u64>, BidiError)> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        (
            None,
            BidiError::new(BidiErrorCode::InvalidArgument, format!("malformed json: {e}")),
        )
    })?;

    let obj = value.as_object().ok_or_else(|| {
        (
            None,
            BidiError::invalid_argument("Expected an object envelope"),
        )
    })?;

    let id_value = obj.get("id");
    let id = match id_value {
        Some(Value::Number(n)) if n.as_u64().is_some() => n.as_u64().unwrap(),
        Some(Value::Number(n)) => {
            return Err((
                None,
                BidiError::invalid_argument(format!(
                    "Expected unsigned integer but got {}",
                    n
                )),
            ))
        }
        Some(other) => {
            return Err((
                None,
                BidiError::invalid_argument(format!(
                    "Expected unsigned integer but got {other}"
                )),
            ))
        }
        None => {
            return Err((
                None,
                BidiError::invalid_argument("Expected unsigned integer but got undefined"),
            ))
        }
    };

    let method = match obj.get("method") {
        Some(Value::String(s)) => s.clone(),
        _ => {
            return Err((
                Some(id),
                BidiError::invalid_argument("Expected string but got undefined"),
            ))
        }
    };

    let params = obj.get("params").cloned().unwrap_or(Value::Object(Default::default()));
    if !params.is_object() {
        return Err((
            Some(id),
            BidiError::invalid_argument("Expected object but got non-object params"),
        ));
    }

    let channel = match obj.get("channel") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(_) => {
            return Err((
                Some(id),
                BidiError::invalid_argument("Expected string but got non-string channel"),
            ))
        }
    };

    Ok(IncomingCommand {
        id,
        method,
        params,
        channel: normalize_channel(channel),
    })
}

/// Outbound wire messages: command response, error, or event (spec 6).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    CommandResponse {
        id: u64,
        result: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        channel: Channel,
    },
    ErrorResponse {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        error: &'static str,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stacktrace: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        channel: Channel,
    },
    Event {
        method: String,
        params: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        channel: Channel,
    },
}

impl OutgoingMessage {
    pub fn success(id: u64, result: Value, channel: Channel) -> Self {
        OutgoingMessage::CommandResponse { id, result, channel }
    }

    pub fn error(id: Option<u64>, err: &BidiError, channel: Channel) -> Self {
        OutgoingMessage::ErrorResponse {
            id,
            error: err.code.as_str(),
            message: err.message.clone(),
            stacktrace: err.stacktrace.clone(),
            channel,
        }
    }

    pub fn event(method: impl Into<String>, params: Value, channel: Channel) -> Self {
        OutgoingMessage::Event {
            method: method.into(),
            params,
            channel,
        }
    }
}

/// Opaque BiDi browsing context id; equal to a CDP frame id (spec section 3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrowsingContextId(pub String);

impl std::fmt::Display for BrowsingContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<crate::cdp::page::FrameId> for BrowsingContextId {
    fn from(id: crate::cdp::page::FrameId) -> Self {
        BrowsingContextId(id.0)
    }
}

/// Server-generated realm id (spec section 3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RealmId(pub String);

impl std::fmt::Display for RealmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a remote JS object (spec section 3, Glossary "Handle").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RealmType {
    Window,
    DedicatedWorker,
    SharedWorker,
    ServiceWorker,
    Worker,
    PaintWorklet,
    AudioWorklet,
    Worklet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_id_is_invalid_argument_with_no_recovered_id() {
        let (id, err) = parse_envelope(r#"{"method":"x","params":{}}"#).unwrap_err();
        assert_eq!(id, None);
        assert_eq!(err.code, BidiErrorCode::InvalidArgument);
        assert_eq!(err.message, "Expected unsigned integer but got undefined");
    }

    #[test]
    fn negative_id_is_invalid_argument() {
        let (id, err) = parse_envelope(r#"{"id":-1,"method":"x","params":{}}"#).unwrap_err();
        assert_eq!(id, None);
        assert_eq!(err.code, BidiErrorCode::InvalidArgument);
    }

    #[test]
    fn malformed_json_has_no_recovered_id() {
        let (id, err) = parse_envelope(r#"{"method":"x""#).unwrap_err();
        assert_eq!(id, None);
        assert_eq!(err.code, BidiErrorCode::InvalidArgument);
    }

    #[test]
    fn empty_channel_normalizes_to_absent() {
        let cmd = parse_envelope(r#"{"id":1,"method":"x","params":{},"channel":""}"#).unwrap();
        assert_eq!(cmd.channel, None);
    }

    #[test]
    fn valid_envelope_round_trips_id_and_channel() {
        let cmd = parse_envelope(r#"{"id":7,"method":"session.status","params":{},"channel":"c1"}"#).unwrap();
        assert_eq!(cmd.id, 7);
        assert_eq!(cmd.method, "session.status");
        assert_eq!(cmd.channel.as_deref(), Some("c1"));
    }
}
