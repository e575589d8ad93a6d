//! Hand-written shapes for the slice of the Chrome DevTools Protocol this
//! mediator speaks. The full CDP schema is out of scope (spec section 1
//! treats it as an external, typed-parser collaborator); chromiumoxide
//! generates its protocol types from `.pdl` files via a build-time code
//! generator, which we do not reproduce. Instead we hand-author just the
//! domains the mediator drives, following the same `Method`/`Command`/`Event`
//! trait shapes as `chromiumoxide_types`.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod input;
pub mod log;
pub mod network;
pub mod page;
pub mod runtime;
pub mod target;

/// A CDP method identifier, e.g. `Target.attachedToTarget`.
pub trait Method {
    fn identifier(&self) -> Cow<'static, str>;
}

/// A CDP command: request params paired with the expected response type.
pub trait Command: Serialize + Method {
    type Response: serde::de::DeserializeOwned + fmt::Debug;
}

/// Monotonically increasing id correlating a request to its response,
/// scoped to one `CdpConnection` (spec section 4.1 "Correlation").
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub u64);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An outbound CDP request, as written to the transport.
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    pub id: CallId,
    pub method: Cow<'static, str>,
    pub params: serde_json::Value,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// The CDP wire-level error object on a failed response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CdpRemoteError {
    pub code: i64,
    pub message: String,
}

impl fmt::Display for CdpRemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A reply to a previously issued [`CdpRequest`].
#[derive(Debug, Clone, Deserialize)]
pub struct CdpResponse {
    pub id: CallId,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<CdpRemoteError>,
}

/// An unsolicited CDP event.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpEventMessage {
    pub method: Cow<'static, str>,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
    #[serde(default = "serde_json::Value::default")]
    pub params: serde_json::Value,
}

/// Either half of what can arrive on the CDP transport. Replies carry an
/// `id`; events never do, so an untagged enum dispatches on shape exactly as
/// chromiumoxide's `Message<T>` does.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CdpMessage {
    Response(CdpResponse),
    Event(CdpEventMessage),
}

pub(crate) fn to_value<T: Serialize>(params: T) -> serde_json::Value {
    serde_json::to_value(params).expect("cdp params always serialize")
}
