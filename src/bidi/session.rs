//! `session.*` — subscription management plus the minimal session
//! negotiation surface this mediator supports (spec section 4.6,
//! SPEC_FULL 4.6: session negotiation itself is out of scope since the
//! mediator always mediates one already-established session).

use serde::Deserialize;

use super::BrowsingContextId;

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeParams {
    pub events: Vec<String>,
    #[serde(default)]
    pub contexts: Option<Vec<BrowsingContextId>>,
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsubscribeParams {
    pub events: Vec<String>,
    #[serde(default)]
    pub contexts: Option<Vec<BrowsingContextId>>,
    #[serde(default)]
    pub channel: Option<String>,
}
