//! Component F — `EventManager` (spec section 4.6).
//!
//! Buffering/flush nuance: the spec says a fresh `subscribe` "flushes"
//! buffered events "then marks [them] consumed", while also requiring a late
//! subscriber to still see "the creation history of still-live contexts".
//! We reconcile both by keying consumption on the *subscription entry*
//! rather than the buffered event: a `subscribe` call only flushes buffer
//! entries to subscriptions it is newly adding (`HashSet::insert` returning
//! `true`), so buffered events are never cleared and a second, independent
//! subscriber still sees the same history.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::bidi::{BrowsingContextId, Channel, OutgoingMessage};

/// Events buffered even with no matching subscription, so a late
/// subscriber sees the creation history of still-live contexts (spec 4.6).
const ALWAYS_BUFFER: &[&str] = &[
    "browsingContext.contextCreated",
    "browsingContext.domContentLoaded",
    "browsingContext.load",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Subscription {
    event: String,
    context: Option<BrowsingContextId>,
    channel: Channel,
}

#[derive(Debug, Clone)]
struct BufferedEvent {
    params: Value,
    channel: Channel,
}

#[derive(Default)]
pub struct EventManager {
    subscriptions: HashSet<Subscription>,
    buffers: HashMap<(BrowsingContextId, String), Vec<BufferedEvent>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds subscription entries for the cartesian product of `events` and
    /// `contexts` (or the global `None` context when `contexts` is absent),
    /// returning the buffered events immediately flushed to the
    /// newly-added entries, in buffering order.
    pub fn subscribe(
        &mut self,
        events: Vec<String>,
        contexts: Option<Vec<BrowsingContextId>>,
        channel: Channel,
    ) -> Vec<OutgoingMessage> {
        let targets: Vec<Option<BrowsingContextId>> = match contexts {
            Some(cs) => cs.into_iter().map(Some).collect(),
            None => vec![None],
        };

        let mut flushed = Vec::new();
        for event in &events {
            for target in &targets {
                let sub = Subscription {
                    event: event.clone(),
                    context: target.clone(),
                    channel: channel.clone(),
                };
                if self.subscriptions.insert(sub) {
                    flushed.extend(self.buffered_matches(event, target.as_ref(), &channel));
                }
            }
        }
        flushed
    }

    fn buffered_matches(
        &self,
        event: &str,
        context: Option<&BrowsingContextId>,
        channel: &Channel,
    ) -> Vec<OutgoingMessage> {
        let mut out = Vec::new();
        match context {
            Some(ctx) => {
                if let Some(entries) = self.buffers.get(&(ctx.clone(), event.to_string())) {
                    for e in entries {
                        out.push(OutgoingMessage::event(event.to_string(), e.params.clone(), channel.clone()));
                    }
                }
            }
            None => {
                for ((_, ev), entries) in &self.buffers {
                    if ev == event {
                        for e in entries {
                            out.push(OutgoingMessage::event(event.to_string(), e.params.clone(), channel.clone()));
                        }
                    }
                }
            }
        }
        out
    }

    pub fn unsubscribe(&mut self, events: Vec<String>, contexts: Option<Vec<BrowsingContextId>>, channel: Channel) {
        let targets: Vec<Option<BrowsingContextId>> = match contexts {
            Some(cs) => cs.into_iter().map(Some).collect(),
            None => vec![None],
        };
        for event in &events {
            for target in &targets {
                self.subscriptions.remove(&Subscription {
                    event: event.clone(),
                    context: target.clone(),
                    channel: channel.clone(),
                });
            }
        }
    }

    /// Emits `event` for `context` to every matching subscription (global or
    /// context-scoped); if nothing matches and the event is in
    /// [`ALWAYS_BUFFER`], buffers it instead (spec 4.6).
    pub fn register_event(
        &mut self,
        event: &str,
        context: &BrowsingContextId,
        params: Value,
    ) -> Vec<OutgoingMessage> {
        let mut out = Vec::new();
        for sub in &self.subscriptions {
            if sub.event != event {
                continue;
            }
            let matches = match &sub.context {
                None => true,
                Some(c) => c == context,
            };
            if matches {
                out.push(OutgoingMessage::event(event.to_string(), params.clone(), sub.channel.clone()));
            }
        }

        if out.is_empty() && ALWAYS_BUFFER.contains(&event) {
            self.buffers
                .entry((context.clone(), event.to_string()))
                .or_default()
                .push(BufferedEvent { params, channel: None });
        }
        out
    }

    /// Drops the buffer for a deleted context (spec 4.6 "discarded on
    /// context deletion").
    pub fn discard_buffer(&mut self, context: &BrowsingContextId) {
        self.buffers.retain(|(c, _), _| c != context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribing_twice_does_not_double_flush() {
        let mut mgr = EventManager::new();
        let ctx = BrowsingContextId("C1".into());
        assert!(mgr
            .register_event("browsingContext.contextCreated", &ctx, Value::Null)
            .is_empty());

        let first = mgr.subscribe(vec!["browsingContext.contextCreated".into()], None, None);
        assert_eq!(first.len(), 1);

        let second = mgr.subscribe(vec!["browsingContext.contextCreated".into()], None, None);
        assert!(second.is_empty());
    }

    #[test]
    fn late_independent_subscriber_still_sees_history() {
        let mut mgr = EventManager::new();
        let ctx = BrowsingContextId("C1".into());
        mgr.register_event("browsingContext.contextCreated", &ctx, Value::Null);
        mgr.subscribe(
            vec!["browsingContext.contextCreated".into()],
            None,
            Some("a".into()),
        );
        let late = mgr.subscribe(
            vec!["browsingContext.contextCreated".into()],
            None,
            Some("b".into()),
        );
        assert_eq!(late.len(), 1);
    }

    #[test]
    fn registered_event_with_live_subscription_is_not_buffered() {
        let mut mgr = EventManager::new();
        let ctx = BrowsingContextId("C1".into());
        mgr.subscribe(vec!["browsingContext.load".into()], None, None);
        let out = mgr.register_event("browsingContext.load", &ctx, Value::Null);
        assert_eq!(out.len(), 1);
        assert!(mgr.buffers.is_empty());
    }

    #[test]
    fn discard_buffer_removes_context_history() {
        let mut mgr = EventManager::new();
        let ctx = BrowsingContextId("C1".into());
        mgr.register_event("browsingContext.load", &ctx, Value::Null);
        mgr.discard_buffer(&ctx);
        let late = mgr.subscribe(vec!["browsingContext.load".into()], None, None);
        assert!(late.is_empty());
    }
}
