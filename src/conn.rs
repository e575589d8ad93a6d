//! Component A — `CdpConnection`.
//!
//! Multiplexes CDP commands over the single host-supplied transport and
//! correlates request id to response, exactly as spec section 4.1
//! describes. Grounded in chromiumoxide's `Connection`/`Handler` pair
//! (`handler/mod.rs`, `conn.rs`): a monotonic `CallId` counter, a pending
//! map keyed by that id, and a queue of outbound commands. Unlike the
//! teacher, which polls a websocket `Stream`, our transport is a pair of
//! plain string channels handed in by the host (spec section 6 "Host
//! environment"); command submission is expressed as message-passing
//! (`CommandEnvelope`s sent down an mpsc channel) so many call sites can
//! hold a cheap-to-clone [`CdpSender`] and await their own reply
//! concurrently while a single task owns the correlation table.

use std::borrow::Cow;

use fnv::FnvHashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::cdp::target::SessionId;
use crate::cdp::{CallId, Command, CdpEventMessage, CdpMessage, CdpRequest};
use crate::error::CdpError;

/// A queued command awaiting dispatch, with the sink its result is
/// delivered to once the matching response arrives.
struct CommandEnvelope {
    method: Cow<'static, str>,
    params: serde_json::Value,
    session_id: Option<SessionId>,
    reply: oneshot::Sender<Result<serde_json::Value, CdpError>>,
}

/// Cheap-to-clone handle used by processors and `CdpTarget`s to issue CDP
/// commands without owning the connection's correlation table.
#[derive(Clone)]
pub struct CdpSender {
    tx: mpsc::UnboundedSender<CommandEnvelope>,
}

impl CdpSender {
    /// Issues `cmd` and awaits its typed response, optionally scoped to a
    /// CDP session (spec 4.1: "Messages with a `sessionId` are dispatched to
    /// the matching session").
    pub async fn send_command<C: Command>(
        &self,
        cmd: C,
        session_id: Option<SessionId>,
    ) -> Result<C::Response, CdpError> {
        let method = cmd.identifier();
        let params = serde_json::to_value(cmd)?;
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(CommandEnvelope {
                method,
                params,
                session_id,
                reply,
            })
            .map_err(|_| CdpError::Disconnected)?;
        let value = rx.await.map_err(|_| CdpError::Disconnected)??;
        Ok(serde_json::from_value(value)?)
    }
}

/// The connection actor. Owned exclusively by the mediator's event loop
/// (spec section 5: "single-writer"); callers interact with it only through
/// a [`CdpSender`].
pub struct CdpConnection {
    /// Outbound CDP JSON strings, drained by the host's "send CDP string"
    /// hook.
    outbound: mpsc::UnboundedSender<String>,
    command_rx: mpsc::UnboundedReceiver<CommandEnvelope>,
    next_id: u64,
    pending: FnvHashMap<CallId, oneshot::Sender<Result<serde_json::Value, CdpError>>>,
}

impl CdpConnection {
    pub fn new(outbound: mpsc::UnboundedSender<String>) -> (Self, CdpSender) {
        let (tx, command_rx) = mpsc::unbounded_channel();
        let conn = Self {
            outbound,
            command_rx,
            next_id: 0,
            pending: Default::default(),
        };
        (conn, CdpSender { tx })
    }

    fn next_call_id(&mut self) -> CallId {
        let id = CallId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Waits for the next queued command. Part of the mediator's `select!`
    /// loop (spec section 5).
    pub async fn next_command(&mut self) -> Option<()> {
        let env = self.command_rx.recv().await?;
        self.dispatch(env);
        Some(())
    }

    fn dispatch(&mut self, env: CommandEnvelope) {
        let id = self.next_call_id();
        let req = CdpRequest {
            id,
            method: env.method.clone(),
            params: env.params,
            session_id: env.session_id.map(|s| s.0),
        };
        debug!(method = %env.method, id = %id, "submit cdp command");
        match serde_json::to_string(&req) {
            Ok(text) => {
                self.pending.insert(id, env.reply);
                let _ = self.outbound.send(text);
            }
            Err(err) => {
                let _ = env.reply.send(Err(err.into()));
            }
        }
    }

    /// Feeds one incoming CDP JSON message (a reply or an event) from the
    /// host. Replies resolve their pending sink exactly once; events are
    /// handed back to the caller for further routing (spec 4.1 "Session
    /// fan-out" — the connection itself only correlates, dispatch to a
    /// target/session is the caller's job, mirroring how `Context` owns the
    /// session table rather than the connection).
    pub fn handle_incoming_text(&mut self, text: &str) -> Option<CdpEventMessage> {
        match serde_json::from_str::<CdpMessage>(text) {
            Ok(CdpMessage::Response(resp)) => {
                trace!(id = %resp.id, "cdp response");
                if let Some(sink) = self.pending.remove(&resp.id) {
                    let result = match (resp.result, resp.error) {
                        (Some(value), _) => Ok(value),
                        (None, Some(err)) => Err(CdpError::remote(err.code, err.message)),
                        (None, None) => Err(CdpError::NoResponse),
                    };
                    let _ = sink.send(result);
                }
                None
            }
            Ok(CdpMessage::Event(ev)) => Some(ev),
            Err(err) => {
                warn!(%err, text, "failed to parse incoming cdp message");
                None
            }
        }
    }

    /// Rejects every pending command; called when the transport closes
    /// (spec 4.1: "If the transport closes, all pending sinks reject with
    /// `Disconnected`").
    pub fn disconnect_all(&mut self) {
        for (_, sink) in self.pending.drain() {
            let _ = sink.send(Err(CdpError::Disconnected));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::target::SetDiscoverTargetsParams;

    #[tokio::test]
    async fn correlates_response_to_the_right_sink() {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let (mut conn, sender) = CdpConnection::new(out_tx);

        let handle = tokio::spawn(async move {
            sender
                .send_command(SetDiscoverTargetsParams::new(true), None)
                .await
        });

        conn.next_command().await.unwrap();
        let sent = out_rx.recv().await.unwrap();
        let req: serde_json::Value = serde_json::from_str(&sent).unwrap();
        assert_eq!(req["method"], "Target.setDiscoverTargets");
        let id = req["id"].as_u64().unwrap();

        let reply = serde_json::json!({ "id": id, "result": {} });
        assert!(conn.handle_incoming_text(&reply.to_string()).is_none());

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn disconnect_rejects_pending_commands() {
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let (mut conn, sender) = CdpConnection::new(out_tx);

        let handle = tokio::spawn(async move {
            sender
                .send_command(SetDiscoverTargetsParams::new(true), None)
                .await
        });

        conn.next_command().await.unwrap();
        conn.disconnect_all();

        assert!(matches!(handle.await.unwrap(), Err(CdpError::Disconnected)));
    }
}
