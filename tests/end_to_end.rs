//! End-to-end scenarios driving a [`Mapper`] through a fake CDP peer and a
//! fake BiDi client, exercising the six cross-component flows: navigation
//! readiness, context creation/enumeration, malformed envelopes, buffered
//! event delivery, script evaluation with root ownership, and detach-aware
//! `browsingContext.close`.

use std::future::Future;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use bidi_mapper::{BidiInboundHandle, CdpInboundHandle, Mapper, MapperConfig};

struct Harness {
    cdp_out: mpsc::UnboundedReceiver<String>,
    cdp_in: CdpInboundHandle,
    bidi_out: mpsc::UnboundedReceiver<String>,
    bidi_in: BidiInboundHandle,
}

fn new_harness() -> (Mapper, Harness) {
    let (cdp_out_tx, cdp_out) = mpsc::unbounded_channel();
    let (bidi_out_tx, bidi_out) = mpsc::unbounded_channel();
    let config = MapperConfig::new("mapper-own-tab");
    let (mapper, cdp_in, bidi_in) = Mapper::new(config, cdp_out_tx, bidi_out_tx);
    (mapper, Harness { cdp_out, cdp_in, bidi_out, bidi_in })
}

/// Runs `body` with a live [`Mapper`] pumping in the background on the same
/// `LocalSet` (`CommandProcessor`/the attach-sequence task spawn `!Send`
/// futures, so this must run inside one, per `Mapper::run`'s own doc comment).
async fn with_harness<F, Fut>(body: F)
where
    F: FnOnce(Harness) -> Fut,
    Fut: Future<Output = ()>,
{
    let (mapper, harness) = new_harness();
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async move {
            tokio::task::spawn_local(mapper.run());
            body(harness).await;
        })
        .await;
}

async fn next_cdp(h: &mut Harness) -> Value {
    let text = h.cdp_out.recv().await.expect("mapper stopped issuing cdp commands");
    serde_json::from_str(&text).expect("cdp command is valid json")
}

fn ack(h: &Harness, id: &Value, result: Value) {
    h.cdp_in.feed(json!({ "id": id, "result": result }).to_string());
}

fn cdp_event(h: &Harness, method: &str, params: Value) {
    h.cdp_in.feed(json!({ "method": method, "params": params }).to_string());
}

fn bidi_command(h: &Harness, id: u64, method: &str, params: Value) {
    h.bidi_in
        .feed(json!({ "id": id, "method": method, "params": params }).to_string());
}

async fn next_bidi(h: &mut Harness) -> Value {
    let text = h.bidi_out.recv().await.expect("mapper stopped issuing bidi messages");
    serde_json::from_str(&text).expect("bidi message is valid json")
}

/// Acks the five concurrent enable commands plus `runIfWaitingForDebugger`
/// issued by `CdpTarget::initialize`, then plays through the bootstrap
/// `about:blank` navigation so `unblocked`/`loaded` fire for `target_id`.
async fn complete_attach_sequence(h: &mut Harness, target_id: &str) {
    for _ in 0..6 {
        let cmd = next_cdp(h).await;
        ack(h, &cmd["id"], json!({}));
    }
    cdp_event(
        h,
        "Page.frameNavigated",
        json!({ "frame": { "id": target_id, "loaderId": "L0", "url": "about:blank" } }),
    );
    cdp_event(
        h,
        "Page.lifecycleEvent",
        json!({ "frameId": target_id, "loaderId": "L0", "name": "DOMContentLoaded" }),
    );
    cdp_event(
        h,
        "Page.lifecycleEvent",
        json!({ "frameId": target_id, "loaderId": "L0", "name": "load" }),
    );
}

/// Simulates the browser auto-attaching to a pre-existing top-level target
/// and completes its attach sequence, leaving `target_id` unblocked and
/// ready to navigate/evaluate against.
async fn bootstrap_attached_context(h: &mut Harness, target_id: &str, session_id: &str) {
    cdp_event(
        h,
        "Target.attachedToTarget",
        json!({
            "sessionId": session_id,
            "targetInfo": {
                "targetId": target_id,
                "type": "page",
                "title": "",
                "url": "about:blank",
                "attached": true,
            },
            "waitingForDebugger": false,
        }),
    );
    complete_attach_sequence(h, target_id).await;
}

#[tokio::test(flavor = "current_thread")]
async fn navigate_awaits_dom_content_loaded_and_reports_the_loader_id() {
    with_harness(|mut h| async move {
        bootstrap_attached_context(&mut h, "T1", "S1").await;

        bidi_command(
            &h,
            1,
            "browsingContext.navigate",
            json!({ "context": "T1", "url": "https://example.com/" }),
        );

        let navigate = next_cdp(&mut h).await;
        assert_eq!(navigate["method"], "Page.navigate");
        assert_eq!(navigate["params"]["frameId"], "T1");
        assert_eq!(navigate["params"]["url"], "https://example.com/");
        ack(&h, &navigate["id"], json!({ "frameId": "T1", "loaderId": "L1" }));

        cdp_event(
            &h,
            "Page.frameNavigated",
            json!({ "frame": { "id": "T1", "loaderId": "L1", "url": "https://example.com/" } }),
        );
        cdp_event(
            &h,
            "Page.lifecycleEvent",
            json!({ "frameId": "T1", "loaderId": "L1", "name": "DOMContentLoaded" }),
        );

        let resp = next_bidi(&mut h).await;
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"]["navigation"], "L1");
        assert_eq!(resp["result"]["url"], "https://example.com/");
    })
    .await;
}

#[tokio::test(flavor = "current_thread")]
async fn create_then_get_tree_lists_the_new_context() {
    with_harness(|mut h| async move {
        bidi_command(&h, 1, "browsingContext.create", json!({}));

        let create_target = next_cdp(&mut h).await;
        assert_eq!(create_target["method"], "Target.createTarget");
        assert_eq!(create_target["params"]["url"], "about:blank");
        ack(&h, &create_target["id"], json!({ "targetId": "T2" }));

        let created = next_bidi(&mut h).await;
        assert_eq!(created["id"], 1);
        let new_context = created["result"]["context"].as_str().unwrap().to_string();

        bidi_command(&h, 2, "browsingContext.getTree", json!({}));
        let tree = next_bidi(&mut h).await;
        assert_eq!(tree["id"], 2);
        let contexts = tree["result"]["contexts"].as_array().unwrap();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0]["context"], new_context);
        assert!(contexts[0]["parent"].is_null());
    })
    .await;
}

#[tokio::test(flavor = "current_thread")]
async fn malformed_envelope_yields_an_error_with_no_recovered_id() {
    with_harness(|mut h| async move {
        h.bidi_in.feed("not json at all".to_string());

        let resp = next_bidi(&mut h).await;
        assert!(resp["id"].is_null());
        assert_eq!(resp["error"], "invalid argument");
    })
    .await;
}

#[tokio::test(flavor = "current_thread")]
async fn subscribing_before_creation_delivers_the_context_created_event() {
    with_harness(|mut h| async move {
        bidi_command(
            &h,
            1,
            "session.subscribe",
            json!({ "events": ["browsingContext.contextCreated"] }),
        );
        let subscribed = next_bidi(&mut h).await;
        assert_eq!(subscribed["id"], 1);

        bidi_command(&h, 2, "browsingContext.create", json!({}));
        let create_target = next_cdp(&mut h).await;
        ack(&h, &create_target["id"], json!({ "targetId": "T3" }));

        // The flushed event is queued ahead of the command response, since
        // `create()` emits it before returning.
        let event = next_bidi(&mut h).await;
        assert_eq!(event["method"], "browsingContext.contextCreated");
        assert_eq!(event["params"]["context"], "T3");

        let created = next_bidi(&mut h).await;
        assert_eq!(created["id"], 2);
        assert_eq!(created["result"]["context"], "T3");
    })
    .await;
}

#[tokio::test(flavor = "current_thread")]
async fn evaluate_with_root_ownership_keeps_the_handle_alive() {
    with_harness(|mut h| async move {
        bootstrap_attached_context(&mut h, "T1", "S1").await;
        cdp_event(
            &h,
            "Runtime.executionContextCreated",
            json!({
                "context": {
                    "id": 1,
                    "origin": "https://example.com",
                    "name": "",
                    "auxData": { "frameId": "T1", "isDefault": true },
                }
            }),
        );

        bidi_command(
            &h,
            1,
            "script.evaluate",
            json!({
                "expression": "1 + 1",
                "target": { "context": "T1" },
                "awaitPromise": false,
                "resultOwnership": "root",
            }),
        );

        let evaluate = next_cdp(&mut h).await;
        assert_eq!(evaluate["method"], "Runtime.evaluate");
        assert_eq!(evaluate["params"]["contextId"], 1);
        ack(
            &h,
            &evaluate["id"],
            json!({
                "result": {
                    "type": "number",
                    "objectId": "obj-1",
                    "deepSerializedValue": { "type": "number", "value": 2 },
                }
            }),
        );

        // Root ownership keeps the handle: no `Runtime.releaseObject` call.
        let resp = next_bidi(&mut h).await;
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"]["type"], "number");
        assert_eq!(resp["result"]["handle"], "obj-1");
    })
    .await;
}

#[tokio::test(flavor = "current_thread")]
async fn close_waits_for_the_detach_event_before_resolving() {
    with_harness(|mut h| async move {
        bootstrap_attached_context(&mut h, "T1", "S1").await;

        bidi_command(&h, 1, "browsingContext.close", json!({ "context": "T1" }));

        let close_target = next_cdp(&mut h).await;
        assert_eq!(close_target["method"], "Target.closeTarget");
        assert_eq!(close_target["params"]["targetId"], "T1");
        ack(&h, &close_target["id"], json!({ "success": true }));

        // `close` must not resolve on the command ack alone; only the
        // subsequent detach event unblocks it.
        cdp_event(
            &h,
            "Target.detachedFromTarget",
            json!({ "sessionId": "S1", "targetId": "T1" }),
        );

        let resp = next_bidi(&mut h).await;
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"], json!({}));
    })
    .await;
}
