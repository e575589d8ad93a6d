//! `CdpTarget` — one per attached browser target (spec section 3, 4.3).

use crate::cdp::page::ScriptIdentifier;
use crate::cdp::target::{SessionId, TargetId};
use crate::conn::CdpSender;
use crate::error::CdpError;
use crate::model::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Initializing,
    Ready,
    Failed,
}

pub struct CdpTarget {
    pub target_id: TargetId,
    pub session_id: SessionId,
    pub state: TargetState,
    /// CDP preload-script ids installed on this target, alongside the BiDi
    /// record that requested them (spec section 3 "BidiPreloadScript").
    pub installed_preload_scripts: Vec<(String, ScriptIdentifier)>,
    /// Gates operations until `Runtime.enable` et al. have completed (spec
    /// section 3 "a 'ready' signal gating operations until the runtime is
    /// enabled").
    pub ready: Signal,
}

impl CdpTarget {
    pub fn new(target_id: TargetId, session_id: SessionId) -> Self {
        Self {
            target_id,
            session_id,
            state: TargetState::Initializing,
            installed_preload_scripts: Vec::new(),
            ready: Signal::new(),
        }
    }

    /// Runs the mandatory attach sequence in the exact order spec 4.3
    /// prescribes:
    ///
    /// 1. Subscribe to the CDP events driving context/realm bookkeeping —
    ///    a no-op call here since the mediator's single connection already
    ///    observes every event and routes by session id; "subscribing" is
    ///    just registering interest, done once at startup.
    /// 2. `Page.enable`, `Runtime.enable`, `Page.setLifecycleEventsEnabled`
    ///    (plus the ambient `Network.enable`/`Log.enable` from the
    ///    "Lifecycle" bullet in spec section 3), issued concurrently.
    /// 3. Install every applicable preload script.
    /// 4. `Runtime.runIfWaitingForDebugger`, releasing the
    ///    `waitForDebuggerOnStart` pause.
    pub async fn initialize(
        &mut self,
        cdp: &CdpSender,
        preload_sources: Vec<(String, String)>,
    ) -> Result<(), CdpError> {
        use crate::cdp::{network, page, runtime, log};

        let session = Some(self.session_id.clone());
        let page_enable = cdp.send_command(page::EnableParams::default(), session.clone());
        let runtime_enable = cdp.send_command(runtime::EnableParams::default(), session.clone());
        let lifecycle = cdp.send_command(
            page::SetLifecycleEventsEnabledParams { enabled: true },
            session.clone(),
        );
        let network_enable = cdp.send_command(network::EnableParams::default(), session.clone());
        let log_enable = cdp.send_command(log::EnableParams::default(), session.clone());

        let (_, _, _, _, _) = tokio::try_join!(
            page_enable,
            runtime_enable,
            lifecycle,
            network_enable,
            log_enable
        )?;

        for (record_id, source) in preload_sources {
            let result = cdp
                .send_command(
                    page::AddScriptToEvaluateOnNewDocumentParams { source },
                    session.clone(),
                )
                .await?;
            self.installed_preload_scripts.push((record_id, result.identifier));
        }

        cdp.send_command(runtime::RunIfWaitingForDebuggerParams::default(), session)
            .await?;

        self.state = TargetState::Ready;
        self.ready.fire();
        Ok(())
    }

    pub fn mark_failed(&mut self) {
        self.state = TargetState::Failed;
    }
}
