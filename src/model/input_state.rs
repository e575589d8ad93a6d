//! The input dispatcher — per top-level context source state and the tick
//! decomposition of `input.performActions` (spec section 4.5).

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use futures::future::join_all;

use crate::bidi::input::{Action, PointerType, SourceActions, SourceId};
use crate::cdp::input::{
    DispatchKeyEventParams, DispatchMouseEventParams, DispatchTouchEventParams, TouchPoint,
};
use crate::cdp::target::SessionId;
use crate::conn::CdpSender;
use crate::error::BidiError;

const MODIFIER_ALT: u32 = 1;
const MODIFIER_CONTROL: u32 = 2;
const MODIFIER_META: u32 = 4;
const MODIFIER_SHIFT: u32 = 8;

fn modifier_bit(key: &str) -> Option<u32> {
    match key {
        "Alt" => Some(MODIFIER_ALT),
        "Control" => Some(MODIFIER_CONTROL),
        "Meta" => Some(MODIFIER_META),
        "Shift" => Some(MODIFIER_SHIFT),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSubtype {
    None,
    Key,
    Pointer(PointerType),
    Wheel,
}

#[derive(Debug, Clone, Default)]
struct PointerSourceState {
    pressed_buttons: Vec<u8>,
    x: f64,
    y: f64,
}

/// An inverse action queued for `releaseActions`, prepended as it is
/// accumulated so the cancel list is naturally newest-first (spec 4.5
/// "prepend the inverse action to `cancelList`").
enum CancelAction {
    KeyUp { id: SourceId, value: String },
    PointerUp { id: SourceId, button: u8 },
}

pub struct InputState {
    subtypes: HashMap<SourceId, SourceSubtype>,
    pointer_state: HashMap<SourceId, PointerSourceState>,
    modifiers: u32,
    cancel_list: VecDeque<CancelAction>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            subtypes: HashMap::new(),
            pointer_state: HashMap::new(),
            modifiers: 0,
            cancel_list: VecDeque::new(),
        }
    }

    fn check_subtype(&mut self, id: &SourceId, subtype: SourceSubtype) -> Result<(), BidiError> {
        match self.subtypes.get(id) {
            Some(existing) if *existing != subtype => Err(BidiError::invalid_argument(format!(
                "source {} reused with a different subtype",
                id.0
            ))),
            Some(_) => Ok(()),
            None => {
                self.subtypes.insert(id.clone(), subtype);
                Ok(())
            }
        }
    }

    /// Runs `input.performActions`: decomposes `sources` into ticks (one
    /// action per source per tick, for sources whose sequence still has an
    /// action left) and dispatches each tick in order.
    pub async fn perform_actions(
        &mut self,
        cdp: &CdpSender,
        session: &SessionId,
        sources: Vec<SourceActions>,
    ) -> Result<(), BidiError> {
        for source in &sources {
            let subtype = match source {
                SourceActions::None { .. } => SourceSubtype::None,
                SourceActions::Key { .. } => SourceSubtype::Key,
                SourceActions::Wheel { .. } => SourceSubtype::Wheel,
                SourceActions::Pointer { parameters, .. } => SourceSubtype::Pointer(
                    parameters.as_ref().map(|p| p.pointer_type).unwrap_or(PointerType::Mouse),
                ),
            };
            self.check_subtype(source.id(), subtype)?;
        }

        let tick_count = sources.iter().map(|s| s.actions().len()).max().unwrap_or(0);

        for tick in 0..tick_count {
            let mut tick_actions = Vec::new();
            for source in &sources {
                if let Some(action) = source.actions().get(tick) {
                    tick_actions.push((source.id().clone(), action.clone()));
                }
            }
            self.dispatch_tick(cdp, session, tick_actions).await?;
        }
        Ok(())
    }

    async fn dispatch_tick(
        &mut self,
        cdp: &CdpSender,
        session: &SessionId,
        tick_actions: Vec<(SourceId, Action)>,
    ) -> Result<(), BidiError> {
        let max_pause = tick_actions
            .iter()
            .filter_map(|(_, a)| a.pause_duration())
            .max()
            .unwrap_or(0);

        let started = Instant::now();
        let futures = tick_actions
            .iter()
            .filter(|(_, a)| !a.is_pause())
            .map(|(id, action)| self.dispatch_one(cdp, session, id.clone(), action.clone()));
        let results = join_all(futures).await;
        for r in results {
            r.map_err(|e| BidiError::unknown_error(e.to_string()))?;
        }

        let elapsed = started.elapsed();
        let target = Duration::from_millis(max_pause);
        if elapsed < target {
            tokio::time::sleep(target - elapsed).await;
        }

        for (id, action) in &tick_actions {
            self.apply_state_update(id, action);
        }
        Ok(())
    }

    async fn dispatch_one(
        &self,
        cdp: &CdpSender,
        session: &SessionId,
        id: SourceId,
        action: Action,
    ) -> Result<(), crate::error::CdpError> {
        match action {
            Action::KeyDown { value } => {
                cdp.send_command(
                    DispatchKeyEventParams {
                        event_type: "keyDown".into(),
                        modifiers: self.modifiers,
                        key: Some(value.clone()),
                        code: None,
                        windows_virtual_key_code: None,
                        text: Some(value),
                    },
                    Some(session.clone()),
                )
                .await
                .map(|_| ())
            }
            Action::KeyUp { value } => {
                cdp.send_command(
                    DispatchKeyEventParams {
                        event_type: "keyUp".into(),
                        modifiers: self.modifiers,
                        key: Some(value),
                        code: None,
                        windows_virtual_key_code: None,
                        text: None,
                    },
                    Some(session.clone()),
                )
                .await
                .map(|_| ())
            }
            Action::PointerDown { button } => {
                let (x, y) = self.pointer_state.get(&id).map(|s| (s.x, s.y)).unwrap_or((0.0, 0.0));
                cdp.send_command(
                    DispatchMouseEventParams {
                        event_type: "mousePressed".into(),
                        x,
                        y,
                        button: Some(button_name(button)),
                        buttons: Some(1 << button),
                        modifiers: self.modifiers,
                        click_count: Some(1),
                        delta_x: None,
                        delta_y: None,
                    },
                    Some(session.clone()),
                )
                .await
                .map(|_| ())
            }
            Action::PointerUp { button } => {
                let (x, y) = self.pointer_state.get(&id).map(|s| (s.x, s.y)).unwrap_or((0.0, 0.0));
                cdp.send_command(
                    DispatchMouseEventParams {
                        event_type: "mouseReleased".into(),
                        x,
                        y,
                        button: Some(button_name(button)),
                        buttons: Some(0),
                        modifiers: self.modifiers,
                        click_count: Some(1),
                        delta_x: None,
                        delta_y: None,
                    },
                    Some(session.clone()),
                )
                .await
                .map(|_| ())
            }
            Action::PointerMove { x, y, .. } => {
                match self.subtypes.get(&id) {
                    Some(SourceSubtype::Pointer(PointerType::Touch)) => cdp
                        .send_command(
                            DispatchTouchEventParams {
                                event_type: "touchMove".into(),
                                touch_points: vec![TouchPoint { x, y }],
                                modifiers: self.modifiers,
                            },
                            Some(session.clone()),
                        )
                        .await
                        .map(|_| ()),
                    _ => cdp
                        .send_command(
                            DispatchMouseEventParams {
                                event_type: "mouseMoved".into(),
                                x,
                                y,
                                button: None,
                                buttons: None,
                                modifiers: self.modifiers,
                                click_count: None,
                                delta_x: None,
                                delta_y: None,
                            },
                            Some(session.clone()),
                        )
                        .await
                        .map(|_| ()),
                }
            }
            Action::PointerCancel => Ok(()),
            Action::Scroll { x, y, delta_x, delta_y, .. } => cdp
                .send_command(
                    DispatchMouseEventParams {
                        event_type: "mouseWheel".into(),
                        x,
                        y,
                        button: None,
                        buttons: None,
                        modifiers: self.modifiers,
                        click_count: None,
                        delta_x: Some(delta_x),
                        delta_y: Some(delta_y),
                    },
                    Some(session.clone()),
                )
                .await
                .map(|_| ()),
            Action::Pause { .. } => Ok(()),
        }
    }

    fn apply_state_update(&mut self, id: &SourceId, action: &Action) {
        match action {
            Action::KeyDown { value } => {
                if let Some(bit) = modifier_bit(value) {
                    self.modifiers |= bit;
                }
                self.cancel_list.push_front(CancelAction::KeyUp {
                    id: id.clone(),
                    value: value.clone(),
                });
            }
            Action::KeyUp { value } => {
                if let Some(bit) = modifier_bit(value) {
                    self.modifiers &= !bit;
                }
            }
            Action::PointerDown { button } => {
                let state = self.pointer_state.entry(id.clone()).or_default();
                state.pressed_buttons.push(*button);
                self.cancel_list.push_front(CancelAction::PointerUp {
                    id: id.clone(),
                    button: *button,
                });
            }
            Action::PointerUp { button } => {
                if let Some(state) = self.pointer_state.get_mut(id) {
                    state.pressed_buttons.retain(|b| b != button);
                }
            }
            Action::PointerMove { x, y, .. } => {
                let state = self.pointer_state.entry(id.clone()).or_default();
                state.x = *x;
                state.y = *y;
            }
            _ => {}
        }
    }

    /// Dispatches the accumulated cancel list, newest-first, as a single
    /// tick sequence, then the caller drops this `InputState`.
    pub async fn release_actions(&mut self, cdp: &CdpSender, session: &SessionId) -> Result<(), BidiError> {
        while let Some(cancel) = self.cancel_list.pop_front() {
            let result = match cancel {
                CancelAction::KeyUp { value, .. } => {
                    cdp.send_command(
                        DispatchKeyEventParams {
                            event_type: "keyUp".into(),
                            modifiers: self.modifiers,
                            key: Some(value),
                            code: None,
                            windows_virtual_key_code: None,
                            text: None,
                        },
                        Some(session.clone()),
                    )
                    .await
                }
                CancelAction::PointerUp { id, button } => {
                    let (x, y) = self.pointer_state.get(&id).map(|s| (s.x, s.y)).unwrap_or((0.0, 0.0));
                    cdp.send_command(
                        DispatchMouseEventParams {
                            event_type: "mouseReleased".into(),
                            x,
                            y,
                            button: Some(button_name(button)),
                            buttons: Some(0),
                            modifiers: self.modifiers,
                            click_count: Some(1),
                            delta_x: None,
                            delta_y: None,
                        },
                        Some(session.clone()),
                    )
                    .await
                }
            };
            result.map_err(|e| BidiError::unknown_error(e.to_string()))?;
        }
        Ok(())
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

fn button_name(button: u8) -> String {
    match button {
        0 => "left",
        1 => "middle",
        2 => "right",
        _ => "none",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reusing_source_id_with_different_subtype_is_rejected() {
        let mut state = InputState::new();
        let id = SourceId("s1".into());
        state.check_subtype(&id, SourceSubtype::Key).unwrap();
        let err = state.check_subtype(&id, SourceSubtype::Wheel).unwrap_err();
        assert_eq!(err.code, crate::error::BidiErrorCode::InvalidArgument);
    }
}
