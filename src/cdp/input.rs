//! `Input.*` — low-level event dispatch backing the input dispatcher
//! (spec section 4.5).

use std::borrow::Cow;

use serde::Serialize;

use super::{Command, Method};

#[derive(Debug, Clone, Serialize)]
pub struct DispatchMouseEventParams {
    #[serde(rename = "type")]
    pub event_type: String,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<u32>,
    pub modifiers: u32,
    #[serde(rename = "clickCount", skip_serializing_if = "Option::is_none")]
    pub click_count: Option<u32>,
    #[serde(rename = "deltaX", skip_serializing_if = "Option::is_none")]
    pub delta_x: Option<f64>,
    #[serde(rename = "deltaY", skip_serializing_if = "Option::is_none")]
    pub delta_y: Option<f64>,
}
impl Method for DispatchMouseEventParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Input.dispatchMouseEvent".into()
    }
}
impl Command for DispatchMouseEventParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchKeyEventParams {
    #[serde(rename = "type")]
    pub event_type: String,
    pub modifiers: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "windowsVirtualKeyCode", skip_serializing_if = "Option::is_none")]
    pub windows_virtual_key_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}
impl Method for DispatchKeyEventParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Input.dispatchKeyEvent".into()
    }
}
impl Command for DispatchKeyEventParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchTouchEventParams {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(rename = "touchPoints")]
    pub touch_points: Vec<TouchPoint>,
    pub modifiers: u32,
}
impl Method for DispatchTouchEventParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Input.dispatchTouchEvent".into()
    }
}
impl Command for DispatchTouchEventParams {
    type Response = serde_json::Value;
}
