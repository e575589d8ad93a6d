//! `Log.*` — unused by any BiDi-visible operation but kept enabled ambiently
//! alongside `Network.enable`, matching the teacher's `page_init_commands`
//! pattern of enabling auxiliary domains on attach.

use std::borrow::Cow;

use serde::Serialize;

use super::{Command, Method};

#[derive(Debug, Clone, Serialize, Default)]
pub struct EnableParams {}
impl Method for EnableParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Log.enable".into()
    }
}
impl Command for EnableParams {
    type Response = serde_json::Value;
}
