//! `Network.*` — only the `enable` call, issued once per target during
//! `CdpTarget` initialization (spec section 4.3 step 2, which names
//! `Runtime`/`Page`/`Network` as the domains enabled on attach).

use std::borrow::Cow;

use serde::Serialize;

use super::{Command, Method};

#[derive(Debug, Clone, Serialize, Default)]
pub struct EnableParams {}
impl Method for EnableParams {
    fn identifier(&self) -> Cow<'static, str> {
        "Network.enable".into()
    }
}
impl Command for EnableParams {
    type Response = serde_json::Value;
}
