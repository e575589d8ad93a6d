/// Configuration supplied by the host embedding this mediator.
///
/// Grounded in chromiumoxide's `BrowserConfig`: a plain struct with a
/// `Default` impl, no CLI parsing — the host constructs this programmatically
/// as part of the startup handshake (spec section 6, "Host environment").
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// The target id of the mapper's own hosting tab, supplied by the
    /// startup handshake. Filtered out of every public response and never
    /// generates client-visible events (spec invariant 6).
    pub self_target_id: String,
    /// Bound on the channel buffers between the host hooks and the mediator
    /// event loop.
    pub channel_buffer_size: usize,
}

impl MapperConfig {
    pub fn new(self_target_id: impl Into<String>) -> Self {
        Self {
            self_target_id: self_target_id.into(),
            ..Default::default()
        }
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            self_target_id: String::new(),
            channel_buffer_size: 256,
        }
    }
}
