use crate::device::ContextHints;
use crate::paint::Color;
use crate::time::FPS_INTERVAL_MS;
use crate::window::WindowConfig;

/// Compiled-in application settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub context: ContextHints,
    /// Background the frame is cleared to.
    pub clear_color: Color,
    /// `1` presents on vertical sync.
    pub swap_interval: u32,
    /// Averaging window of the frame-rate readout in the title.
    pub fps_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            context: ContextHints::default(),
            clear_color: Color::opaque(0.1, 0.2, 0.1),
            swap_interval: 1,
            fps_interval_ms: FPS_INTERVAL_MS,
        }
    }
}
