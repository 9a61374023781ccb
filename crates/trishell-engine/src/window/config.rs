use winit::dpi::LogicalSize;
use winit::window::{Window, WindowAttributes};

/// Window creation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    /// Title shown until the first frame-rate readout.
    pub title: String,
    /// Client area width in logical pixels.
    pub width: u32,
    /// Client area height in logical pixels.
    pub height: u32,
    pub resizable: bool,
}

impl WindowConfig {
    /// Attributes for a window that stays hidden until explicitly shown.
    pub(crate) fn attributes(&self) -> WindowAttributes {
        Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(self.width as f64, self.height as f64))
            .with_resizable(self.resizable)
            .with_visible(false)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Trishell".to_string(),
            width: 800,
            height: 600,
            resizable: true,
        }
    }
}
