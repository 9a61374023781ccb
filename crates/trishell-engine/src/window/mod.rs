//! Window + event loop.
//!
//! [`WinitBackend`] is the production [`Backend`](crate::platform::Backend):
//! winit owns the window and the event queue, wgpu owns the rendering context.

mod config;
mod runtime;

pub use config::WindowConfig;
pub use runtime::WinitBackend;
