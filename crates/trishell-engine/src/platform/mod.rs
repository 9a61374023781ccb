//! Platform seam.
//!
//! The application core never touches winit or wgpu directly. Everything it
//! needs from the windowing layer and the graphics driver goes through the
//! [`Platform`] and [`Graphics`] traits, which mirror the classic
//! "window + context + bare GPU object ids" model:
//! - identifiers are opaque non-zero integers
//! - binding state (current program, current vertex array) lives in the backend
//! - every fallible call reports a [`PlatformError`] carrying the platform text

mod error;
mod handle;
mod types;

pub use error::PlatformError;
pub use handle::{ContextId, GpuId, IdAllocator, Owned, WindowId};
pub use types::{AttributeFormat, Event, ShaderDesc, ShaderStage, VertexAttribute};

use crate::coords::Viewport;
use crate::device::ContextHints;
use crate::paint::Color;
use crate::window::WindowConfig;

/// Window, context, event and timing services.
pub trait Platform {
    /// Brings up the video subsystem. Must precede every other call.
    fn init_video(&mut self) -> Result<(), PlatformError>;

    /// Tears the video subsystem down. No-op when it is not initialized.
    fn quit_video(&mut self);

    /// Records the context parameters used by the next `create_context`.
    ///
    /// This is a request: the platform may grant something different and the
    /// caller does not validate the result.
    fn request_context(&mut self, hints: &ContextHints);

    fn create_window(&mut self, config: &WindowConfig) -> Result<WindowId, PlatformError>;

    fn destroy_window(&mut self, window: WindowId);

    /// Creates a rendering context bound to `window` and makes it current.
    fn create_context(&mut self, window: WindowId) -> Result<ContextId, PlatformError>;

    fn destroy_context(&mut self, context: ContextId);

    /// `1` waits for vertical sync on present, `0` presents immediately.
    fn set_swap_interval(&mut self, interval: u32);

    fn show_window(&mut self, window: WindowId);

    /// Drawable size in physical pixels.
    fn window_pixel_size(&self, window: WindowId) -> (u32, u32);

    fn set_window_title(&mut self, window: WindowId, title: &str);

    /// Returns the next pending event without blocking.
    fn poll_event(&mut self) -> Option<Event>;

    /// Milliseconds since the video subsystem came up. Monotonic.
    fn ticks_ms(&self) -> u64;

    /// Presents the frame recorded since the last swap.
    fn swap_window(&mut self, window: WindowId) -> Result<(), PlatformError>;
}

/// GPU object management and draw submission against the current context.
pub trait Graphics {
    fn set_viewport(&mut self, viewport: Viewport);

    fn set_clear_color(&mut self, color: Color);

    fn create_vertex_array(&mut self) -> Result<GpuId, PlatformError>;

    /// Uploads `data` into a new static vertex buffer.
    fn create_vertex_buffer(&mut self, data: &[u8]) -> Result<GpuId, PlatformError>;

    /// Feeds `buffer` into `vertex_array` through `attribute`.
    fn vertex_attribute(
        &mut self,
        vertex_array: GpuId,
        buffer: GpuId,
        attribute: VertexAttribute,
    ) -> Result<(), PlatformError>;

    fn compile_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<GpuId, PlatformError>;

    /// Links a vertex and a fragment shader into a program.
    ///
    /// The shaders stay alive; a failed link allocates nothing.
    fn link_program(&mut self, vertex: GpuId, fragment: GpuId) -> Result<GpuId, PlatformError>;

    fn delete_shader(&mut self, shader: GpuId);

    fn delete_vertex_array(&mut self, vertex_array: GpuId);

    fn delete_vertex_buffer(&mut self, buffer: GpuId);

    fn delete_program(&mut self, program: GpuId);

    /// Clears the color target with the current clear color.
    fn clear(&mut self);

    fn use_program(&mut self, program: Option<GpuId>);

    fn bind_vertex_array(&mut self, vertex_array: Option<GpuId>);

    /// Draws `count` vertices from `first` as a triangle list using the
    /// current program and vertex array.
    fn draw_triangles(&mut self, first: u32, count: u32);
}

/// Anything that can host the application.
pub trait Backend: Platform + Graphics {}

impl<T: Platform + Graphics> Backend for T {}
