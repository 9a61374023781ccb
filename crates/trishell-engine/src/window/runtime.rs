use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::error::OsError;
use winit::event::{StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowAttributes};

use crate::coords::Viewport;
use crate::device::objects::{self, GpuObject, ObjectRegistry, Program, VertexArray};
use crate::device::{ContextHints, Gpu, SurfaceErrorAction, present_mode_for_interval};
use crate::paint::Color;
use crate::platform::{
    ContextId, Event, Graphics, GpuId, IdAllocator, Platform, PlatformError, ShaderDesc,
    ShaderStage, VertexAttribute, WindowId,
};

use super::WindowConfig;

/// How long a swap waits while the window has no drawable area.
const HIDDEN_FRAME_WAIT: Duration = Duration::from_millis(16);

/// Wait applied instead of presenting into a zero-sized surface.
fn hidden_frame_wait(size: PhysicalSize<u32>) -> Option<Duration> {
    (size.width == 0 || size.height == 0).then_some(HIDDEN_FRAME_WAIT)
}

struct WindowEntry {
    id: WindowId,
    window: Arc<Window>,
}

struct ContextEntry {
    id: ContextId,
    gpu: Gpu,
}

/// Binding state that persists across frames.
#[derive(Default)]
struct Bindings {
    clear_color: Color,
    viewport: Option<Viewport>,
    program: Option<GpuId>,
    vertex_array: Option<GpuId>,
}

#[derive(Debug, Copy, Clone)]
struct DrawCall {
    program: GpuId,
    vertex_array: GpuId,
    first: u32,
    count: u32,
}

/// Commands issued since the last present.
#[derive(Default)]
struct Recording {
    clear: Option<Color>,
    draws: Vec<DrawCall>,
}

/// winit + wgpu implementation of the platform seam.
///
/// Supports one window and one context at a time. Immediate-mode calls
/// (`clear`, `draw_triangles`) are recorded and encoded into a single render
/// pass when the window is swapped.
pub struct WinitBackend {
    // Field order is drop order: GPU objects, then the context, then the
    // window, then the event loop.
    objects: ObjectRegistry,
    context: Option<ContextEntry>,
    window: Option<WindowEntry>,
    event_loop: Option<EventLoop<()>>,

    epoch: Instant,
    hints: ContextHints,
    swap_interval: u32,
    ids: IdAllocator,

    events: VecDeque<Event>,
    pumped: bool,

    bindings: Bindings,
    recording: Recording,
}

impl WinitBackend {
    pub fn new() -> Self {
        Self {
            objects: ObjectRegistry::default(),
            context: None,
            window: None,
            event_loop: None,
            epoch: Instant::now(),
            hints: ContextHints::default(),
            swap_interval: 1,
            ids: IdAllocator::new(),
            events: VecDeque::new(),
            pumped: false,
            bindings: Bindings::default(),
            recording: Recording::default(),
        }
    }

    /// Runs one non-blocking iteration of the winit loop.
    ///
    /// When `create` is set, the window is created from inside the iteration
    /// (winit only hands out an `ActiveEventLoop` there).
    fn pump(&mut self, create: Option<WindowAttributes>) -> Option<Result<Window, OsError>> {
        let event_loop = self.event_loop.as_mut()?;

        let mut handler = PumpHandler {
            create,
            created: None,
            resized: None,
            events: &mut self.events,
        };

        let status = event_loop.pump_app_events(Some(Duration::ZERO), &mut handler);
        let PumpHandler {
            created, resized, ..
        } = handler;

        if let PumpStatus::Exit(code) = status {
            log::debug!("event loop exited with status {code}");
            self.events.push_back(Event::Quit);
        }

        if let (Some(size), Some(ctx)) = (resized, self.context.as_mut()) {
            ctx.gpu.resize(size);
        }

        created
    }

    fn gpu(&self) -> Result<&Gpu, PlatformError> {
        self.context
            .as_ref()
            .map(|c| &c.gpu)
            .ok_or(PlatformError::NoContext)
    }

    /// Drops every object owned by the current context along with the
    /// bindings and recorded commands that refer to them.
    fn forget_context_objects(&mut self) {
        self.objects.clear();
        self.recording = Recording::default();
        self.bindings.program = None;
        self.bindings.vertex_array = None;
    }

    fn window(&self, id: WindowId) -> Option<&Arc<Window>> {
        self.window
            .as_ref()
            .filter(|w| w.id == id)
            .map(|w| &w.window)
    }

    /// Encodes the recorded frame into one pass and presents it.
    fn present(&mut self, recording: Recording) -> Result<(), PlatformError> {
        let Some(ctx) = self.context.as_mut() else {
            return Err(PlatformError::NoContext);
        };

        let size = ctx.gpu.size();
        if let Some(wait) = hidden_frame_wait(size) {
            // Minimized. Nothing paces the loop without a present.
            thread::sleep(wait);
            return Ok(());
        }
        let format = ctx.gpu.surface_format();

        let mut draws = Vec::with_capacity(recording.draws.len());
        for draw in recording.draws {
            match self.objects.ensure_pipeline(
                ctx.gpu.device(),
                format,
                draw.program,
                draw.vertex_array,
            ) {
                Ok(()) => draws.push(draw),
                Err(err) => log::warn!("dropping draw call: {err}"),
            }
        }

        let mut frame = match ctx.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                let message = err.to_string();
                return match ctx.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => Err(PlatformError::Present(message)),
                    action => {
                        log::debug!("skipping frame ({action:?}): {message}");
                        Ok(())
                    }
                };
            }
        };

        {
            let load = match recording.clear {
                Some(color) => wgpu::LoadOp::Clear(color.to_wgpu()),
                None => wgpu::LoadOp::Load,
            };

            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("trishell frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let viewport = self
                .bindings
                .viewport
                .unwrap_or(Viewport::full(size.width, size.height))
                .clamped_to(size.width, size.height);

            if !viewport.is_empty() {
                rpass.set_viewport(
                    viewport.x as f32,
                    viewport.y as f32,
                    viewport.width as f32,
                    viewport.height as f32,
                    0.0,
                    1.0,
                );

                for draw in &draws {
                    let Some(pipeline) =
                        self.objects
                            .pipeline(format, draw.program, draw.vertex_array)
                    else {
                        continue;
                    };
                    let Some(vao) = self.objects.vertex_array(draw.vertex_array) else {
                        continue;
                    };

                    rpass.set_pipeline(pipeline);

                    if !vao.attributes.is_empty() {
                        let Some(buffer) = vao.buffer.and_then(|b| self.objects.buffer(b)) else {
                            log::warn!("vertex array {} has no live buffer", draw.vertex_array);
                            continue;
                        };
                        rpass.set_vertex_buffer(0, buffer.slice(..));
                    }

                    rpass.draw(draw.first..draw.first + draw.count, 0..1);
                }
            }
        }

        if let Some(entry) = &self.window {
            entry.window.pre_present_notify();
        }
        ctx.gpu.submit(frame);

        Ok(())
    }
}

impl Default for WinitBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for WinitBackend {
    fn init_video(&mut self) -> Result<(), PlatformError> {
        if self.event_loop.is_some() {
            return Ok(());
        }

        let event_loop = EventLoop::new().map_err(|e| PlatformError::Video(e.to_string()))?;
        self.event_loop = Some(event_loop);
        self.epoch = Instant::now();

        log::debug!("video subsystem up");
        Ok(())
    }

    fn quit_video(&mut self) {
        if self.event_loop.take().is_some() {
            self.events.clear();
            log::debug!("video subsystem down");
        }
    }

    fn request_context(&mut self, hints: &ContextHints) {
        self.hints = hints.clone();
    }

    fn create_window(&mut self, config: &WindowConfig) -> Result<WindowId, PlatformError> {
        if self.event_loop.is_none() {
            return Err(PlatformError::Window(
                "video subsystem is not initialized".to_string(),
            ));
        }
        if self.window.is_some() {
            return Err(PlatformError::Window("a window already exists".to_string()));
        }

        let window = match self.pump(Some(config.attributes())) {
            Some(Ok(window)) => window,
            Some(Err(err)) => return Err(PlatformError::Window(err.to_string())),
            None => {
                return Err(PlatformError::Window(
                    "event loop did not become active".to_string(),
                ));
            }
        };

        let id = WindowId::new(self.ids.next());
        self.window = Some(WindowEntry {
            id,
            window: Arc::new(window),
        });

        log::debug!("created {id} ({}x{})", config.width, config.height);
        Ok(id)
    }

    fn destroy_window(&mut self, window: WindowId) {
        if self.window.as_ref().is_some_and(|w| w.id == window) {
            self.window = None;
            log::debug!("destroyed {window}");
        }
    }

    fn create_context(&mut self, window: WindowId) -> Result<ContextId, PlatformError> {
        if self.context.is_some() {
            return Err(PlatformError::Context(
                "a rendering context already exists".to_string(),
            ));
        }
        let Some(handle) = self.window(window).cloned() else {
            return Err(PlatformError::Context(format!("{window} does not exist")));
        };

        let present_mode = present_mode_for_interval(self.swap_interval);
        let gpu = pollster::block_on(Gpu::new(handle, &self.hints, present_mode))
            .map_err(|e| PlatformError::Context(format!("{e:#}")))?;

        let info = gpu.adapter_info();
        log::info!(
            "rendering context on {} ({:?}, {:?})",
            info.name,
            info.backend,
            gpu.surface_format()
        );

        let id = ContextId::new(self.ids.next());
        self.context = Some(ContextEntry { id, gpu });
        Ok(id)
    }

    fn destroy_context(&mut self, context: ContextId) {
        if self.context.as_ref().is_some_and(|c| c.id == context) {
            // Objects belong to the context and go with it.
            self.forget_context_objects();
            self.context = None;
            log::debug!("destroyed {context}");
        }
    }

    fn set_swap_interval(&mut self, interval: u32) {
        self.swap_interval = interval;
        if let Some(ctx) = self.context.as_mut() {
            ctx.gpu.set_present_mode(present_mode_for_interval(interval));
        }
    }

    fn show_window(&mut self, window: WindowId) {
        if let Some(w) = self.window(window) {
            w.set_visible(true);
        }
    }

    fn window_pixel_size(&self, window: WindowId) -> (u32, u32) {
        self.window(window)
            .map(|w| {
                let PhysicalSize { width, height } = w.inner_size();
                (width, height)
            })
            .unwrap_or((0, 0))
    }

    fn set_window_title(&mut self, window: WindowId, title: &str) {
        if let Some(w) = self.window(window) {
            w.set_title(title);
        }
    }

    fn poll_event(&mut self) -> Option<Event> {
        // One pump per frame; events arriving after it wait for the next frame.
        if self.events.is_empty() && !self.pumped {
            self.pumped = true;
            self.pump(None);
        }
        self.events.pop_front()
    }

    fn ticks_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn swap_window(&mut self, window: WindowId) -> Result<(), PlatformError> {
        self.pumped = false;
        let recording = std::mem::take(&mut self.recording);

        if self.window(window).is_none() {
            return Err(PlatformError::Present(format!("{window} does not exist")));
        }
        self.present(recording)
    }
}

impl Graphics for WinitBackend {
    fn set_viewport(&mut self, viewport: Viewport) {
        self.bindings.viewport = Some(viewport);
    }

    fn set_clear_color(&mut self, color: Color) {
        self.bindings.clear_color = color;
    }

    fn create_vertex_array(&mut self) -> Result<GpuId, PlatformError> {
        self.gpu()?;
        Ok(self
            .objects
            .insert(GpuObject::VertexArray(VertexArray::default())))
    }

    fn create_vertex_buffer(&mut self, data: &[u8]) -> Result<GpuId, PlatformError> {
        let buffer = self
            .gpu()?
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("trishell vertex buffer"),
                contents: data,
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(self.objects.insert(GpuObject::Buffer(buffer)))
    }

    fn vertex_attribute(
        &mut self,
        vertex_array: GpuId,
        buffer: GpuId,
        attribute: VertexAttribute,
    ) -> Result<(), PlatformError> {
        let Some(ctx) = self.context.as_ref() else {
            return Err(PlatformError::NoContext);
        };
        self.objects.set_attribute(vertex_array, buffer, attribute)?;
        self.objects
            .link_against_programs(ctx.gpu.device(), ctx.gpu.surface_format(), vertex_array)
    }

    fn compile_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<GpuId, PlatformError> {
        let shader = objects::compile_shader(self.gpu()?.device(), desc)?;
        Ok(self.objects.insert(GpuObject::Shader(shader)))
    }

    fn link_program(&mut self, vertex: GpuId, fragment: GpuId) -> Result<GpuId, PlatformError> {
        let Some(ctx) = self.context.as_ref() else {
            return Err(PlatformError::NoContext);
        };

        let vs = self.objects.shader(vertex)?.clone();
        let fs = self.objects.shader(fragment)?.clone();
        if vs.stage != ShaderStage::Vertex {
            return Err(PlatformError::Link(format!("{vertex} is not a vertex shader")));
        }
        if fs.stage != ShaderStage::Fragment {
            return Err(PlatformError::Link(format!("{fragment} is not a fragment shader")));
        }

        let program = self.objects.insert(GpuObject::Program(Program {
            vertex: vs,
            fragment: fs,
        }));

        // Interface mismatches surface here rather than at the first draw.
        let device = ctx.gpu.device();
        let format = ctx.gpu.surface_format();
        if let Err(err) = self.objects.link_against_vertex_arrays(device, format, program) {
            self.objects
                .remove(program, |o| matches!(o, GpuObject::Program(_)));
            return Err(err);
        }

        Ok(program)
    }

    fn delete_shader(&mut self, shader: GpuId) {
        self.objects
            .remove(shader, |o| matches!(o, GpuObject::Shader(_)));
    }

    fn delete_vertex_array(&mut self, vertex_array: GpuId) {
        if self.bindings.vertex_array == Some(vertex_array) {
            self.bindings.vertex_array = None;
        }
        self.objects
            .remove(vertex_array, |o| matches!(o, GpuObject::VertexArray(_)));
    }

    fn delete_vertex_buffer(&mut self, buffer: GpuId) {
        self.objects
            .remove(buffer, |o| matches!(o, GpuObject::Buffer(_)));
    }

    fn delete_program(&mut self, program: GpuId) {
        if self.bindings.program == Some(program) {
            self.bindings.program = None;
        }
        self.objects
            .remove(program, |o| matches!(o, GpuObject::Program(_)));
    }

    fn clear(&mut self) {
        // A clear wipes whatever was drawn before it.
        self.recording.draws.clear();
        self.recording.clear = Some(self.bindings.clear_color);
    }

    fn use_program(&mut self, program: Option<GpuId>) {
        self.bindings.program = program;
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<GpuId>) {
        self.bindings.vertex_array = vertex_array;
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        match (self.bindings.program, self.bindings.vertex_array) {
            (Some(program), Some(vertex_array)) => self.recording.draws.push(DrawCall {
                program,
                vertex_array,
                first,
                count,
            }),
            _ => log::warn!("draw without a bound program and vertex array; skipped"),
        }
    }
}

/// Collects one pump iteration's worth of events.
struct PumpHandler<'a> {
    create: Option<WindowAttributes>,
    created: Option<Result<Window, OsError>>,
    resized: Option<PhysicalSize<u32>>,
    events: &'a mut VecDeque<Event>,
}

impl PumpHandler<'_> {
    fn create_pending(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(attrs) = self.create.take() {
            self.created = Some(event_loop.create_window(attrs));
        }
    }

    fn record(&mut self, event: WindowEvent) {
        let event = match event {
            WindowEvent::CloseRequested => Event::Quit,
            WindowEvent::Resized(size) => {
                self.resized = Some(size);
                Event::Resized {
                    width: size.width,
                    height: size.height,
                }
            }
            _ => Event::Other,
        };
        self.events.push_back(event);
    }
}

impl ApplicationHandler for PumpHandler<'_> {
    fn new_events(&mut self, event_loop: &ActiveEventLoop, _cause: StartCause) {
        self.create_pending(event_loop);
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        self.record(event);
    }
}
