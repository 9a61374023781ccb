//! Scripted in-memory backend for driving `Application` in tests.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use crate::coords::Viewport;
use crate::device::ContextHints;
use crate::paint::Color;
use crate::platform::{
    ContextId, Event, Graphics, GpuId, IdAllocator, Platform, PlatformError, ShaderDesc,
    ShaderStage, VertexAttribute, WindowId,
};
use crate::window::WindowConfig;

/// Every swap beyond this is treated as a runaway loop.
const MAX_SWAPS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    InitVideo,
    QuitVideo,
    RequestContext,
    CreateWindow(WindowId),
    DestroyWindow(WindowId),
    CreateContext(ContextId),
    DestroyContext(ContextId),
    SwapInterval(u32),
    ShowWindow(WindowId),
    SetTitle(String),
    Swap,
    SetViewport(Viewport),
    SetClearColor(Color),
    CreateVertexArray(GpuId),
    CreateVertexBuffer(GpuId, usize),
    VertexAttribute(GpuId, GpuId, VertexAttribute),
    CompileShader(ShaderStage, GpuId),
    LinkProgram(GpuId),
    DeleteShader(GpuId),
    DeleteVertexArray(GpuId),
    DeleteVertexBuffer(GpuId),
    DeleteProgram(GpuId),
    Clear,
    UseProgram(Option<GpuId>),
    BindVertexArray(Option<GpuId>),
    Draw { first: u32, count: u32 },
}

/// What the backend saw. Shared with the test so it survives the app.
#[derive(Debug, Default)]
pub struct Journal {
    pub calls: Vec<Call>,
    pub swaps: u64,
    pub video_up: bool,
    pub live_windows: BTreeSet<WindowId>,
    pub live_contexts: BTreeSet<ContextId>,
    pub live_objects: BTreeSet<GpuId>,
}

impl Journal {
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.iter().position(pred)
    }

    pub fn titles(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::SetTitle(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Failure injection and input scripts.
#[derive(Debug, Default)]
pub struct Script {
    pub fail_video: Option<String>,
    pub fail_window: Option<String>,
    pub fail_context: Option<String>,
    pub fail_shader: Option<ShaderStage>,
    pub fail_link: Option<String>,
    /// Values returned by successive `ticks_ms` calls; the last one repeats.
    pub ticks: VecDeque<u64>,
    /// `(swaps_completed, event)`: the event becomes pending once that many
    /// frames have been presented.
    pub events: VecDeque<(u64, Event)>,
}

pub struct MockBackend {
    journal: Rc<RefCell<Journal>>,
    script: Script,
    ids: IdAllocator,
    window_size: (u32, u32),
    last_tick: u64,
}

impl MockBackend {
    pub fn new(script: Script) -> (Self, Rc<RefCell<Journal>>) {
        let journal = Rc::new(RefCell::new(Journal::default()));
        let backend = Self {
            journal: journal.clone(),
            script,
            ids: IdAllocator::new(),
            window_size: (0, 0),
            last_tick: 0,
        };
        (backend, journal)
    }

    fn record(&self, call: Call) {
        self.journal.borrow_mut().calls.push(call);
    }

    fn require_context(&self) -> Result<(), PlatformError> {
        if self.journal.borrow().live_contexts.is_empty() {
            Err(PlatformError::NoContext)
        } else {
            Ok(())
        }
    }

    fn new_object(&mut self) -> GpuId {
        let id = GpuId::new(self.ids.next());
        self.journal.borrow_mut().live_objects.insert(id);
        id
    }

    fn free_object(&self, id: GpuId) {
        let freed = self.journal.borrow_mut().live_objects.remove(&id);
        assert!(freed, "double free of {id}");
    }
}

impl Platform for MockBackend {
    fn init_video(&mut self) -> Result<(), PlatformError> {
        self.record(Call::InitVideo);
        if let Some(msg) = self.script.fail_video.clone() {
            return Err(PlatformError::Video(msg));
        }
        self.journal.borrow_mut().video_up = true;
        Ok(())
    }

    fn quit_video(&mut self) {
        self.record(Call::QuitVideo);
        let mut j = self.journal.borrow_mut();
        assert!(j.video_up, "video subsystem released twice");
        j.video_up = false;
    }

    fn request_context(&mut self, _hints: &ContextHints) {
        self.record(Call::RequestContext);
    }

    fn create_window(&mut self, config: &WindowConfig) -> Result<WindowId, PlatformError> {
        assert!(self.journal.borrow().video_up, "window before video init");
        if let Some(msg) = self.script.fail_window.clone() {
            return Err(PlatformError::Window(msg));
        }
        let id = WindowId::new(self.ids.next());
        self.window_size = (config.width, config.height);
        self.journal.borrow_mut().live_windows.insert(id);
        self.record(Call::CreateWindow(id));
        Ok(id)
    }

    fn destroy_window(&mut self, window: WindowId) {
        self.record(Call::DestroyWindow(window));
        let mut j = self.journal.borrow_mut();
        assert!(j.live_contexts.is_empty(), "window destroyed under a live context");
        assert!(j.live_windows.remove(&window), "double free of {window}");
    }

    fn create_context(&mut self, window: WindowId) -> Result<ContextId, PlatformError> {
        assert!(self.journal.borrow().live_windows.contains(&window));
        if let Some(msg) = self.script.fail_context.clone() {
            return Err(PlatformError::Context(msg));
        }
        let id = ContextId::new(self.ids.next());
        self.journal.borrow_mut().live_contexts.insert(id);
        self.record(Call::CreateContext(id));
        Ok(id)
    }

    fn destroy_context(&mut self, context: ContextId) {
        self.record(Call::DestroyContext(context));
        let removed = self.journal.borrow_mut().live_contexts.remove(&context);
        assert!(removed, "double free of {context}");
    }

    fn set_swap_interval(&mut self, interval: u32) {
        self.record(Call::SwapInterval(interval));
    }

    fn show_window(&mut self, window: WindowId) {
        self.record(Call::ShowWindow(window));
    }

    fn window_pixel_size(&self, _window: WindowId) -> (u32, u32) {
        self.window_size
    }

    fn set_window_title(&mut self, _window: WindowId, title: &str) {
        self.record(Call::SetTitle(title.to_string()));
    }

    fn poll_event(&mut self) -> Option<Event> {
        let swaps = self.journal.borrow().swaps;
        match self.script.events.front() {
            Some(&(at, event)) if at <= swaps => {
                self.script.events.pop_front();
                Some(event)
            }
            _ => None,
        }
    }

    fn ticks_ms(&self) -> u64 {
        self.last_tick
    }

    fn swap_window(&mut self, _window: WindowId) -> Result<(), PlatformError> {
        self.record(Call::Swap);
        let mut j = self.journal.borrow_mut();
        j.swaps += 1;
        assert!(j.swaps <= MAX_SWAPS, "runaway main loop");
        drop(j);

        // Time advances between presents.
        if let Some(t) = self.script.ticks.pop_front() {
            self.last_tick = t;
        }
        Ok(())
    }
}

impl Graphics for MockBackend {
    fn set_viewport(&mut self, viewport: Viewport) {
        self.record(Call::SetViewport(viewport));
    }

    fn set_clear_color(&mut self, color: Color) {
        self.record(Call::SetClearColor(color));
    }

    fn create_vertex_array(&mut self) -> Result<GpuId, PlatformError> {
        self.require_context()?;
        let id = self.new_object();
        self.record(Call::CreateVertexArray(id));
        Ok(id)
    }

    fn create_vertex_buffer(&mut self, data: &[u8]) -> Result<GpuId, PlatformError> {
        self.require_context()?;
        let id = self.new_object();
        self.record(Call::CreateVertexBuffer(id, data.len()));
        Ok(id)
    }

    fn vertex_attribute(
        &mut self,
        vertex_array: GpuId,
        buffer: GpuId,
        attribute: VertexAttribute,
    ) -> Result<(), PlatformError> {
        self.require_context()?;
        self.record(Call::VertexAttribute(vertex_array, buffer, attribute));
        Ok(())
    }

    fn compile_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<GpuId, PlatformError> {
        self.require_context()?;
        if self.script.fail_shader == Some(desc.stage) {
            return Err(PlatformError::Shader(format!("{}: syntax error", desc.label)));
        }
        let id = self.new_object();
        self.record(Call::CompileShader(desc.stage, id));
        Ok(id)
    }

    fn link_program(&mut self, vertex: GpuId, fragment: GpuId) -> Result<GpuId, PlatformError> {
        self.require_context()?;
        {
            let j = self.journal.borrow();
            assert!(j.live_objects.contains(&vertex) && j.live_objects.contains(&fragment));
        }
        if let Some(msg) = self.script.fail_link.clone() {
            return Err(PlatformError::Link(msg));
        }
        let id = self.new_object();
        self.record(Call::LinkProgram(id));
        Ok(id)
    }

    fn delete_shader(&mut self, shader: GpuId) {
        self.record(Call::DeleteShader(shader));
        self.free_object(shader);
    }

    fn delete_vertex_array(&mut self, vertex_array: GpuId) {
        self.record(Call::DeleteVertexArray(vertex_array));
        self.free_object(vertex_array);
    }

    fn delete_vertex_buffer(&mut self, buffer: GpuId) {
        self.record(Call::DeleteVertexBuffer(buffer));
        self.free_object(buffer);
    }

    fn delete_program(&mut self, program: GpuId) {
        self.record(Call::DeleteProgram(program));
        self.free_object(program);
    }

    fn clear(&mut self) {
        self.record(Call::Clear);
    }

    fn use_program(&mut self, program: Option<GpuId>) {
        self.record(Call::UseProgram(program));
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<GpuId>) {
        self.record(Call::BindVertexArray(vertex_array));
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        self.record(Call::Draw { first, count });
    }
}
