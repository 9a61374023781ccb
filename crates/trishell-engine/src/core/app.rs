use crate::coords::Viewport;
use crate::platform::{Backend, ContextId, Event, GpuId, Owned, PlatformError, WindowId};
use crate::render::BoundVertexArray;
use crate::render::triangle::{self, TRIANGLE_VERTEX_COUNT};
use crate::time::{FpsCounter, write_title};

use super::AppConfig;

/// The whole program: one window, one context, one triangle.
///
/// Lifecycle:
/// - `new` acquires everything or nothing; a failure releases whatever was
///   already acquired before the error is returned
/// - `run` loops until a quit event arrives
/// - `shutdown` (also run on drop) releases everything, at most once each
pub struct Application<B: Backend> {
    backend: B,
    config: AppConfig,

    video: bool,
    window: Owned<WindowId>,
    context: Owned<ContextId>,
    vertex_array: Owned<GpuId>,
    vertex_buffer: Owned<GpuId>,
    program: Owned<GpuId>,

    running: bool,
    title: String,
    fps: FpsCounter,
}

impl<B: Backend> Application<B> {
    pub fn new(backend: B, config: AppConfig) -> Result<Self, PlatformError> {
        let mut app = Self {
            backend,
            title: config.window.title.clone(),
            fps: FpsCounter::with_interval(config.fps_interval_ms),
            config,
            video: false,
            window: Owned::empty(),
            context: Owned::empty(),
            vertex_array: Owned::empty(),
            vertex_buffer: Owned::empty(),
            program: Owned::empty(),
            running: false,
        };

        if let Err(err) = app.init() {
            app.shutdown();
            return Err(err);
        }

        Ok(app)
    }

    fn init(&mut self) -> Result<(), PlatformError> {
        self.backend.init_video()?;
        self.video = true;

        self.backend.request_context(&self.config.context);

        let window = self.backend.create_window(&self.config.window)?;
        self.window = Owned::new(window);

        let context = self.backend.create_context(window)?;
        self.context = Owned::new(context);

        self.backend.set_swap_interval(self.config.swap_interval);
        self.backend.show_window(window);

        let (width, height) = self.backend.window_pixel_size(window);
        self.backend.set_viewport(Viewport::full(width, height));
        self.backend.set_clear_color(self.config.clear_color);

        self.upload_geometry()?;
        self.build_program()?;

        self.running = true;
        log::info!("initialized {width}x{height} window");
        Ok(())
    }

    fn upload_geometry(&mut self) -> Result<(), PlatformError> {
        let vertex_array = self.backend.create_vertex_array()?;
        self.vertex_array = Owned::new(vertex_array);

        let vertex_buffer = self
            .backend
            .create_vertex_buffer(triangle::vertex_bytes())?;
        self.vertex_buffer = Owned::new(vertex_buffer);

        self.backend
            .vertex_attribute(vertex_array, vertex_buffer, triangle::POSITION_ATTRIBUTE)
    }

    fn build_program(&mut self) -> Result<(), PlatformError> {
        let vertex = self.backend.compile_shader(&triangle::VERTEX_SHADER)?;
        let fragment = match self.backend.compile_shader(&triangle::FRAGMENT_SHADER) {
            Ok(fragment) => fragment,
            Err(err) => {
                self.backend.delete_shader(vertex);
                return Err(err);
            }
        };

        let linked = self.backend.link_program(vertex, fragment);

        // Stage objects are freed whether or not the link succeeded.
        self.backend.delete_shader(vertex);
        self.backend.delete_shader(fragment);

        self.program = Owned::new(linked?);
        Ok(())
    }

    /// Runs the main loop until a quit event is handled.
    ///
    /// A quit observed while draining events still lets the current frame
    /// render and present; the loop ends before the next one.
    pub fn run(&mut self) -> Result<(), PlatformError> {
        let Some(window) = self.window.get() else {
            return Ok(());
        };

        self.fps.reset(self.backend.ticks_ms());

        while self.running {
            while let Some(event) = self.backend.poll_event() {
                self.handle_event(&event);
            }

            self.render();

            if let Err(err) = self.backend.swap_window(window) {
                self.running = false;
                return Err(err);
            }

            if let Some(fps) = self.fps.frame(self.backend.ticks_ms()) {
                write_title(&mut self.title, &self.config.window.title, fps);
                self.backend.set_window_title(window, &self.title);
                log::debug!("{fps:.1} fps");
            }
        }

        Ok(())
    }

    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Quit => {
                if self.running {
                    log::info!("quit requested");
                    self.running = false;
                }
            }
            other => log::trace!("ignoring {other:?}"),
        }
    }

    /// Records one frame: clear, then the triangle.
    pub fn render(&mut self) {
        self.backend.clear();

        let (Some(program), Some(vertex_array)) = (self.program.get(), self.vertex_array.get())
        else {
            return;
        };

        self.backend.use_program(Some(program));
        let mut bound = BoundVertexArray::bind(&mut self.backend, vertex_array);
        bound.draw_triangles(0, TRIANGLE_VERTEX_COUNT);
    }

    /// Releases every acquired resource.
    ///
    /// Order: context, window, vertex array, vertex buffer, program, video
    /// subsystem. Already-released resources are skipped, so calling this
    /// again is a no-op.
    pub fn shutdown(&mut self) {
        let backend = &mut self.backend;

        let released = [
            self.context.release(|id| backend.destroy_context(id)),
            self.window.release(|id| backend.destroy_window(id)),
            self.vertex_array.release(|id| backend.delete_vertex_array(id)),
            self.vertex_buffer.release(|id| backend.delete_vertex_buffer(id)),
            self.program.release(|id| backend.delete_program(id)),
        ]
        .into_iter()
        .filter(|released| *released)
        .count();

        if self.video {
            backend.quit_video();
            self.video = false;
        }

        self.running = false;

        if released > 0 {
            log::debug!("released {released} resources");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current window title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Last frame-rate readout.
    pub fn fps(&self) -> f32 {
        self.fps.value()
    }

    pub fn window(&self) -> Option<WindowId> {
        self.window.get()
    }

    pub fn context(&self) -> Option<ContextId> {
        self.context.get()
    }

    pub fn vertex_array(&self) -> Option<GpuId> {
        self.vertex_array.get()
    }

    pub fn vertex_buffer(&self) -> Option<GpuId> {
        self.vertex_buffer.get()
    }

    pub fn program(&self) -> Option<GpuId> {
        self.program.get()
    }
}

impl<B: Backend> Drop for Application<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
