//! The deferred renderer.
//!
//! [`DeferredRenderer`] is the single entry point for drawing. Draw calls
//! are collected in a [`RenderQueue`] during the frame and executed sorted by
//! depth when the queue is flushed, which happens on [`repaint`], on viewport
//! and render target changes, and on demand. In direct mode calls bypass the
//! queue and execute right away; the renderer uses that for overlays drawn
//! while presenting.
//!
//! [`repaint`]: DeferredRenderer::repaint

mod capture;
mod draw;
mod textures;

pub use draw::Sprite;

use std::sync::Arc;

use tokio::runtime::Runtime;

use crate::capture::{CaptureNamer, GifRecorder};
use crate::config::RendererConfig;
use crate::errors::RenderError;
use crate::picture::PictureStore;
use crate::render::backend::{RenderBackend, RenderTarget, SurfaceSize};
use crate::render::backends;
use crate::render::{letterbox, RenderCall, RenderQueue, Viewport, ViewportOffset};

pub struct DeferredRenderer {
    config: RendererConfig,
    backend: Box<dyn RenderBackend>,
    queue: RenderQueue,
    pictures: PictureStore,

    /// Clip rectangle of the current target, `None` for the whole target.
    viewport: Option<Viewport>,
    offset: ViewportOffset,
    /// Execute calls on submission instead of queueing them.
    direct: bool,
    target: RenderTarget,
    block_render: bool,

    /// Runs screenshot and recording encoders.
    runtime: Arc<Runtime>,
    recorder: GifRecorder,
    namer: CaptureNamer,
    closed: bool,
}

impl DeferredRenderer {
    /// Creates a renderer with the backend selected in `config`.
    pub fn new(config: RendererConfig) -> Result<Self, RenderError> {
        let backend = backends::create(&config).map_err(|e| RenderError::BackendInit(format!("{e:#}")))?;
        Self::with_backend(config, backend)
    }

    /// Creates a renderer drawing through `backend`.
    pub fn with_backend(config: RendererConfig, mut backend: Box<dyn RenderBackend>) -> Result<Self, RenderError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("capture")
            .enable_all()
            .build()
            .map_err(RenderError::Runtime)?;

        backend.update_window(config.window);
        backend.set_render_target(RenderTarget::Virtual);
        backend.apply_viewport(None);

        log::info!(
            "{} ready: {}x{} screen in a {}x{} window",
            backend.name(),
            config.screen.width,
            config.screen.height,
            config.window.width,
            config.window.height
        );

        Ok(Self {
            pictures: PictureStore::new(config.textures.clone(), config.max_texture_size),
            recorder: GifRecorder::new(&config.capture),
            config,
            backend,
            queue: RenderQueue::new(),
            viewport: None,
            offset: ViewportOffset::default(),
            direct: false,
            target: RenderTarget::Virtual,
            block_render: false,
            runtime: Arc::new(runtime),
            namer: CaptureNamer::new(),
            closed: false,
        })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn RenderBackend {
        self.backend.as_mut()
    }

    /// Calls waiting for the next flush.
    pub fn pending_calls(&self) -> usize {
        self.queue.len()
    }

    /// Finishes the frame: flushes the queue, draws overlays and presents.
    ///
    /// Overlays are drawn in direct mode so they never end up in the next
    /// frame's queue. Does nothing while rendering is blocked.
    ///
    /// The window stays the render target afterwards; switch back with
    /// [`set_target_texture`](Self::set_target_texture) before drawing the next frame.
    pub fn repaint(&mut self) {
        if self.block_render {
            return;
        }

        self.flush_render_queue();

        let was_direct = self.direct;
        self.direct = true;

        self.set_target_screen();
        self.process_recorder();

        self.direct = was_direct;

        self.backend.present();
    }

    /// Executes every queued call in `(depth, submission order)` order.
    pub fn flush_render_queue(&mut self) {
        let backend = self.backend.as_mut();
        let pictures = &mut self.pictures;
        self.queue.flush(|call, depth| execute(backend, pictures, call, depth));
    }

    pub fn set_viewport(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.flush_render_queue();
        self.viewport = Some(Viewport::from_signed(x, y, w, h));
        self.backend.apply_viewport(self.viewport);
    }

    /// Lifts the clip rectangle and resets the shake offset.
    pub fn reset_viewport(&mut self) {
        self.flush_render_queue();
        self.update_viewport(self.config.window);
        self.viewport = None;
        self.backend.apply_viewport(None);
    }

    /// Adopts a new window size. Also drops the shake offset and its ignore flag.
    pub fn update_viewport(&mut self, window: SurfaceSize) {
        if window.width > 0 && window.height > 0 {
            self.config.window = window;
        }
        self.backend.update_window(self.config.window);
        self.offset.reset();
    }

    /// Clip rectangle of the current render target. Switching targets lifts it.
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Maps a window position, such as a mouse position, onto the game screen.
    ///
    /// Positions on the letterbox bars map outside the screen.
    pub fn map_to_screen(&self, x: i32, y: i32) -> (i32, i32) {
        let (dst, sx, sy) = self.window_scale();
        if sx == 0.0 || sy == 0.0 {
            return (0, 0);
        }
        (((x - dst.x) as f32 / sx) as i32, ((y - dst.y) as f32 / sy) as i32)
    }

    /// Maps a game screen position into the window.
    pub fn map_from_screen(&self, x: i32, y: i32) -> (i32, i32) {
        let (dst, sx, sy) = self.window_scale();
        ((x as f32 * sx) as i32 + dst.x, (y as f32 * sy) as i32 + dst.y)
    }

    /// Letterbox of the screen in the window and its scale factors.
    fn window_scale(&self) -> (Viewport, f32, f32) {
        let screen = self.config.screen;
        let dst = letterbox(screen, self.config.window);
        (dst, dst.width as f32 / screen.width as f32, dst.height as f32 / screen.height as f32)
    }

    /// Sets the shake offset added to every destination coordinate.
    pub fn offset_viewport(&mut self, x: i32, y: i32) {
        self.offset.set(x, y);
    }

    /// While set, destination coordinates are not shaken. The shake offset is kept.
    pub fn offset_viewport_ignore(&mut self, ignore: bool) {
        self.offset.set_ignore(ignore);
    }

    pub fn viewport_offset(&self) -> ViewportOffset {
        self.offset
    }

    /// Draws into the game-resolution buffer from now on.
    pub fn set_target_texture(&mut self) {
        self.set_render_target(RenderTarget::Virtual);
    }

    /// Draws into the window from now on.
    pub fn set_target_screen(&mut self) {
        self.set_render_target(RenderTarget::Screen);
    }

    pub fn render_target(&self) -> RenderTarget {
        self.target
    }

    fn set_render_target(&mut self, target: RenderTarget) {
        if self.target == target {
            return;
        }
        self.flush_render_queue();
        self.backend.set_render_target(target);
        self.target = target;
        // the backend drops its clip with the target
        self.viewport = None;
    }

    /// Clears the current render target to black.
    pub fn clear_buffer(&mut self) {
        assert!(!self.block_render, "clear_buffer called while rendering is blocked");
        self.backend.clear_buffer();
    }

    /// Blocks or unblocks rendering. While blocked, [`repaint`](Self::repaint) is skipped and
    /// submitting a draw call panics.
    pub fn set_block_render(&mut self, block: bool) {
        self.block_render = block;
    }

    pub fn render_blocked(&self) -> bool {
        self.block_render
    }

    /// Switches direct mode. In direct mode calls execute on submission.
    pub fn set_direct_mode(&mut self, direct: bool) {
        self.direct = direct;
    }

    pub fn is_direct_mode(&self) -> bool {
        self.direct
    }

    /// Queues `call`, or executes it right away in direct mode.
    pub fn dispatch(&mut self, call: RenderCall, depth: i16) {
        assert!(!self.block_render, "draw call submitted while rendering is blocked");

        if self.direct {
            execute(self.backend.as_mut(), &mut self.pictures, &call, depth);
        } else {
            self.queue.submit(call, depth);
        }
    }

    /// Finishes an active recording, waiting for its file, and releases every texture.
    ///
    /// Runs on drop as well; calling it twice is harmless.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        self.queue.clear();
        self.recorder.finish_blocking(self.runtime.handle());
        self.pictures.clear_textures(self.backend.as_mut());
        log::debug!("{} closed", self.backend.name());
    }
}

impl Drop for DeferredRenderer {
    fn drop(&mut self) {
        self.close();
    }
}

fn execute(backend: &mut dyn RenderBackend, pictures: &mut PictureStore, call: &RenderCall, depth: i16) {
    match call.picture() {
        Some(id) => {
            if let Some(picture) = pictures.prepare_for_draw(id, backend) {
                backend.execute_call(call, depth, Some(picture));
            }
        }
        None => backend.execute_call(call, depth, None),
    }
}
