use serde::Deserialize;

use crate::capture::CaptureFrame;
use crate::picture::Picture;
use crate::render::{RenderCall, Viewport};

/// Size of a surface in pixels. It's a simple struct to hold width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Opaque backend texture handle. Only the backend that minted it can resolve it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// Where draw calls land.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RenderTarget {
    /// The game-resolution buffer the world is drawn into.
    #[default]
    Virtual,
    /// The real window. The virtual buffer is composited onto it on present.
    Screen,
}

/// Core backend interface. Calls occur on the thread that owns the graphics context.
///
/// Pixel buffers handed to and read back from a backend are RGBA8 with the
/// first row at the top.
pub trait RenderBackend {
    /// Name of the backend, used in log lines.
    fn name(&self) -> &str;

    /// Upload `width * height` RGBA8 texels (rows `pitch` bytes apart) and return a handle.
    fn materialize_texture(&mut self, pixels: &[u8], width: u32, height: u32, pitch: u32) -> anyhow::Result<TextureHandle>;

    /// Release a handle. Unknown handles are ignored.
    fn destroy_texture(&mut self, handle: TextureHandle);

    /// Release every handle this backend has minted.
    fn clear_all_textures(&mut self);

    /// Execute a single draw call.
    ///
    /// `picture` is set for sprite calls and is always materialized. When the call carries
    /// a source rectangle, the backend maps it through [`Picture::scale_source_rect`].
    fn execute_call(&mut self, call: &RenderCall, depth: i16, picture: Option<&Picture>);

    /// Restrict drawing to `clip`, or lift the restriction with `None`.
    fn apply_viewport(&mut self, clip: Option<Viewport>);

    /// Recompute the window-side layout after the window was resized.
    fn update_window(&mut self, window: SurfaceSize);

    fn set_render_target(&mut self, target: RenderTarget);

    /// Clear the current render target to opaque black.
    fn clear_buffer(&mut self);

    /// Composite the virtual buffer onto the window and present it.
    fn present(&mut self);

    /// Copy the texels of `handle`, tightly packed.
    fn read_texture(&self, handle: TextureHandle) -> anyhow::Result<Vec<u8>>;

    /// Copy `rect` of the current render target into `frame`.
    fn read_pixels(&mut self, rect: Viewport, frame: &mut CaptureFrame) -> anyhow::Result<()>;

    /// Largest texture the backend accepts. A zero dimension means unlimited.
    fn max_texture_size(&self) -> SurfaceSize;
}
