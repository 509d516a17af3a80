use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::capture::CaptureFrame;
use crate::picture::Picture;
use crate::render::backend::{RenderBackend, RenderTarget, SurfaceSize, TextureHandle};
use crate::render::{RenderCall, Viewport};

/// Everything a [`NullBackend`] was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOp {
    Materialize { handle: TextureHandle, width: u32, height: u32 },
    DestroyTexture(TextureHandle),
    ClearAllTextures,
    Execute { call: RenderCall, depth: i16 },
    Viewport(Option<Viewport>),
    UpdateWindow(SurfaceSize),
    Target(RenderTarget),
    Clear,
    Present,
    ReadPixels(Viewport),
}

/// Shared view on a backend's operation log. Cloning shares the log.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<BackendOp>>>);

impl Journal {
    pub fn ops(&self) -> Vec<BackendOp> {
        self.0.lock().map(|ops| ops.clone()).unwrap_or_default()
    }

    /// Only the executed draw calls, with their depth.
    pub fn executed(&self) -> Vec<(RenderCall, i16)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                BackendOp::Execute { call, depth } => Some((call, depth)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&BackendOp) -> bool) -> usize {
        self.ops().iter().filter(|op| pred(op)).count()
    }

    pub fn clear(&self) {
        if let Ok(mut ops) = self.0.lock() {
            ops.clear();
        }
    }

    fn push(&self, op: BackendOp) {
        if let Ok(mut ops) = self.0.lock() {
            ops.push(op);
        }
    }
}

/// Backend that draws nothing and records every request in a [`Journal`].
///
/// Textures are kept as plain byte vectors so tests can inspect what was
/// uploaded. Read-backs produce a deterministic pattern: red and green hold
/// the pixel's screen coordinates, blue counts the read-backs so far.
pub struct NullBackend {
    journal: Journal,
    textures: HashMap<TextureHandle, Vec<u8>>,
    next_handle: u64,
    max_texture_size: SurfaceSize,
    fail_textures: bool,
    reads: u8,
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NullBackend {
    /// Creates a new instance of the null backend with no texture limit.
    pub fn new() -> Self {
        Self {
            journal: Journal::default(),
            textures: HashMap::new(),
            next_handle: 1,
            max_texture_size: SurfaceSize::new(0, 0),
            fail_textures: false,
            reads: 0,
        }
    }

    pub fn with_max_texture_size(mut self, size: SurfaceSize) -> Self {
        self.max_texture_size = size;
        self
    }

    /// Makes every texture upload fail, like a backend out of video memory.
    pub fn with_failing_textures(mut self) -> Self {
        self.fail_textures = true;
        self
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn texture_pixels(&self, handle: TextureHandle) -> Option<&[u8]> {
        self.textures.get(&handle).map(Vec::as_slice)
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }
}

impl RenderBackend for NullBackend {
    fn name(&self) -> &str {
        "NullBackend"
    }

    fn materialize_texture(&mut self, pixels: &[u8], width: u32, height: u32, pitch: u32) -> Result<TextureHandle> {
        if self.fail_textures {
            return Err(anyhow!("texture uploads are disabled"));
        }

        let row = width as usize * 4;
        let mut texels = Vec::with_capacity(row * height as usize);
        for y in 0..height as usize {
            let start = y * pitch as usize;
            let line = pixels
                .get(start..start + row)
                .ok_or_else(|| anyhow!("pixel buffer too short for {width}x{height}"))?;
            texels.extend_from_slice(line);
        }

        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        self.textures.insert(handle, texels);
        self.journal.push(BackendOp::Materialize { handle, width, height });
        Ok(handle)
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle);
        self.journal.push(BackendOp::DestroyTexture(handle));
    }

    fn clear_all_textures(&mut self) {
        self.textures.clear();
        self.journal.push(BackendOp::ClearAllTextures);
    }

    fn execute_call(&mut self, call: &RenderCall, depth: i16, _picture: Option<&Picture>) {
        self.journal.push(BackendOp::Execute { call: *call, depth });
    }

    fn apply_viewport(&mut self, clip: Option<Viewport>) {
        self.journal.push(BackendOp::Viewport(clip));
    }

    fn update_window(&mut self, window: SurfaceSize) {
        self.journal.push(BackendOp::UpdateWindow(window));
    }

    fn set_render_target(&mut self, target: RenderTarget) {
        self.journal.push(BackendOp::Target(target));
    }

    fn clear_buffer(&mut self) {
        self.journal.push(BackendOp::Clear);
    }

    fn present(&mut self) {
        self.journal.push(BackendOp::Present);
    }

    fn read_texture(&self, handle: TextureHandle) -> Result<Vec<u8>> {
        self.texture_pixels(handle).map(<[u8]>::to_vec).ok_or_else(|| anyhow!("unknown texture {handle:?}"))
    }

    fn read_pixels(&mut self, rect: Viewport, frame: &mut CaptureFrame) -> Result<()> {
        self.journal.push(BackendOp::ReadPixels(rect));
        self.reads = self.reads.wrapping_add(1);

        let width = frame.width();
        let reads = self.reads;
        for (i, px) in frame.pixels_mut().chunks_exact_mut(4).enumerate() {
            let x = rect.x + (i as u32 % width) as i32;
            let y = rect.y + (i as u32 / width) as i32;
            px.copy_from_slice(&[x as u8, y as u8, reads, 255]);
        }

        Ok(())
    }

    fn max_texture_size(&self) -> SurfaceSize {
        self.max_texture_size
    }
}
