#![allow(dead_code)]

use std::io::Cursor;

use deferred_render::config::BackendKind;
use deferred_render::render::backends::null::{Journal, NullBackend};
use deferred_render::render::backend::SurfaceSize;
use deferred_render::{DeferredRenderer, RendererConfig};

pub fn config(width: u32, height: u32) -> RendererConfig {
    RendererConfig::builder().screen(width, height).backend(BackendKind::Null).build().unwrap()
}

/// Renderer over a null backend, with the journal cleared of startup noise.
pub fn renderer_with(config: RendererConfig, backend: NullBackend) -> (DeferredRenderer, Journal) {
    let journal = backend.journal();
    let renderer = DeferredRenderer::with_backend(config, Box::new(backend)).unwrap();
    journal.clear();
    (renderer, journal)
}

pub fn renderer() -> (DeferredRenderer, Journal) {
    renderer_with(config(320, 240), NullBackend::new())
}

pub fn limited_renderer(limit: u32) -> (DeferredRenderer, Journal) {
    renderer_with(config(320, 240), NullBackend::new().with_max_texture_size(SurfaceSize::new(limit, limit)))
}

/// PNG file contents of a `width`×`height` image filled with `rgba`.
pub fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
