pub mod null;
pub mod software;

use crate::config::{BackendKind, RendererConfig};
use crate::render::backend::{RenderBackend, SurfaceSize};

/// Creates the backend selected in `config`.
pub fn create(config: &RendererConfig) -> anyhow::Result<Box<dyn RenderBackend>> {
    let backend: Box<dyn RenderBackend> = match config.backend {
        BackendKind::Software => {
            let limit = config.max_texture_size.unwrap_or(SurfaceSize::new(
                software::DEFAULT_MAX_TEXTURE_SIZE,
                software::DEFAULT_MAX_TEXTURE_SIZE,
            ));
            Box::new(software::SoftwareBackend::new(config.screen, config.window).with_max_texture_size(limit))
        }
        BackendKind::Null => {
            let mut backend = null::NullBackend::new();
            if let Some(limit) = config.max_texture_size {
                backend = backend.with_max_texture_size(limit);
            }
            Box::new(backend)
        }
    };

    log::debug!("created {} for a {}x{} screen", backend.name(), config.screen.width, config.screen.height);
    Ok(backend)
}
