//! Deferred 2D rendering with lazy textures and frame capture.
//!
//! Draw calls submitted to a [`DeferredRenderer`] are queued per frame and
//! executed sorted by depth, with equal depths kept in submission order.
//! Pictures are registered lazily and only decoded and uploaded the first
//! time they are drawn, shrunk to fit the backend's texture limit when
//! needed. Frames can be saved as PNG screenshots or recorded into animated
//! GIFs, with all encoding done off the render thread.
//!
//! # Example
//!
//! ```rust
//! use deferred_render::config::BackendKind;
//! use deferred_render::render::Color;
//! use deferred_render::{DeferredRenderer, RendererConfig};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RendererConfig::builder().screen(320, 240).backend(BackendKind::Null).build()?;
//! let mut renderer = DeferredRenderer::new(config)?;
//!
//! renderer.render_rect(10, 10, 50, 20, 100, Color::WHITE, true);
//! renderer.render_rect(0, 0, 320, 240, -100, Color::BLACK, true);
//! assert_eq!(renderer.pending_calls(), 2);
//!
//! renderer.repaint();
//! assert_eq!(renderer.pending_calls(), 0);
//! # Ok(()) }
//! ```

pub mod capture;
pub mod config;
pub mod errors;
pub mod logging;
pub mod picture;
pub mod render;
pub mod renderer;

pub use config::RendererConfig;
pub use errors::RenderError;
pub use picture::{LoadState, PictureId};
pub use renderer::{DeferredRenderer, Sprite};
