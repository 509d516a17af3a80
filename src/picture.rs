//! Picture resources.
//!
//! A [`Picture`] is one image asset as seen by the renderer. It moves through
//! a small state machine:
//!
//! ```text
//! not-inited ──lazy load──▶ lazy ──materialize──▶ materialized
//!                             ▲                        │
//!                             └─────────evict──────────┘
//! ```
//!
//! A lazy picture holds the raw encoded bytes of its image (and mask) but no
//! backend texture. Materializing decodes those bytes, applies the mask,
//! color key and size policy, and uploads the result. Evicting destroys the
//! texture but keeps the raw bytes, so the picture can be materialized again.
//! Destroying a picture removes it from its [`PictureStore`] for good.

mod decode;
mod store;

pub use decode::{plan_size, SizePlan};
pub use store::PictureStore;

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::render::backend::{SurfaceSize, TextureHandle};
use crate::render::{CallRect, Color};

/// A unique identifier for a picture, represented as a UUID.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PictureId(Uuid);

impl PictureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PictureId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing usable was loaded.
    NotInited,
    /// Raw bytes are present, no texture yet (or evicted).
    Lazy,
    /// A backend texture is present.
    Materialized,
}

/// Encoded bytes kept around by a lazy picture.
#[derive(Clone, Default)]
pub(crate) struct LazySource {
    pub raw: Vec<u8>,
    pub mask: Vec<u8>,
    /// The mask is a PNG whose alpha channel is copied, rather than a luminance mask.
    pub mask_is_png: bool,
}

impl std::fmt::Debug for LazySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazySource")
            .field("raw", &self.raw.len())
            .field("mask", &self.mask.len())
            .field("mask_is_png", &self.mask_is_png)
            .finish()
    }
}

#[derive(Debug)]
pub struct Picture {
    id: PictureId,
    path: Option<PathBuf>,

    /// Texel dimensions. Before the first materialize these are the image metrics.
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Dimensions before downscaling, zero when never downscaled.
    pub(crate) orig_width: u32,
    pub(crate) orig_height: u32,
    /// Downscaled / original, per axis.
    pub(crate) w_scale: f32,
    pub(crate) h_scale: f32,

    /// Top-left texel.
    pub(crate) color_upper: Color,
    /// Bottom-left texel.
    pub(crate) color_lower: Color,
    pub(crate) color_key: Option<Color>,

    pub(crate) inited: bool,
    pub(crate) lazy: Option<LazySource>,
    pub(crate) texture: Option<TextureHandle>,

    /// Set once the "drawing an empty picture" warning was logged.
    pub(crate) warned_empty: bool,
}

impl Picture {
    pub(crate) fn new(path: Option<&Path>) -> Self {
        Self {
            id: PictureId::new(),
            path: path.map(Path::to_path_buf),
            width: 0,
            height: 0,
            orig_width: 0,
            orig_height: 0,
            w_scale: 1.0,
            h_scale: 1.0,
            color_upper: Color::BLACK,
            color_lower: Color::BLACK,
            color_key: None,
            inited: false,
            lazy: None,
            texture: None,
            warned_empty: false,
        }
    }

    pub fn id(&self) -> PictureId {
        self.id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn state(&self) -> LoadState {
        if self.texture.is_some() {
            LoadState::Materialized
        } else if self.inited && self.lazy.is_some() {
            LoadState::Lazy
        } else {
            LoadState::NotInited
        }
    }

    pub fn is_inited(&self) -> bool {
        self.inited
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy.is_some()
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    /// Texel dimensions of the texture.
    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }

    /// Size callers address the picture in: the original size if it was downscaled.
    pub fn logical_size(&self) -> SurfaceSize {
        if self.is_downscaled() {
            SurfaceSize::new(self.orig_width, self.orig_height)
        } else {
            self.size()
        }
    }

    pub fn original_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.orig_width, self.orig_height)
    }

    pub fn is_downscaled(&self) -> bool {
        self.orig_width != 0 || self.orig_height != 0
    }

    pub fn scale(&self) -> (f32, f32) {
        (self.w_scale, self.h_scale)
    }

    pub fn color_upper(&self) -> Color {
        self.color_upper
    }

    pub fn color_lower(&self) -> Color {
        self.color_lower
    }

    pub fn color_key(&self) -> Option<Color> {
        self.color_key
    }

    /// Maps a source rectangle given in logical coordinates onto texels.
    ///
    /// Sprite sheets keep addressing frames in original-size coordinates after a
    /// picture was downscaled; this multiplies the rectangle by the recorded
    /// scale factors.
    pub fn scale_source_rect(&self, src: CallRect) -> CallRect {
        if !self.is_downscaled() {
            return src;
        }

        let sx = |v: i16| (v as f32 * self.w_scale) as i32;
        let sy = |v: i16| (v as f32 * self.h_scale) as i32;
        CallRect::new(sx(src.x), sy(src.y), sx(src.w), sy(src.h))
    }

    pub(crate) fn reset_colors(&mut self) {
        self.color_upper = Color::BLACK;
        self.color_lower = Color::BLACK;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_picture_is_not_inited() {
        let pic = Picture::new(None);
        assert_eq!(pic.state(), LoadState::NotInited);
        assert!(!pic.is_downscaled());
        assert_eq!(pic.scale(), (1.0, 1.0));
    }

    #[test]
    fn source_rect_is_untouched_without_downscale() {
        let mut pic = Picture::new(None);
        pic.width = 64;
        pic.height = 64;
        let src = CallRect::new(32, 16, 16, 16);
        assert_eq!(pic.scale_source_rect(src), src);
    }

    #[test]
    fn source_rect_follows_scale_factors() {
        let mut pic = Picture::new(None);
        pic.width = 32;
        pic.height = 16;
        pic.orig_width = 64;
        pic.orig_height = 64;
        pic.w_scale = 0.5;
        pic.h_scale = 0.25;

        assert_eq!(pic.logical_size(), SurfaceSize::new(64, 64));
        assert_eq!(pic.scale_source_rect(CallRect::new(32, 32, 16, 16)), CallRect::new(16, 8, 8, 4));
    }
}
