//! Turning encoded image bytes into uploadable texels.

use std::io::Cursor;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageReader, Rgba, RgbaImage};

use crate::config::TexturePolicy;
use crate::errors::RenderError;
use crate::picture::LazySource;
use crate::render::backend::SurfaceSize;
use crate::render::Color;

/// Final texture dimensions chosen for a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePlan {
    pub width: u32,
    pub height: u32,
    /// Decoded size, set when the texture ends up smaller than the image.
    pub orig: Option<SurfaceSize>,
    /// The hardware limit forced the size down.
    pub limited: bool,
}

impl SizePlan {
    /// Per-axis `final / original`, `(1.0, 1.0)` when nothing was scaled.
    pub fn scale(&self) -> (f32, f32) {
        match self.orig {
            Some(orig) => (self.width as f32 / orig.width as f32, self.height as f32 / orig.height as f32),
            None => (1.0, 1.0),
        }
    }
}

/// Picks the texture size for a `width` × `height` image.
///
/// `halve` shrinks both axes by two first. Afterwards each axis is clamped to
/// `limit`; a zero limit dimension means unlimited.
pub fn plan_size(width: u32, height: u32, halve: bool, limit: SurfaceSize) -> SizePlan {
    let mut plan = SizePlan { width, height, orig: None, limited: false };
    let orig = SurfaceSize::new(width, height);

    if halve {
        plan.orig = Some(orig);
        plan.width = (width / 2).max(1);
        plan.height = (height / 2).max(1);
    }

    if limit.width > 0 && plan.width > limit.width {
        plan.orig = Some(orig);
        plan.width = limit.width;
        plan.limited = true;
    }

    if limit.height > 0 && plan.height > limit.height {
        plan.orig = Some(orig);
        plan.height = limit.height;
        plan.limited = true;
    }

    plan
}

/// Result of [`prepare`]: texels ready for upload plus what the picture records about them.
pub(crate) struct Prepared {
    pub image: RgbaImage,
    /// Size right after decoding, before any downscale.
    pub decoded: SurfaceSize,
    pub has_mask: bool,
    pub plan: SizePlan,
    pub upper: Color,
    pub lower: Color,
}

/// Reads the dimensions from the image header without decoding texels.
pub(crate) fn read_metrics(raw: &[u8]) -> Result<SurfaceSize, RenderError> {
    let reader = ImageReader::new(Cursor::new(raw)).with_guessed_format()?;
    let (w, h) = reader.into_dimensions().map_err(|e| RenderError::Decode(e.to_string()))?;
    Ok(SurfaceSize::new(w, h))
}

/// Masks only apply to non-PNG images; PNGs carry their own alpha.
pub(crate) fn uses_mask(path: &Path) -> bool {
    !path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

pub(crate) fn decode(raw: &[u8]) -> Result<RgbaImage, RenderError> {
    image::load_from_memory(raw)
        .map(|img| img.to_rgba8())
        .map_err(|e| RenderError::Decode(e.to_string()))
}

/// Decodes a lazy source and applies mask, color key and size policy.
///
/// Returns `Ok(None)` for an image that decoded to zero size.
pub(crate) fn prepare(
    source: &LazySource,
    color_key: Option<Color>,
    policy: &TexturePolicy,
    limit: SurfaceSize,
) -> Result<Option<Prepared>, RenderError> {
    let mut image = decode(&source.raw)?;

    let has_mask = !source.mask.is_empty();
    if has_mask {
        let mask = decode(&source.mask)?;
        merge_mask(&mut image, &mask, source.mask_is_png);
    }

    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Ok(None);
    }

    let (upper, lower) = corner_colors(&image);

    if let Some(key) = color_key {
        apply_color_key(&mut image, key);
    }

    // image decodes top-down, which is already the orientation backends expect

    let doubled = !policy.scale_down_all && policy.detect_pixel_doubled && is_pixel_doubled(&image);
    let plan = plan_size(w, h, policy.scale_down_all || doubled, limit);

    if plan.limited {
        log::warn!(
            "texture of {w}x{h} exceeds the {}x{} hardware limit and was downscaled to {}x{}",
            limit.width,
            limit.height,
            plan.width,
            plan.height
        );
    }

    if plan.width != w || plan.height != h {
        let filter = if doubled && !plan.limited { FilterType::Nearest } else { FilterType::Triangle };
        image = imageops::resize(&image, plan.width, plan.height, filter);
    }

    Ok(Some(Prepared { image, decoded: SurfaceSize::new(w, h), has_mask, plan, upper, lower }))
}

/// Combines `image` with its transparency mask.
///
/// A classic mask is white where the image is transparent: the texel alpha
/// becomes `255 - luminance`. A PNG fallback mask instead lends its own alpha
/// channel. Texels outside the mask stay as they are.
pub(crate) fn merge_mask(image: &mut RgbaImage, mask: &RgbaImage, mask_is_png: bool) {
    let (mw, mh) = mask.dimensions();

    for (x, y, px) in image.enumerate_pixels_mut() {
        if x >= mw || y >= mh {
            continue;
        }

        let m = mask.get_pixel(x, y);
        px[3] = if mask_is_png {
            m[3]
        } else {
            let luma = (m[0] as u16 + m[1] as u16 + m[2] as u16) / 3;
            255 - luma as u8
        };
    }
}

/// Makes every texel with exactly the RGB of `key` fully transparent.
pub(crate) fn apply_color_key(image: &mut RgbaImage, key: Color) {
    for px in image.pixels_mut() {
        if px[0] == key.r && px[1] == key.g && px[2] == key.b {
            px[3] = 0;
        }
    }
}

/// Top-left and bottom-left texels.
pub(crate) fn corner_colors(image: &RgbaImage) -> (Color, Color) {
    let to_color = |p: &Rgba<u8>| Color::rgba(p[0], p[1], p[2], p[3]);
    let h = image.height();
    (to_color(image.get_pixel(0, 0)), to_color(image.get_pixel(0, h - 1)))
}

/// True when the image has even dimensions and every aligned 2×2 block is one color.
pub(crate) fn is_pixel_doubled(image: &RgbaImage) -> bool {
    let (w, h) = image.dimensions();
    if w < 2 || h < 2 || w % 2 != 0 || h % 2 != 0 {
        return false;
    }

    for y in (0..h).step_by(2) {
        for x in (0..w).step_by(2) {
            let p = image.get_pixel(x, y);
            if image.get_pixel(x + 1, y) != p || image.get_pixel(x, y + 1) != p || image.get_pixel(x + 1, y + 1) != p {
                return false;
            }
        }
    }

    true
}
