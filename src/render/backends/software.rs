use std::collections::HashMap;

use anyhow::{anyhow, bail, Result};

use crate::capture::CaptureFrame;
use crate::picture::Picture;
use crate::render::backend::{RenderBackend, RenderTarget, SurfaceSize, TextureHandle};
use crate::render::{letterbox, CallKind, CallRect, Color, Flip, RenderCall, RenderFeatures, Viewport};

/// Texture limit reported when none is configured.
pub const DEFAULT_MAX_TEXTURE_SIZE: u32 = 4096;

/// RGBA8 pixel buffer, rows top to bottom.
#[derive(Debug, Clone)]
struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(size: SurfaceSize) -> Self {
        let mut canvas = Self { width: size.width, height: size.height, pixels: vec![0; size.width as usize * size.height as usize * 4] };
        canvas.fill(Color::BLACK);
        canvas
    }

    fn fill(&mut self, c: Color) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    fn get(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let o = self.offset(x, y)?;
        Some([self.pixels[o], self.pixels[o + 1], self.pixels[o + 2], self.pixels[o + 3]])
    }
}

struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let o = (y as usize * self.width as usize + x as usize) * 4;
        [self.pixels[o], self.pixels[o + 1], self.pixels[o + 2], self.pixels[o + 3]]
    }
}

/// Draws into one canvas, honouring the clip viewport.
///
/// Coordinates are relative to the viewport's top-left corner while a
/// viewport is set.
struct Painter<'a> {
    canvas: &'a mut Canvas,
    clip: Option<Viewport>,
}

impl Painter<'_> {
    fn blend(&mut self, x: i32, y: i32, c: [u8; 4]) {
        let (x, y) = match self.clip {
            Some(clip) => {
                let (ax, ay) = (x + clip.x, y + clip.y);
                if !clip.contains(ax, ay) {
                    return;
                }
                (ax, ay)
            }
            None => (x, y),
        };

        let Some(o) = self.canvas.offset(x, y) else {
            return;
        };

        let dst = &mut self.canvas.pixels[o..o + 4];
        let a = c[3] as u32;
        if a == 255 {
            dst.copy_from_slice(&c);
            return;
        }
        if a == 0 {
            return;
        }

        let inv = 255 - a;
        for i in 0..3 {
            dst[i] = ((c[i] as u32 * a + dst[i] as u32 * inv + 127) / 255) as u8;
        }
        dst[3] = (a + (dst[3] as u32 * inv + 127) / 255) as u8;
    }

    /// Horizontal line with both ends included.
    fn hline(&mut self, x0: i32, x1: i32, y: i32, c: [u8; 4]) {
        for x in x0.min(x1)..=x0.max(x1) {
            self.blend(x, y, c);
        }
    }

    fn fill_rect(&mut self, r: CallRect, c: [u8; 4]) {
        for y in r.y as i32..r.y as i32 + r.h as i32 {
            for x in r.x as i32..r.x as i32 + r.w as i32 {
                self.blend(x, y, c);
            }
        }
    }

    fn outline_rect(&mut self, r: CallRect, c: [u8; 4]) {
        if r.w <= 0 || r.h <= 0 {
            return;
        }
        let (x0, y0) = (r.x as i32, r.y as i32);
        let (x1, y1) = (x0 + r.w as i32 - 1, y0 + r.h as i32 - 1);
        self.hline(x0, x1, y0, c);
        if y1 != y0 {
            self.hline(x0, x1, y1, c);
        }
        for y in y0 + 1..y1 {
            self.blend(x0, y, c);
            if x1 != x0 {
                self.blend(x1, y, c);
            }
        }
    }

    fn circle(&mut self, cx: i32, cy: i32, r: i32, c: [u8; 4]) {
        for dy in 1..=r {
            let dx = ((2.0 * r as f64 * dy as f64) - (dy * dy) as f64).sqrt() as i32;
            self.hline(cx - dx, cx + dx, cy + dy - r, c);
            // the last row is the center line, drawn once
            if dy < r {
                self.hline(cx - dx, cx + dx, cy - dy + r, c);
            }
        }
    }

    fn circle_hole(&mut self, cx: i32, cy: i32, r: i32, c: [u8; 4]) {
        for dy in 1..=r {
            let dx = ((2.0 * r as f64 * dy as f64) - (dy * dy) as f64).sqrt() as i32;
            self.hline(cx - r, cx - dx, cy + dy - r, c);
            self.hline(cx + dx, cx + r, cy + dy - r, c);
            if dy < r {
                self.hline(cx - r, cx - dx, cy - dy + r, c);
                self.hline(cx + dx, cx + r, cy - dy + r, c);
            }
        }
    }

    /// Maps `src` of `tex` onto `dst`, rotated by `angle` degrees clockwise around the `dst` center.
    fn sprite(&mut self, tex: &Texture, src: CallRect, dst: CallRect, angle: f64, flip_x: bool, flip_y: bool, tint: Color) {
        let (dw, dh) = (dst.w as f64, dst.h as f64);
        if dst.w <= 0 || dst.h <= 0 || src.w <= 0 || src.h <= 0 {
            return;
        }

        let (cx, cy) = (dst.x as f64 + dw / 2.0, dst.y as f64 + dh / 2.0);
        let (sin, cos) = angle.to_radians().sin_cos();

        // bounding box of the rotated destination rectangle
        let (hw, hh) = (dw / 2.0, dh / 2.0);
        let ex = (hw * cos).abs() + (hh * sin).abs();
        let ey = (hw * sin).abs() + (hh * cos).abs();
        let (bx0, bx1) = ((cx - ex).floor() as i32, (cx + ex).ceil() as i32);
        let (by0, by1) = ((cy - ey).floor() as i32, (cy + ey).ceil() as i32);

        for y in by0..by1 {
            for x in bx0..bx1 {
                let (px, py) = (x as f64 + 0.5 - cx, y as f64 + 0.5 - cy);
                let lx = px * cos + py * sin + hw;
                let ly = -px * sin + py * cos + hh;
                if lx < 0.0 || ly < 0.0 || lx >= dw || ly >= dh {
                    continue;
                }

                let mut fx = lx / dw;
                let mut fy = ly / dh;
                if flip_x {
                    fx = 1.0 - fx;
                }
                if flip_y {
                    fy = 1.0 - fy;
                }

                let tx = src.x as i32 + ((fx * src.w as f64) as i32).min(src.w as i32 - 1);
                let ty = src.y as i32 + ((fy * src.h as f64) as i32).min(src.h as i32 - 1);
                if tx < 0 || ty < 0 || tx as u32 >= tex.width || ty as u32 >= tex.height {
                    continue;
                }

                let t = tex.texel(tx as u32, ty as u32);
                let m = |v: u8, k: u8| ((v as u32 * k as u32 + 127) / 255) as u8;
                self.blend(x, y, [m(t[0], tint.r), m(t[1], tint.g), m(t[2], tint.b), m(t[3], tint.a)]);
            }
        }
    }
}

/// CPU reference backend.
///
/// Keeps a game-resolution virtual buffer and a window buffer. Present
/// letterboxes the virtual buffer into the window, keeping its aspect ratio.
pub struct SoftwareBackend {
    screen: SurfaceSize,
    virtual_buf: Canvas,
    window_buf: Canvas,
    target: RenderTarget,
    clip: Option<Viewport>,
    textures: HashMap<TextureHandle, Texture>,
    next_handle: u64,
    max_texture_size: SurfaceSize,
    frames_presented: u64,
}

impl SoftwareBackend {
    pub fn new(screen: SurfaceSize, window: SurfaceSize) -> Self {
        Self {
            screen,
            virtual_buf: Canvas::new(screen),
            window_buf: Canvas::new(window),
            target: RenderTarget::Virtual,
            clip: None,
            textures: HashMap::new(),
            next_handle: 1,
            max_texture_size: SurfaceSize::new(DEFAULT_MAX_TEXTURE_SIZE, DEFAULT_MAX_TEXTURE_SIZE),
            frames_presented: 0,
        }
    }

    pub fn with_max_texture_size(mut self, size: SurfaceSize) -> Self {
        self.max_texture_size = size;
        self
    }

    /// Pixel of the virtual buffer.
    pub fn virtual_pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        self.virtual_buf.get(x, y)
    }

    /// Pixel of the window buffer, as of the last present.
    pub fn window_pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        self.window_buf.get(x, y)
    }

    pub fn window_pixels(&self) -> &[u8] {
        &self.window_buf.pixels
    }

    pub fn window_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.window_buf.width, self.window_buf.height)
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Where the virtual buffer lands inside the window: `(x, y, width, height)`.
    pub fn letterbox(&self) -> Viewport {
        letterbox(self.screen, self.window_size())
    }

    fn target_canvas(&self) -> &Canvas {
        match self.target {
            RenderTarget::Virtual => &self.virtual_buf,
            RenderTarget::Screen => &self.window_buf,
        }
    }
}

impl RenderBackend for SoftwareBackend {
    fn name(&self) -> &str {
        "SoftwareBackend"
    }

    fn materialize_texture(&mut self, pixels: &[u8], width: u32, height: u32, pitch: u32) -> Result<TextureHandle> {
        let limit = self.max_texture_size;
        if (limit.width > 0 && width > limit.width) || (limit.height > 0 && height > limit.height) {
            bail!("texture {width}x{height} exceeds the {}x{} limit", limit.width, limit.height);
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
        self.textures.insert(handle, Texture { width, height, pixels: texels });
        Ok(handle)
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle);
    }

    fn clear_all_textures(&mut self) {
        self.textures.clear();
    }

    fn execute_call(&mut self, call: &RenderCall, _depth: i16, picture: Option<&Picture>) {
        let canvas = match self.target {
            RenderTarget::Virtual => &mut self.virtual_buf,
            RenderTarget::Screen => &mut self.window_buf,
        };
        let mut painter = Painter { canvas, clip: self.clip };

        let c = call.color;
        let rgba = [c.r, c.g, c.b, c.a];
        let (x, y) = (call.dst.x as i32, call.dst.y as i32);

        match call.kind {
            CallKind::Rect => {
                if call.features.contains(RenderFeatures::FILLED) {
                    painter.fill_rect(call.dst, rgba);
                } else {
                    painter.outline_rect(call.dst, rgba);
                }
            }
            CallKind::Circle { radius } => painter.circle(x, y, radius as i32, rgba),
            CallKind::CircleHole { radius } => painter.circle_hole(x, y, radius as i32, rgba),
            CallKind::Sprite { src, .. } => {
                let Some(pic) = picture else {
                    return;
                };
                let Some(tex) = pic.texture().and_then(|h| self.textures.get(&h)) else {
                    return;
                };

                let logical = pic.logical_size();
                let (lw, lh) = (logical.width as i32, logical.height as i32);
                let f = call.features;

                let mut src_rect = CallRect::new(0, 0, lw, lh);
                if f.contains(RenderFeatures::SRC_RECT) {
                    let (sx, sy) = (src.x as i32, src.y as i32);
                    let (mut sw, mut sh) = (src.w as i32, src.h as i32);
                    if sx + sw > lw {
                        if sx > lw {
                            return;
                        }
                        sw = lw - sx;
                    }
                    if sy + sh > lh {
                        if sy > lh {
                            return;
                        }
                        sh = lh - sy;
                    }
                    src_rect = CallRect::new(sx, sy, sw, sh);
                }

                let (dw, dh) = if f.contains(RenderFeatures::SCALING) {
                    (call.dst.w as i32, call.dst.h as i32)
                } else {
                    (src_rect.w as i32, src_rect.h as i32)
                };
                let dst = CallRect::new(x, y, dw, dh);

                let texel_src = if f.contains(RenderFeatures::SRC_RECT) {
                    pic.scale_source_rect(src_rect)
                } else {
                    CallRect::new(0, 0, tex.width as i32, tex.height as i32)
                };

                let tint = if f.contains(RenderFeatures::COLOR) { c } else { Color::WHITE };
                let flip = call.flip();
                painter.sprite(
                    tex,
                    texel_src,
                    dst,
                    call.rotation_degrees(),
                    flip.contains(Flip::HORIZONTAL),
                    flip.contains(Flip::VERTICAL),
                    tint,
                );
            }
        }
    }

    fn apply_viewport(&mut self, clip: Option<Viewport>) {
        self.clip = clip;
    }

    fn update_window(&mut self, window: SurfaceSize) {
        if window.width == 0 || window.height == 0 {
            return;
        }
        self.window_buf = Canvas::new(window);
    }

    fn set_render_target(&mut self, target: RenderTarget) {
        self.target = target;
        // a new target starts without a viewport
        self.clip = None;
    }

    fn clear_buffer(&mut self) {
        match self.target {
            RenderTarget::Virtual => self.virtual_buf.fill(Color::BLACK),
            RenderTarget::Screen => self.window_buf.fill(Color::BLACK),
        }
    }

    fn present(&mut self) {
        let dst = letterbox(self.screen, self.window_size());
        self.window_buf.fill(Color::BLACK);

        if dst.width > 0 && dst.height > 0 {
            let (sw, sh) = (self.virtual_buf.width as u64, self.virtual_buf.height as u64);
            for y in 0..dst.height {
                let sy = (y as u64 * sh / dst.height as u64) as i32;
                for x in 0..dst.width {
                    let sx = (x as u64 * sw / dst.width as u64) as i32;
                    if let (Some(px), Some(o)) = (self.virtual_buf.get(sx, sy), self.window_buf.offset(dst.x + x as i32, dst.y + y as i32)) {
                        self.window_buf.pixels[o..o + 4].copy_from_slice(&px);
                    }
                }
            }
        }

        self.frames_presented += 1;
    }

    fn read_texture(&self, handle: TextureHandle) -> Result<Vec<u8>> {
        let tex = self.textures.get(&handle).ok_or_else(|| anyhow!("unknown texture {handle:?}"))?;
        Ok(tex.pixels.clone())
    }

    fn read_pixels(&mut self, rect: Viewport, frame: &mut CaptureFrame) -> Result<()> {
        if frame.width() != rect.width || frame.height() != rect.height {
            bail!("capture frame is {}x{}, read-back rect is {}x{}", frame.width(), frame.height(), rect.width, rect.height);
        }

        let canvas = self.target_canvas();
        let width = rect.width;
        for (i, px) in frame.pixels_mut().chunks_exact_mut(4).enumerate() {
            let x = rect.x + (i as u32 % width) as i32;
            let y = rect.y + (i as u32 / width) as i32;
            px.copy_from_slice(&canvas.get(x, y).unwrap_or([0, 0, 0, 0]));
        }

        Ok(())
    }

    fn max_texture_size(&self) -> SurfaceSize {
        self.max_texture_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::encode_angle;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn backend(w: u32, h: u32) -> SoftwareBackend {
        SoftwareBackend::new(SurfaceSize::new(w, h), SurfaceSize::new(w, h))
    }

    fn rect(x: i32, y: i32, w: i32, h: i32, filled: bool) -> RenderCall {
        RenderCall::rect(CallRect::new(x, y, w, h), Color::rgb(255, 0, 0), filled)
    }

    #[test]
    fn filled_and_outlined_rects() {
        let mut b = backend(8, 8);
        b.execute_call(&rect(1, 1, 3, 3, true), 0, None);
        assert_eq!(b.virtual_pixel(2, 2), Some(RED));
        assert_eq!(b.virtual_pixel(4, 4), Some(BLACK));

        let mut b = backend(8, 8);
        b.execute_call(&rect(1, 1, 4, 4, false), 0, None);
        assert_eq!(b.virtual_pixel(1, 1), Some(RED));
        assert_eq!(b.virtual_pixel(4, 4), Some(RED));
        assert_eq!(b.virtual_pixel(2, 2), Some(BLACK));
    }

    #[test]
    fn alpha_blends_over_the_target() {
        let mut b = backend(2, 2);
        let call = RenderCall::rect(CallRect::new(0, 0, 2, 2), Color::rgba(255, 255, 255, 128), true);
        b.execute_call(&call, 0, None);
        assert_eq!(b.virtual_pixel(0, 0), Some([128, 128, 128, 255]));
    }

    #[test]
    fn circle_is_symmetric() {
        let mut b = backend(32, 32);
        let call = RenderCall { kind: CallKind::Circle { radius: 5 }, ..rect(16, 16, 0, 0, true) };
        b.execute_call(&call, 0, None);

        assert_eq!(b.virtual_pixel(16, 16), Some(RED));
        assert_eq!(b.virtual_pixel(11, 16), Some(RED));
        assert_eq!(b.virtual_pixel(21, 16), Some(RED));
        assert_eq!(b.virtual_pixel(16, 20), Some(RED));
        assert_eq!(b.virtual_pixel(16, 12), Some(RED));
        assert_eq!(b.virtual_pixel(11, 11), Some(BLACK));
        assert_eq!(b.virtual_pixel(22, 16), Some(BLACK));
    }

    #[test]
    fn circle_hole_keeps_the_middle_empty() {
        let mut b = backend(32, 32);
        let call = RenderCall { kind: CallKind::CircleHole { radius: 5 }, ..rect(16, 16, 0, 0, true) };
        b.execute_call(&call, 0, None);

        assert_eq!(b.virtual_pixel(11, 12), Some(RED));
        assert_eq!(b.virtual_pixel(18, 16), Some(BLACK));
    }

    #[test]
    fn viewport_clips_and_moves_the_origin() {
        let mut b = backend(16, 16);
        b.apply_viewport(Some(Viewport::new(4, 4, 4, 4)));
        b.execute_call(&rect(0, 0, 16, 16, true), 0, None);

        assert_eq!(b.virtual_pixel(4, 4), Some(RED));
        assert_eq!(b.virtual_pixel(7, 7), Some(RED));
        assert_eq!(b.virtual_pixel(3, 3), Some(BLACK));
        assert_eq!(b.virtual_pixel(8, 8), Some(BLACK));
    }

    fn two_texel_picture(b: &mut SoftwareBackend) -> Picture {
        // red | blue
        let handle = b.materialize_texture(&[255, 0, 0, 255, 0, 0, 255, 255], 2, 1, 8).unwrap();
        let mut pic = Picture::new(None);
        pic.width = 2;
        pic.height = 1;
        pic.texture = Some(handle);
        pic.inited = true;
        pic
    }

    fn sprite_call(pic: &Picture, features: RenderFeatures, angle: u16) -> RenderCall {
        RenderCall {
            kind: CallKind::Sprite { picture: pic.id(), src: CallRect::new(0, 0, 2, 1), angle },
            features,
            dst: CallRect::new(0, 0, 2, 1),
            color: Color::WHITE,
        }
    }

    #[test]
    fn sprites_flip_and_modulate() {
        let mut b = backend(4, 4);
        let pic = two_texel_picture(&mut b);

        b.execute_call(&sprite_call(&pic, RenderFeatures::empty(), 0), 0, Some(&pic));
        assert_eq!(b.virtual_pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(b.virtual_pixel(1, 0), Some([0, 0, 255, 255]));

        let flipped = sprite_call(&pic, RenderFeatures::from(Flip::HORIZONTAL), 0);
        b.execute_call(&flipped, 0, Some(&pic));
        assert_eq!(b.virtual_pixel(0, 0), Some([0, 0, 255, 255]));

        let mut tinted = sprite_call(&pic, RenderFeatures::COLOR, 0);
        tinted.color = Color::rgb(0, 0, 0);
        b.execute_call(&tinted, 0, Some(&pic));
        assert_eq!(b.virtual_pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn half_turn_mirrors_both_axes() {
        let mut b = backend(4, 4);
        let pic = two_texel_picture(&mut b);

        b.execute_call(&sprite_call(&pic, RenderFeatures::ROTATION, encode_angle(180.0)), 0, Some(&pic));
        assert_eq!(b.virtual_pixel(0, 0), Some([0, 0, 255, 255]));
        assert_eq!(b.virtual_pixel(1, 0), Some([255, 0, 0, 255]));
    }

    #[test]
    fn source_rect_past_the_edge_is_skipped() {
        let mut b = backend(4, 4);
        let pic = two_texel_picture(&mut b);
        let mut call = sprite_call(&pic, RenderFeatures::SRC_RECT, 0);
        if let CallKind::Sprite { ref mut src, .. } = call.kind {
            *src = CallRect::new(3, 0, 1, 1);
        }
        b.execute_call(&call, 0, Some(&pic));
        assert_eq!(b.virtual_pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn present_letterboxes() {
        let mut b = SoftwareBackend::new(SurfaceSize::new(4, 2), SurfaceSize::new(8, 8));
        assert_eq!(b.letterbox(), Viewport::new(0, 2, 8, 4));

        b.execute_call(&rect(0, 0, 4, 2, true), 0, None);
        b.present();
        assert_eq!(b.window_pixel(0, 0), Some(BLACK));
        assert_eq!(b.window_pixel(0, 2), Some(RED));
        assert_eq!(b.window_pixel(7, 5), Some(RED));
        assert_eq!(b.window_pixel(7, 6), Some(BLACK));
        assert_eq!(b.frames_presented(), 1);
    }

    #[test]
    fn texture_limit_is_enforced() {
        let mut b = backend(4, 4).with_max_texture_size(SurfaceSize::new(2, 2));
        assert!(b.materialize_texture(&[0; 36], 3, 3, 12).is_err());
        assert!(b.materialize_texture(&[0; 16], 2, 2, 8).is_ok());
    }

    #[test]
    fn read_back_covers_the_target() {
        let mut b = backend(4, 4);
        b.execute_call(&rect(1, 1, 1, 1, true), 0, None);

        let mut frame = CaptureFrame::try_new(2, 2).unwrap();
        b.read_pixels(Viewport::new(0, 0, 2, 2), &mut frame).unwrap();
        assert_eq!(&frame.pixels()[12..16], &RED);

        let mut wrong = CaptureFrame::try_new(1, 1).unwrap();
        assert!(b.read_pixels(Viewport::new(0, 0, 2, 2), &mut wrong).is_err());
    }
}
