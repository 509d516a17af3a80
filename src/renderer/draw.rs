use crate::picture::PictureId;
use crate::render::{encode_angle, CallKind, CallRect, Color, Flip, RenderCall, RenderFeatures};
use crate::renderer::DeferredRenderer;

/// A textured sprite draw, assembled before submission.
///
/// Without a size the sprite is drawn at its source size; without a source
/// rectangle the whole picture is used.
#[derive(Debug, Clone, Copy)]
pub struct Sprite {
    picture: PictureId,
    x: f64,
    y: f64,
    size: Option<(f64, f64)>,
    src: Option<CallRect>,
    flip: Flip,
    angle: f64,
    pivot: Option<(f64, f64)>,
    color: Color,
    depth: i16,
}

impl Sprite {
    pub fn new(picture: PictureId, x: f64, y: f64) -> Self {
        Self {
            picture,
            x,
            y,
            size: None,
            src: None,
            flip: Flip::NONE,
            angle: 0.0,
            pivot: None,
            color: Color::WHITE,
            depth: 0,
        }
    }

    /// Stretches the sprite to `w`×`h`.
    pub fn size(mut self, w: f64, h: f64) -> Self {
        self.size = Some((w, h));
        self
    }

    /// Draws only this part of the picture, in original picture coordinates.
    pub fn src(mut self, x: i32, y: i32, w: i32, h: i32) -> Self {
        self.src = Some(CallRect::new(x, y, w, h));
        self
    }

    pub fn flip(mut self, flip: Flip) -> Self {
        self.flip = flip;
        self
    }

    /// Rotates clockwise about the sprite's center.
    pub fn rotate(mut self, degrees: f64) -> Self {
        self.angle = degrees;
        self.pivot = None;
        self
    }

    /// Rotates clockwise about `(cx, cy)`, relative to the sprite's top-left corner.
    pub fn rotate_around(mut self, degrees: f64, cx: f64, cy: f64) -> Self {
        self.angle = degrees;
        self.pivot = Some((cx, cy));
        self
    }

    /// Modulation color.
    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn depth(mut self, depth: i16) -> Self {
        self.depth = depth;
        self
    }
}

/// Destination shift that turns a rotation about the sprite center into one about `pivot`.
///
/// The vector from the pivot to the center is rotated by `degrees` clockwise
/// (screen coordinates, y down) and the difference to the unrotated vector is
/// returned.
pub(crate) fn pivot_shift(w: f64, h: f64, pivot: (f64, f64), degrees: f64) -> (f64, f64) {
    let ox = w / 2.0 - pivot.0;
    let oy = h / 2.0 - pivot.1;

    let (sin, cos) = degrees.to_radians().sin_cos();
    let rx = ox * cos - oy * sin;
    let ry = ox * sin + oy * cos;

    (rx - ox, ry - oy)
}

fn round(v: f64) -> i32 {
    v.round() as i32
}

impl DeferredRenderer {
    fn shaken(&self, x: i32, y: i32) -> (i32, i32) {
        let (ox, oy) = self.offset.effective();
        (x.saturating_add(ox), y.saturating_add(oy))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render_rect(&mut self, x: i32, y: i32, w: i32, h: i32, depth: i16, color: Color, filled: bool) {
        let (x, y) = self.shaken(x, y);
        self.dispatch(RenderCall::rect(CallRect::new(x, y, w, h), color, filled), depth);
    }

    /// Filled rectangle given by its edges.
    pub fn render_rect_br(&mut self, left: i32, top: i32, right: i32, bottom: i32, depth: i16, color: Color) {
        self.render_rect(left, top, right - left, bottom - top, depth, color, true);
    }

    /// Filled circle around `(cx, cy)`. Nothing is drawn for `radius <= 0`.
    pub fn render_circle(&mut self, cx: i32, cy: i32, radius: i32, depth: i16, color: Color) {
        if let Some(call) = self.circle_call(cx, cy, radius, color, false) {
            self.dispatch(call, depth);
        }
    }

    /// Square around `(cx, cy)` with a circular hole of `radius`. Nothing is drawn for `radius <= 0`.
    pub fn render_circle_hole(&mut self, cx: i32, cy: i32, radius: i32, depth: i16, color: Color) {
        if let Some(call) = self.circle_call(cx, cy, radius, color, true) {
            self.dispatch(call, depth);
        }
    }

    fn circle_call(&self, cx: i32, cy: i32, radius: i32, color: Color, hole: bool) -> Option<RenderCall> {
        if radius <= 0 {
            return None;
        }
        let radius = radius.min(u16::MAX as i32) as u16;
        let kind = if hole { CallKind::CircleHole { radius } } else { CallKind::Circle { radius } };
        let (x, y) = self.shaken(cx, cy);
        let d = radius as i32 * 2;

        Some(RenderCall { kind, features: RenderFeatures::FILLED, dst: CallRect::new(x, y, d, d), color })
    }

    /// Submits a sprite. Unknown pictures and pictures that failed to load are skipped.
    pub fn render_sprite(&mut self, sprite: Sprite) {
        if self.pictures.get(sprite.picture).is_none() {
            log::debug!("sprite references unknown picture {:?}", sprite.picture);
            return;
        }
        let Some(picture) = self.pictures.drawable(sprite.picture) else {
            return;
        };

        let logical = picture.logical_size();
        let (w, h) = sprite.size.unwrap_or_else(|| match sprite.src {
            Some(src) => (src.w as f64, src.h as f64),
            None => (logical.width as f64, logical.height as f64),
        });

        let mut features = RenderFeatures::COLOR | RenderFeatures::from(sprite.flip);
        if sprite.size.is_some() {
            features |= RenderFeatures::SCALING;
        }
        if sprite.src.is_some() {
            features |= RenderFeatures::SRC_RECT;
        }

        let (mut x, mut y) = (sprite.x, sprite.y);
        let mut angle = 0;
        if sprite.angle != 0.0 {
            features |= RenderFeatures::ROTATION;
            angle = encode_angle(sprite.angle);
            if let Some(pivot) = sprite.pivot {
                let (dx, dy) = pivot_shift(w, h, pivot, sprite.angle);
                x += dx;
                y += dy;
            }
        }

        let (x, y) = self.shaken(round(x), round(y));
        let call = RenderCall {
            kind: CallKind::Sprite { picture: sprite.picture, src: sprite.src.unwrap_or_default(), angle },
            features,
            dst: CallRect::new(x, y, round(w), round(h)),
            color: sprite.color,
        };
        self.dispatch(call, sprite.depth);
    }

    /// Whole picture at its own size.
    pub fn render_texture(&mut self, picture: PictureId, x: f64, y: f64, depth: i16, color: Color) {
        self.render_sprite(Sprite::new(picture, x, y).color(color).depth(depth));
    }

    /// A `w`×`h` part of the picture starting at `(src_x, src_y)`, unscaled.
    #[allow(clippy::too_many_arguments)]
    pub fn render_texture_part(
        &mut self,
        picture: PictureId,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        src_x: i32,
        src_y: i32,
        depth: i16,
        color: Color,
    ) {
        let sprite = Sprite::new(picture, x, y).src(src_x, src_y, round(w), round(h)).color(color).depth(depth);
        self.render_sprite(sprite);
    }

    /// Whole picture stretched to `w`×`h`.
    #[allow(clippy::too_many_arguments)]
    pub fn render_texture_scale(&mut self, picture: PictureId, x: f64, y: f64, w: f64, h: f64, depth: i16, color: Color) {
        self.render_sprite(Sprite::new(picture, x, y).size(w, h).color(color).depth(depth));
    }
}
