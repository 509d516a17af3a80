//! Draw call values.
//!
//! A [`RenderCall`] describes one draw operation: a rectangle, a circle, a
//! circle with a hole or a textured sprite. Destination coordinates are
//! screen space and already include the viewport shake offset. Calls are
//! small `Copy` values so the queue can store them densely.
//!
//! Sprite calls reference their picture by [`PictureId`]. The reference is
//! non-owning: the picture must stay alive until the queue holding the call
//! is flushed. A call whose picture is gone by then is skipped.

use bitflags::bitflags;

use crate::picture::PictureId;

/// RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, a: 255 }
    }

    /// Creates a color from channel values in the range `0.0 ..= 1.0`.
    ///
    /// Out-of-range values are clamped.
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Color {
        fn ch(v: f32) -> u8 {
            (255.0 * v.clamp(0.0, 1.0)) as u8
        }
        Color { r: ch(r), g: ch(g), b: ch(b), a: ch(a) }
    }

    /// Unpacks a `0xBBGGRR` value.
    pub const fn from_bgr24(rgb: u32) -> Color {
        Color::rgb((rgb & 0xFF) as u8, ((rgb >> 8) & 0xFF) as u8, ((rgb >> 16) & 0xFF) as u8)
    }

    pub fn with_alpha(self, a: u8) -> Color {
        Color { a, ..self }
    }
}

bitflags! {
    /// Which optional parts of a call the backend has to honour.
    pub struct RenderFeatures: u8 {
        const FLIP_X   = 0b0000_0001;
        const FLIP_Y   = 0b0000_0010;
        const COLOR    = 0b0000_0100;
        const SRC_RECT = 0b0000_1000;
        const SCALING  = 0b0001_0000;
        const ROTATION = 0b0010_0000;
        const FILLED   = 0b0100_0000;
    }
}

bitflags! {
    /// Sprite mirroring. Shares its bit values with [`RenderFeatures::FLIP_X`] / [`RenderFeatures::FLIP_Y`].
    pub struct Flip: u8 {
        const NONE       = 0;
        const HORIZONTAL = 0b01;
        const VERTICAL   = 0b10;
    }
}

impl Default for Flip {
    fn default() -> Self {
        Flip::NONE
    }
}

impl From<Flip> for RenderFeatures {
    fn from(flip: Flip) -> Self {
        RenderFeatures::from_bits_truncate(flip.bits())
    }
}

/// Integer rectangle as stored in a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallRect {
    pub x: i16,
    pub y: i16,
    pub w: i16,
    pub h: i16,
}

impl CallRect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x: to_i16(x), y: to_i16(y), w: to_i16(w), h: to_i16(h) }
    }
}

/// Narrow a screen coordinate into the call's 16-bit field, saturating at the edges.
pub(crate) fn to_i16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// The variant-specific part of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Rect,
    /// Centered on `dst.x`/`dst.y`.
    Circle { radius: u16 },
    /// Square of side `2 * radius` around `dst.x`/`dst.y` with a round hole cut out.
    CircleHole { radius: u16 },
    Sprite {
        picture: PictureId,
        src: CallRect,
        /// Fraction of a full turn, see [`encode_angle`].
        angle: u16,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderCall {
    pub kind: CallKind,
    pub features: RenderFeatures,
    pub dst: CallRect,
    pub color: Color,
}

impl RenderCall {
    pub fn rect(dst: CallRect, color: Color, filled: bool) -> Self {
        let features = if filled { RenderFeatures::FILLED } else { RenderFeatures::empty() };
        Self { kind: CallKind::Rect, features, dst, color }
    }

    pub fn picture(&self) -> Option<PictureId> {
        match self.kind {
            CallKind::Sprite { picture, .. } => Some(picture),
            _ => None,
        }
    }

    pub fn flip(&self) -> Flip {
        Flip::from_bits_truncate(self.features.bits())
    }

    /// Rotation in degrees, `0.0` when the call is not rotated.
    pub fn rotation_degrees(&self) -> f64 {
        match self.kind {
            CallKind::Sprite { angle, .. } if self.features.contains(RenderFeatures::ROTATION) => decode_angle(angle),
            _ => 0.0,
        }
    }
}

/// Encodes degrees as an unsigned fraction of a full turn (`0..65536` ≙ `0..360°`).
pub fn encode_angle(degrees: f64) -> u16 {
    (degrees.rem_euclid(360.0) * (65536.0 / 360.0)) as u32 as u16
}

pub fn decode_angle(angle: u16) -> f64 {
    angle as f64 * (360.0 / 65536.0)
}
