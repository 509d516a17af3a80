//! Viewport and screen-shake state.
//!
//! A [`Viewport`] is a clip rectangle in logical screen pixels: its top-left
//! corner `(x, y)` and its `width`/`height`. `(0, 0)` is the top-left of the
//! game screen. The same type describes read-back rectangles for captures.
//!
//! [`ViewportOffset`] holds the camera-shake translation added to every
//! submitted destination coordinate. It keeps two values: the *carried*
//! offset last requested by the game, and the *effective* offset actually
//! applied. While the ignore flag is on the effective offset is zero, but the
//! carried value survives, so shaking resumes once ignore is cleared.
//!
//! # Examples
//!
//! ```
//! use deferred_render::render::ViewportOffset;
//!
//! let mut shake = ViewportOffset::default();
//! shake.set(5, 5);
//! shake.set_ignore(true);
//! assert_eq!(shake.effective(), (0, 0));
//! shake.set_ignore(false);
//! assert_eq!(shake.effective(), (5, 5));
//! ```

use crate::render::backend::SurfaceSize;

/// Represents a rectangle on the logical screen.
#[derive(Clone, Eq, PartialEq, Copy, Default)]
pub struct Viewport {
    /// Horizontal offset in pixels from the origin.
    pub x: i32,

    /// Vertical offset in pixels from the origin.
    pub y: i32,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,
}

impl std::fmt::Debug for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Viewport {{ x: {}, y: {}, width: {}, height: {} }}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl Viewport {
    /// Creates a new [`Viewport`] with the given position and size.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Creates a viewport from signed sizes, clamping negative sizes to zero.
    pub fn from_signed(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, width: w.max(0) as u32, height: h.max(0) as u32 }
    }

    /// Returns `true` if `(px, py)` lies inside the rectangle.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && py >= self.y
            && (px as i64) < self.x as i64 + self.width as i64
            && (py as i64) < self.y as i64 + self.height as i64
    }
}

/// Largest rectangle with the aspect ratio of `screen` centered in `window`.
pub fn letterbox(screen: SurfaceSize, window: SurfaceSize) -> Viewport {
    let (w, h) = (window.width as f32, window.height as f32);
    let scale_x = w / screen.width as f32;
    let scale_y = h / screen.height as f32;

    let (mut dst_w, mut dst_h) = (window.width as i32, window.height as i32);
    if scale_x > scale_y {
        dst_w = (scale_y * screen.width as f32) as i32;
        dst_h = (scale_y * screen.height as f32) as i32;
    } else if scale_x < scale_y {
        dst_w = (scale_x * screen.width as f32) as i32;
        dst_h = (scale_x * screen.height as f32) as i32;
    }

    Viewport::from_signed((window.width as i32 - dst_w) / 2, (window.height as i32 - dst_h) / 2, dst_w, dst_h)
}

/// Screen-shake offset with a temporary "ignore" switch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewportOffset {
    /// Offset applied to submitted coordinates.
    effective: (i32, i32),
    /// Last offset requested, kept while ignoring.
    carried: (i32, i32),
    ignore: bool,
}

impl ViewportOffset {
    /// Sets the shake offset. While ignoring, the value is only parked.
    ///
    /// A value equal to the effective offset is dropped, so setting `(0, 0)`
    /// while ignoring keeps the parked offset.
    pub fn set(&mut self, x: i32, y: i32) {
        if self.effective == (x, y) {
            return;
        }
        self.carried = (x, y);
        self.effective = if self.ignore { (0, 0) } else { self.carried };
    }

    /// Turns ignoring on or off, recomputing the effective offset from the carried one.
    pub fn set_ignore(&mut self, ignore: bool) {
        self.ignore = ignore;
        self.effective = if ignore { (0, 0) } else { self.carried };
    }

    pub fn effective(&self) -> (i32, i32) {
        self.effective
    }

    pub fn carried(&self) -> (i32, i32) {
        self.carried
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    /// Drops the offset and the ignore flag.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_parks_the_offset() {
        let mut shake = ViewportOffset::default();
        shake.set(5, 5);
        assert_eq!(shake.effective(), (5, 5));

        shake.set_ignore(true);
        assert_eq!(shake.effective(), (0, 0));
        assert_eq!(shake.carried(), (5, 5));

        shake.set_ignore(false);
        assert_eq!(shake.effective(), (5, 5));
    }

    #[test]
    fn setting_while_ignored_only_updates_the_carried_value() {
        let mut shake = ViewportOffset::default();
        shake.set_ignore(true);
        shake.set(3, -2);
        assert_eq!(shake.effective(), (0, 0));

        assert_eq!(shake.carried(), (3, -2));

        shake.set_ignore(false);
        assert_eq!(shake.effective(), (3, -2));
    }

    #[test]
    fn zero_while_ignored_keeps_the_parked_offset() {
        let mut shake = ViewportOffset::default();
        shake.set(5, 5);
        shake.set_ignore(true);

        // matches the effective offset, so nothing changes
        shake.set(0, 0);
        assert_eq!(shake.carried(), (5, 5));

        shake.set_ignore(false);
        assert_eq!(shake.effective(), (5, 5));

        shake.set(0, 0);
        assert_eq!(shake.effective(), (0, 0));
    }

    #[test]
    fn toggling_ignore_twice_is_harmless() {
        let mut shake = ViewportOffset::default();
        shake.set(4, 1);
        shake.set_ignore(true);
        shake.set_ignore(true);
        shake.set_ignore(false);
        shake.set_ignore(false);
        assert_eq!(shake.effective(), (4, 1));
    }

    #[test]
    fn letterbox_centers_the_screen() {
        assert_eq!(letterbox(SurfaceSize::new(4, 2), SurfaceSize::new(8, 8)), Viewport::new(0, 2, 8, 4));
        assert_eq!(letterbox(SurfaceSize::new(4, 4), SurfaceSize::new(10, 6)), Viewport::new(2, 0, 6, 6));
        assert_eq!(letterbox(SurfaceSize::new(4, 2), SurfaceSize::new(8, 4)), Viewport::new(0, 0, 8, 4));
    }

    #[test]
    fn viewport_contains() {
        let vp = Viewport::new(10, 10, 5, 5);
        assert!(vp.contains(10, 10));
        assert!(vp.contains(14, 14));
        assert!(!vp.contains(15, 10));
        assert!(!vp.contains(9, 12));
        assert_eq!(Viewport::from_signed(0, 0, -3, 4).width, 0);
    }
}
