//! On-screen recording indicator.
//!
//! A pulsing circle in the top-left corner with a short label below it:
//! red "REC" while recording, green "SAVING" while the recording is written
//! out. The label uses a tiny built-in block font so drawing it needs nothing
//! but filled rectangles.

use crate::render::{CallRect, Color};

pub const CENTER: (i32, i32) = (50, 50);
pub const RADIUS: i32 = 20;

pub const RECORDING_LABEL: Label = Label { text: "REC", x: 25, y: 80 };
pub const SAVING_LABEL: Label = Label { text: "SAVING", x: 2, y: 80 };

/// Side of one glyph block in pixels.
const BLOCK: i32 = 2;
const GLYPH_W: i32 = 5;
const GLYPH_H: usize = 7;

pub struct Label {
    pub text: &'static str,
    pub x: i32,
    pub y: i32,
}

pub fn recording_color(alpha: f32) -> Color {
    Color::from_f32(1.0, 0.0, 0.0, alpha)
}

pub fn saving_color(alpha: f32) -> Color {
    Color::from_f32(0.0, 0.6, 0.0, alpha)
}

/// Alpha that swings between 0.5 and 1.0 in steps of 0.01.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    value: f32,
    forward: bool,
}

impl Default for Fade {
    fn default() -> Self {
        Self { value: 0.5, forward: true }
    }
}

impl Fade {
    /// Advances one tick and returns the new alpha.
    pub fn step(&mut self) -> f32 {
        if self.forward {
            self.value += 0.01;
            if self.value >= 1.0 {
                self.value = 1.0;
                self.forward = false;
            }
        } else {
            self.value -= 0.01;
            if self.value < 0.5 {
                self.value = 0.5;
                self.forward = true;
            }
        }
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

/// Rows of a 5×7 glyph, most significant of the low five bits on the left.
fn glyph(c: char) -> Option<[u8; GLYPH_H]> {
    let rows = match c.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        _ => return None,
    };
    Some(rows)
}

/// Filled rectangles spelling `label`. Runs of set bits in a glyph row become one rectangle.
pub fn label_rects(label: &Label) -> Vec<CallRect> {
    let mut rects = Vec::new();
    let mut pen_x = label.x;

    for c in label.text.chars() {
        if let Some(rows) = glyph(c) {
            for (row, bits) in rows.iter().enumerate() {
                let y = label.y + row as i32 * BLOCK;
                let mut col = 0;
                while col < GLYPH_W {
                    if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                        col += 1;
                        continue;
                    }
                    let start = col;
                    while col < GLYPH_W && bits & (1 << (GLYPH_W - 1 - col)) != 0 {
                        col += 1;
                    }
                    rects.push(CallRect::new(pen_x + start * BLOCK, y, (col - start) * BLOCK, BLOCK));
                }
            }
        }
        pen_x += (GLYPH_W + 1) * BLOCK;
    }

    rects
}
