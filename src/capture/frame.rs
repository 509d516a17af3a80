use crate::errors::RenderError;

/// RGBA8 pixels read back from a render target, rows top to bottom.
#[derive(Clone, PartialEq, Eq)]
pub struct CaptureFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl std::fmt::Debug for CaptureFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CaptureFrame {{ {}x{} }}", self.width, self.height)
    }
}

impl CaptureFrame {
    /// Allocates a zeroed frame, reporting allocation failure instead of aborting.
    pub fn try_new(width: u32, height: u32) -> Result<Self, RenderError> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| RenderError::Capture(format!("frame of {width}x{height} is too large")))?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|e| RenderError::Capture(format!("cannot allocate a {width}x{height} frame: {e}")))?;
        pixels.resize(len, 0);

        Ok(Self { width, height, pixels })
    }

    /// Wraps existing pixels. Returns `None` when the buffer does not match the size.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }
}
