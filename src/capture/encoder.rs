use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::capture::CaptureFrame;

/// Sink for recorded frames. Runs on the recording worker thread.
pub trait FrameEncoder: Send {
    fn write_frame(&mut self, frame: &CaptureFrame) -> Result<()>;

    /// Writes the trailer and closes the output.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Color quantizer speed, 1 (best) to 30 (fastest).
const QUANTIZE_SPEED: i32 = 10;

/// Animated GIF writer. Every frame is shown for the same delay and the animation loops forever.
pub struct GifFrameEncoder {
    encoder: gif::Encoder<BufWriter<File>>,
    width: u16,
    height: u16,
    delay_cs: u16,
}

impl GifFrameEncoder {
    /// Creates `path` and writes the header for a `width`×`height` animation.
    pub fn create(path: &Path, width: u32, height: u32, delay_cs: u16) -> Result<Self> {
        let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
            bail!("{width}x{height} is too large for a GIF");
        };

        let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
        let mut encoder = gif::Encoder::new(BufWriter::new(file), w, h, &[])?;
        encoder.set_repeat(gif::Repeat::Infinite)?;

        Ok(Self { encoder, width: w, height: h, delay_cs })
    }
}

impl FrameEncoder for GifFrameEncoder {
    fn write_frame(&mut self, frame: &CaptureFrame) -> Result<()> {
        if frame.width() != self.width as u32 || frame.height() != self.height as u32 {
            bail!("{}x{} frame in a {}x{} recording", frame.width(), frame.height(), self.width, self.height);
        }

        let mut pixels = frame.pixels().to_vec();
        let mut gif_frame = gif::Frame::from_rgba_speed(self.width, self.height, &mut pixels, QUANTIZE_SPEED);
        gif_frame.delay = self.delay_cs;

        self.encoder.write_frame(&gif_frame)?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let writer = self.encoder.into_inner().context("cannot write GIF trailer")?;
        writer.into_inner().map_err(|e| e.into_error()).context("cannot flush GIF")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::BufReader;

    use image::codecs::gif::GifDecoder;
    use image::AnimationDecoder;

    use super::*;

    #[test]
    fn writes_a_looping_animation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.gif");

        let mut encoder: Box<dyn FrameEncoder> = Box::new(GifFrameEncoder::create(&path, 4, 4, 4).unwrap());
        for shade in [0u8, 128, 255] {
            let frame = CaptureFrame::from_raw(4, 4, vec![shade; 64]).unwrap();
            encoder.write_frame(&frame).unwrap();
        }
        encoder.finish().unwrap();

        let decoder = GifDecoder::new(BufReader::new(File::open(&path).unwrap())).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].delay().numer_denom_ms(), (40, 1));
        assert_eq!(frames[0].buffer().dimensions(), (4, 4));

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.last(), Some(&0x3B));
    }

    #[test]
    fn rejects_mismatched_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut encoder = GifFrameEncoder::create(&dir.path().join("rec.gif"), 4, 4, 4).unwrap();
        let frame = CaptureFrame::from_raw(2, 2, vec![0; 16]).unwrap();
        assert!(encoder.write_frame(&frame).is_err());

        assert!(GifFrameEncoder::create(&dir.path().join("big.gif"), 70_000, 4, 4).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn finish_reports_a_full_disk() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }

        // header and one small frame still fit in the write buffer
        let mut encoder: Box<dyn FrameEncoder> = Box::new(GifFrameEncoder::create(full, 4, 4, 4).unwrap());
        let frame = CaptureFrame::from_raw(4, 4, vec![200; 64]).unwrap();
        encoder.write_frame(&frame).unwrap();

        assert!(encoder.finish().is_err());
    }
}
