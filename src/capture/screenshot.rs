use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::capture::CaptureFrame;
use crate::errors::RenderError;

/// A screenshot being written on a blocking worker.
#[derive(Debug)]
pub struct ScreenshotTask {
    path: PathBuf,
    handle: JoinHandle<Result<()>>,
    runtime: Handle,
}

impl ScreenshotTask {
    /// Hands `frame` to a blocking task that writes it to `path` as PNG.
    pub(crate) fn spawn(runtime: &Handle, path: PathBuf, frame: CaptureFrame) -> Self {
        let target = path.clone();
        let handle = runtime.spawn_blocking(move || {
            let result = save_png(&target, &frame);
            match &result {
                Ok(()) => log::debug!("saved screenshot {} ({}x{})", target.display(), frame.width(), frame.height()),
                Err(e) => {
                    log::warn!("failed to save screenshot: {e:#}");
                    let _ = std::fs::remove_file(&target);
                }
            }
            result
        });

        Self { path, handle, runtime: runtime.clone() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the file is written. Must not be called from async code.
    pub fn wait(self) -> Result<PathBuf, RenderError> {
        let Self { path, handle, runtime } = self;
        runtime
            .block_on(handle)
            .map_err(|e| RenderError::Capture(format!("screenshot task failed: {e}")))?
            .map_err(|e| RenderError::Capture(format!("{e:#}")))?;
        Ok(path)
    }
}

/// Writes `frame` as an RGBA PNG with the best compression.
pub fn save_png(path: &Path, frame: &CaptureFrame) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    }

    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), frame.width(), frame.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Best);

    let mut writer = encoder.write_header().context("cannot write PNG header")?;
    writer.write_image_data(frame.pixels()).context("cannot write PNG data")?;
    writer.finish().context("cannot finish PNG")?;
    Ok(())
}
