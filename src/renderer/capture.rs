use std::path::PathBuf;

use crate::capture::indicator::{self, Label};
use crate::capture::{CaptureFrame, FrameEncoder, GifFrameEncoder, RecorderState, ScreenshotTask};
use crate::render::backend::RenderTarget;
use crate::render::{depth, Viewport};
use crate::renderer::DeferredRenderer;

impl DeferredRenderer {
    /// Saves the current frame as `Scr_<timestamp>.png` in the screenshots directory.
    ///
    /// Pixels are read back right away; encoding runs in the background. Returns
    /// `None` when the frame could not be captured.
    pub fn make_shot(&mut self) -> Option<ScreenshotTask> {
        let frame = self.grab_frame()?;
        let path = self.namer.next_path(&self.config.capture.screenshots_dir, "png");
        log::debug!("screenshot to {}", path.display());

        Some(ScreenshotTask::spawn(self.runtime.handle(), path, frame))
    }

    /// Starts a GIF recording, or stops the running one.
    ///
    /// While the previous recording is still being saved, this only logs.
    pub fn toggle_gif_recorder(&mut self) {
        if self.recorder.poll() != RecorderState::Idle {
            self.recorder.request_finish();
            return;
        }

        let dir = self.config.capture.recordings_dir.clone();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            log::error!("cannot create recordings directory {}: {e}", dir.display());
            return;
        }

        let path = self.namer.next_path(&dir, "gif");
        let screen = self.config.screen;
        match GifFrameEncoder::create(&path, screen.width, screen.height, self.config.capture.gif_delay_cs) {
            Ok(encoder) => self.start_recording(Box::new(encoder), path),
            Err(e) => log::error!("cannot start recording: {e:#}"),
        }
    }

    /// Starts recording into `encoder`. `path` is only reported back through [`recording_path`](Self::recording_path).
    pub fn start_recording(&mut self, encoder: Box<dyn FrameEncoder>, path: PathBuf) {
        if self.recorder.poll() != RecorderState::Idle {
            log::warn!("a recording is already running");
            return;
        }
        self.recorder.start(self.runtime.handle(), encoder, path);
    }

    pub fn recorder_state(&mut self) -> RecorderState {
        self.recorder.poll()
    }

    pub fn recording_path(&self) -> Option<&std::path::Path> {
        self.recorder.path()
    }

    /// Runs once per repaint: captures a frame when one is due and draws the indicator.
    pub(super) fn process_recorder(&mut self) {
        let state = self.recorder.poll();
        if state == RecorderState::Idle {
            return;
        }

        self.set_target_texture();

        if self.recorder.tick() {
            if let Some(frame) = self.grab_frame() {
                self.recorder.push(frame);
            }
        }

        self.draw_indicator(state);
        self.set_target_screen();
    }

    /// Reads the game-resolution buffer into a new frame.
    fn grab_frame(&mut self) -> Option<CaptureFrame> {
        let screen = self.config.screen;
        let mut frame = match CaptureFrame::try_new(screen.width, screen.height) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("cannot allocate capture frame, dropping it: {e}");
                return None;
            }
        };

        let switch = self.target != RenderTarget::Virtual;
        if switch {
            self.backend.set_render_target(RenderTarget::Virtual);
        }

        let result = self.backend.read_pixels(Viewport::new(0, 0, screen.width, screen.height), &mut frame);

        if switch {
            // restore the target together with its own clip
            self.backend.set_render_target(self.target);
            if self.viewport.is_some() {
                self.backend.apply_viewport(self.viewport);
            }
        }

        match result {
            Ok(()) => Some(frame),
            Err(e) => {
                log::error!("cannot read back frame: {e:#}");
                None
            }
        }
    }

    fn draw_indicator(&mut self, state: RecorderState) {
        let alpha = self.recorder.indicator_alpha();
        let (color, label): (_, &Label) = match state {
            RecorderState::Finalizing => (indicator::saving_color(alpha), &indicator::SAVING_LABEL),
            _ => (indicator::recording_color(alpha), &indicator::RECORDING_LABEL),
        };

        let was_ignored = self.offset.is_ignored();
        self.offset_viewport_ignore(true);

        let (cx, cy) = indicator::CENTER;
        self.render_circle(cx, cy, indicator::RADIUS, depth::DEFAULT, color);
        for rect in indicator::label_rects(label) {
            self.render_rect(rect.x as i32, rect.y as i32, rect.w as i32, rect.h as i32, depth::DEFAULT, color, true);
        }

        self.offset_viewport_ignore(was_ignored);
    }
}
