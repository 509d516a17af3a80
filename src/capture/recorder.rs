use std::path::{Path, PathBuf};

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::capture::indicator::Fade;
use crate::capture::{CaptureFrame, FrameEncoder};
use crate::config::CaptureConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    /// Frames are captured and queued for the worker.
    Recording,
    /// No new frames; the worker drains the queue and writes the trailer.
    Finalizing,
}

enum WorkerMessage {
    Frame(CaptureFrame),
    Finish,
}

/// Animated recording state machine plus its encoding worker.
///
/// The render thread decides per tick whether a frame is due
/// ([`tick`](Self::tick)) and pushes captured frames to the worker over an
/// unbounded channel. Stopping sends a finish marker behind the queued
/// frames, so every frame captured before the stop is still encoded.
pub struct GifRecorder {
    state: RecorderState,
    delay_cs: u16,
    frame_interval_ms: u32,
    delay_timer: u32,
    sender: Option<UnboundedSender<WorkerMessage>>,
    worker: Option<JoinHandle<()>>,
    path: Option<PathBuf>,
    fade: Fade,
}

impl GifRecorder {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            state: RecorderState::Idle,
            delay_cs: config.gif_delay_cs,
            frame_interval_ms: config.frame_interval_ms,
            delay_timer: 0,
            sender: None,
            worker: None,
            path: None,
            fade: Fade::default(),
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn delay_cs(&self) -> u16 {
        self.delay_cs
    }

    /// File of the current or last recording.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Starts a recording into `encoder`.
    ///
    /// A recording that is still being written out is waited for first.
    pub fn start(&mut self, runtime: &Handle, encoder: Box<dyn FrameEncoder>, path: PathBuf) {
        if self.state == RecorderState::Recording {
            log::warn!("a recording is already running");
            return;
        }
        self.join_worker(runtime);

        let (tx, rx) = mpsc::unbounded_channel();
        self.worker = Some(runtime.spawn_blocking(move || run_worker(rx, encoder)));
        self.sender = Some(tx);
        self.state = RecorderState::Recording;
        self.delay_timer = 0;

        log::info!("recording to {}", path.display());
        self.path = Some(path);
    }

    /// Stops accepting frames and lets the worker finish the file in the background.
    pub fn request_finish(&mut self) {
        match self.state {
            RecorderState::Recording => {
                if let Some(tx) = self.sender.take() {
                    let _ = tx.send(WorkerMessage::Finish);
                }
                self.state = RecorderState::Finalizing;
            }
            RecorderState::Finalizing => log::info!("recording is still being saved"),
            RecorderState::Idle => {}
        }
    }

    /// Advances the pacing timer by one logical frame. Returns whether this frame is to be captured.
    pub fn tick(&mut self) -> bool {
        if self.state == RecorderState::Idle {
            return false;
        }

        self.delay_timer += self.frame_interval_ms;
        if self.delay_timer >= self.delay_cs as u32 * 10 {
            self.delay_timer = 0;
        }

        self.state == RecorderState::Recording && self.delay_timer == 0
    }

    /// Queues a frame for encoding. Frames are refused unless recording.
    pub fn push(&mut self, frame: CaptureFrame) -> bool {
        if self.state != RecorderState::Recording {
            return false;
        }

        let Some(tx) = &self.sender else {
            return false;
        };

        if tx.send(WorkerMessage::Frame(frame)).is_err() {
            log::error!("recording worker is gone, stopping the recording");
            self.sender = None;
            self.state = RecorderState::Finalizing;
            return false;
        }

        true
    }

    /// Moves from finalizing to idle once the worker is done.
    pub fn poll(&mut self) -> RecorderState {
        if self.state == RecorderState::Finalizing && self.worker.as_ref().map_or(true, JoinHandle::is_finished) {
            self.worker = None;
            self.state = RecorderState::Idle;
        }
        self.state
    }

    /// Stops a running recording and waits, without a timeout, until its file is complete.
    pub fn finish_blocking(&mut self, runtime: &Handle) {
        self.request_finish();
        self.join_worker(runtime);
    }

    /// Alpha for the on-screen indicator, advanced once per call.
    pub fn indicator_alpha(&mut self) -> f32 {
        self.fade.step()
    }

    fn join_worker(&mut self, runtime: &Handle) {
        if let Some(worker) = self.worker.take() {
            if let Err(e) = runtime.block_on(worker) {
                log::error!("recording worker failed: {e}");
            }
        }
        self.sender = None;
        self.state = RecorderState::Idle;
    }
}

fn run_worker(mut rx: UnboundedReceiver<WorkerMessage>, mut encoder: Box<dyn FrameEncoder>) {
    let mut frames = 0u64;

    while let Some(message) = rx.blocking_recv() {
        match message {
            WorkerMessage::Frame(frame) => match encoder.write_frame(&frame) {
                Ok(()) => frames += 1,
                Err(e) => log::error!("cannot encode recorded frame: {e:#}"),
            },
            WorkerMessage::Finish => break,
        }
    }

    match encoder.finish() {
        Ok(()) => log::info!("recording saved, {frames} frames"),
        Err(e) => log::error!("cannot finish recording: {e:#}"),
    }
}
