//! Screenshots and animated recordings.
//!
//! Both read pixels back from the virtual render target on the render
//! thread and leave the slow part, compressing and writing files, to
//! blocking tasks on the renderer's runtime.

mod encoder;
mod frame;
pub mod indicator;
mod naming;
mod recorder;
mod screenshot;

pub use encoder::{FrameEncoder, GifFrameEncoder};
pub use frame::CaptureFrame;
pub use naming::CaptureNamer;
pub use recorder::{GifRecorder, RecorderState};
pub use screenshot::{save_png, ScreenshotTask};
