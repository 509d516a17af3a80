pub mod backend;

/// Rendering backends.
pub mod backends;

mod call;
pub use call::*;

pub mod depth;

mod render_queue;
pub use render_queue::*;

mod viewport;
pub use viewport::{letterbox, Viewport, ViewportOffset};
