pub mod alloc;
pub mod frame;
#[cfg(feature = "v4l2")]
pub mod v4l2;

pub use frame::{Frame, FrameBuffer, Ownership, PixelFormat, StreamHandle};
#[cfg(feature = "v4l2")]
pub use v4l2::V4l2Capture;
