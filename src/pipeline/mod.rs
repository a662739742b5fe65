pub mod context;
pub mod saver;

pub use context::{CaptureContext, CaptureStats, FrameOutcome};
pub use saver::FrameSaver;
