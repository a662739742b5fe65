use thiserror::Error;

use crate::capture::PixelFormat;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors produced by frame allocation, conversion and output.
///
/// None of these are fatal to a capture stream: the per-frame callback logs
/// them, drops the frame and moves on.
#[derive(Debug, Error)]
pub enum Error {
    /// Allocation failed, or a borrowed buffer is too small for the request.
    #[error("out of memory: {requested} bytes requested, {available} available")]
    OutOfMemory { requested: usize, available: usize },

    /// The source frame does not carry the format the kernel converts from.
    #[error("invalid format: expected {expected:?}, got {actual:?}")]
    InvalidFormat {
        expected: PixelFormat,
        actual: PixelFormat,
    },

    /// No conversion path exists for this source format.
    #[error("conversion from {0:?} not supported")]
    NotSupported(PixelFormat),

    /// The source buffer is shorter than its geometry requires.
    #[error("truncated frame: {needed} bytes needed, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("jpeg decode failed: {0}")]
    Decode(String),

    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),

    #[error("jpeg encode failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
