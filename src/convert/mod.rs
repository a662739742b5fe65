//! Pixel-format conversion.
//!
//! Every kernel reads one source frame and writes one destination frame.
//! Destinations are resized only through [`Frame::ensure_capacity`], and the
//! source is never written. Kernels are stateless, so one scratch destination
//! can be reused for every frame of a stream.

pub mod duplicate;
#[cfg(feature = "mjpeg")]
pub mod mjpeg;
pub mod planes;
pub mod swap;
pub mod yuv;

use std::time::Instant;

use tracing::instrument;

use crate::capture::{Frame, PixelFormat};
use crate::error::{Error, Result};

pub use duplicate::duplicate;
#[cfg(feature = "mjpeg")]
pub use mjpeg::{mjpeg_to_bgr, mjpeg_to_rgb};
pub use planes::{yuyv_to_uv, yuyv_to_y};
pub use swap::swap_red_blue;
pub use yuv::{uyvy_to_bgr, uyvy_to_rgb, yuyv_to_bgr, yuyv_to_rgb};

/// Convert any supported frame to RGB24.
#[instrument(level = "trace", skip_all, fields(format = ?src.format, sequence = src.sequence))]
pub fn any_to_rgb(src: &Frame<'_>, dst: &mut Frame<'_>) -> Result<()> {
    let started = Instant::now();
    let result = match src.format {
        #[cfg(feature = "mjpeg")]
        PixelFormat::Mjpeg => mjpeg_to_rgb(src, dst),
        PixelFormat::Yuyv => yuyv_to_rgb(src, dst),
        PixelFormat::Uyvy => uyvy_to_rgb(src, dst),
        PixelFormat::Rgb24 => duplicate(src, dst),
        other => Err(Error::NotSupported(other)),
    };
    record_convert_time(started);
    result
}

/// Convert any supported frame to BGR24.
#[instrument(level = "trace", skip_all, fields(format = ?src.format, sequence = src.sequence))]
pub fn any_to_bgr(src: &Frame<'_>, dst: &mut Frame<'_>) -> Result<()> {
    let started = Instant::now();
    let result = match src.format {
        #[cfg(feature = "mjpeg")]
        PixelFormat::Mjpeg => mjpeg_to_bgr(src, dst),
        PixelFormat::Yuyv => yuyv_to_bgr(src, dst),
        PixelFormat::Uyvy => uyvy_to_bgr(src, dst),
        PixelFormat::Bgr24 => duplicate(src, dst),
        other => Err(Error::NotSupported(other)),
    };
    record_convert_time(started);
    result
}

fn record_convert_time(started: Instant) {
    metrics::histogram!("convert_time_us").record(started.elapsed().as_micros() as f64);
}

/// Validate a packed source frame before anything is allocated.
///
/// Returns the byte distance between source rows: `step` when it exceeds the
/// packed row width, the packed width otherwise.
pub(crate) fn check_source(src: &Frame<'_>, expected: PixelFormat) -> Result<usize> {
    if src.format != expected {
        return Err(Error::InvalidFormat {
            expected,
            actual: src.format,
        });
    }

    source_stride(src, expected.bytes_per_pixel().unwrap_or(0))
}

/// Row stride of a packed frame whose buffer holds all of its rows.
///
/// A geometry whose byte span overflows `usize` can't be backed by any buffer
/// and is reported as truncated.
pub(crate) fn source_stride(frame: &Frame<'_>, bpp: usize) -> Result<usize> {
    match frame.packed_span(bpp) {
        Some((stride, needed)) if needed <= frame.data_bytes() => Ok(stride),
        span => Err(Error::Truncated {
            needed: span.map_or(usize::MAX, |(_, needed)| needed),
            available: frame.data_bytes(),
        }),
    }
}

/// Destination size for `src` converted to `bpp` bytes per pixel.
pub(crate) fn output_len(src: &Frame<'_>, dst: &Frame<'_>, bpp: usize) -> Result<usize> {
    (src.width as usize)
        .checked_mul(src.height as usize)
        .and_then(|pixels| pixels.checked_mul(bpp))
        .ok_or(Error::OutOfMemory {
            requested: usize::MAX,
            available: dst.data_bytes(),
        })
}
