//! MJPEG decode path, available when the `mjpeg` feature links the decoder.

use tracing::debug;
use zune_jpeg::JpegDecoder;

use super::swap::swap_red_blue;
use crate::capture::{Frame, PixelFormat};
use crate::error::{Error, Result};

/// Decode an MJPEG frame into RGB24.
///
/// Geometry comes from the JPEG header; timing and source from `src`.
pub fn mjpeg_to_rgb(src: &Frame<'_>, dst: &mut Frame<'_>) -> Result<()> {
    if src.format != PixelFormat::Mjpeg {
        return Err(Error::InvalidFormat {
            expected: PixelFormat::Mjpeg,
            actual: src.format,
        });
    }

    let mut decoder = JpegDecoder::new(src.data());
    let pixels = decoder
        .decode()
        .map_err(|e| Error::Decode(format!("{e:?}")))?;
    let (width, height) = decoder
        .dimensions()
        .ok_or_else(|| Error::Decode("missing frame header".into()))?;

    if (width, height) != (src.width as usize, src.height as usize) {
        debug!(
            header_width = width,
            header_height = height,
            width = src.width,
            height = src.height,
            "jpeg header geometry differs from stream geometry"
        );
    }

    let (count, needed) = width
        .checked_mul(height)
        .and_then(|count| Some((count, count.checked_mul(3)?)))
        .ok_or_else(|| Error::Decode(format!("{width}x{height} image is too large")))?;
    let grayscale = match pixels.len() {
        len if len == needed => false,
        len if len == count => true,
        len => {
            return Err(Error::Decode(format!(
                "decoded {len} bytes for a {width}x{height} image"
            )))
        }
    };

    dst.ensure_capacity(needed)?;
    let out = &mut dst.data_mut()[..needed];
    if grayscale {
        // Replicate luma into all three channels
        for (px, &luma) in out.chunks_exact_mut(3).zip(&pixels) {
            px.fill(luma);
        }
    } else {
        out.copy_from_slice(&pixels);
    }

    dst.inherit(src, PixelFormat::Rgb24);
    dst.width = width as u32;
    dst.height = height as u32;
    dst.step = width * 3;
    Ok(())
}

/// Decode an MJPEG frame into BGR24.
pub fn mjpeg_to_bgr(src: &Frame<'_>, dst: &mut Frame<'_>) -> Result<()> {
    mjpeg_to_rgb(src, dst)?;
    swap_red_blue(dst)
}
