//! JPEG output for converted frames.

use std::borrow::Cow;
use std::io::Write;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use tracing::{instrument, trace};

use crate::capture::{Frame, PixelFormat};
use crate::convert::source_stride;
use crate::error::{Error, Result};

pub const DEFAULT_QUALITY: u8 = 85;

/// Encode `frame` as JPEG into `writer`.
///
/// Accepts RGB24, BGR24 (reordered to RGB per scanline) and GRAY8. `quality`
/// runs from 0 to 100; 0 is treated as 1.
#[instrument(level = "debug", skip(frame, writer), fields(sequence = frame.sequence))]
pub fn write_jpeg<W: Write>(frame: &Frame<'_>, quality: u8, writer: W) -> Result<()> {
    let quality = match quality {
        0 => 1,
        q @ 1..=100 => q,
        _ => return Err(Error::InvalidParam("jpeg quality must be within 0..=100")),
    };
    let (color, channels) = match frame.format {
        PixelFormat::Rgb24 | PixelFormat::Bgr24 => (ExtendedColorType::Rgb8, 3),
        PixelFormat::Gray8 => (ExtendedColorType::L8, 1),
        other => {
            return Err(Error::InvalidFormat {
                expected: PixelFormat::Rgb24,
                actual: other,
            })
        }
    };

    let scanlines = packed_scanlines(frame, channels)?;
    let mut encoder = JpegEncoder::new_with_quality(writer, quality);
    encoder.encode(&scanlines, frame.width, frame.height, color)?;
    trace!(bytes = scanlines.len(), quality, "frame encoded");
    Ok(())
}

/// Encode `frame` as JPEG into a shareable buffer.
pub fn encode_jpeg(frame: &Frame<'_>, quality: u8) -> Result<Bytes> {
    let mut out = Vec::with_capacity(frame.data_bytes() / 4);
    write_jpeg(frame, quality, &mut out)?;
    Ok(Bytes::from(out))
}

/// Rows laid out back to back in RGB order, borrowed when the frame already
/// is.
fn packed_scanlines<'f>(frame: &'f Frame<'_>, channels: usize) -> Result<Cow<'f, [u8]>> {
    let stride = source_stride(frame, channels)?;
    let row = frame.width as usize * channels;
    let height = frame.height as usize;

    let bgr = frame.format == PixelFormat::Bgr24;
    if stride == row && !bgr {
        return Ok(Cow::Borrowed(&frame.data()[..row * height]));
    }

    let mut packed = Vec::with_capacity(row * height);
    if row > 0 {
        for line in frame.data().chunks(stride).take(height) {
            let line = &line[..row];
            if bgr {
                for px in line.chunks_exact(3) {
                    packed.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            } else {
                packed.extend_from_slice(line);
            }
        }
    }
    Ok(Cow::Owned(packed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(format: PixelFormat) -> Frame<'static> {
        let data = (0..8u8 * 8).flat_map(|i| [i * 4, 128, 255 - i * 4]).collect();
        Frame::from_owned(data, 8, 8, format)
    }

    #[test]
    fn output_is_a_jpeg_stream() {
        let jpeg = encode_jpeg(&gradient(PixelFormat::Rgb24), DEFAULT_QUALITY).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn bgr_is_reordered_before_encoding() {
        let frame = gradient(PixelFormat::Bgr24);
        let packed = packed_scanlines(&frame, 3).unwrap();
        assert_eq!(&packed[..3], &[255, 128, 0]);
    }

    #[test]
    fn tight_rgb_is_borrowed() {
        let frame = gradient(PixelFormat::Rgb24);
        assert!(matches!(packed_scanlines(&frame, 3).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn padding_is_dropped() {
        let mut frame = Frame::from_owned(vec![1, 2, 3, 0, 4, 5, 6, 0], 1, 2, PixelFormat::Rgb24);
        frame.step = 4;
        let packed = packed_scanlines(&frame, 3).unwrap();
        assert_eq!(&packed[..], &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn overflowing_step_is_truncated() {
        let mut frame = gradient(PixelFormat::Bgr24);
        frame.step = usize::MAX;
        assert!(matches!(
            encode_jpeg(&frame, DEFAULT_QUALITY),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn gray_frames_encode() {
        let frame = Frame::from_owned(vec![128; 64], 8, 8, PixelFormat::Gray8);
        assert!(encode_jpeg(&frame, 50).is_ok());
    }

    #[test]
    fn quality_zero_is_accepted() {
        assert!(encode_jpeg(&gradient(PixelFormat::Rgb24), 0).is_ok());
    }

    #[test]
    fn quality_above_hundred_is_rejected() {
        let err = encode_jpeg(&gradient(PixelFormat::Rgb24), 101).unwrap_err();
        assert!(matches!(err, Error::InvalidParam(_)));
    }

    #[test]
    fn yuv_frames_are_rejected() {
        let frame = Frame::from_owned(vec![0; 8], 2, 2, PixelFormat::Yuyv);
        assert!(matches!(
            encode_jpeg(&frame, 85),
            Err(Error::InvalidFormat { .. })
        ));
    }
}
