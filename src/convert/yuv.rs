//! Packed 4:2:2 YUV to RGB/BGR kernels.
//!
//! Integer BT.601 math with a 14-bit fixed-point scale (1.0 == 16384). Each
//! 4-byte unit carries two luma samples sharing one U and one V sample and
//! yields two output pixels.

use super::{check_source, output_len};
use crate::capture::{Frame, PixelFormat};
use crate::error::Result;

/// Byte positions of the samples inside one 4-byte unit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PackedLayout {
    format: PixelFormat,
    y0: usize,
    u: usize,
    y1: usize,
    v: usize,
}

pub(crate) const YUYV: PackedLayout = PackedLayout {
    format: PixelFormat::Yuyv,
    y0: 0,
    u: 1,
    y1: 2,
    v: 3,
};

pub(crate) const UYVY: PackedLayout = PackedLayout {
    format: PixelFormat::Uyvy,
    y0: 1,
    u: 0,
    y1: 3,
    v: 2,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelOrder {
    Rgb,
    Bgr,
}

impl ChannelOrder {
    fn format(self) -> PixelFormat {
        match self {
            Self::Rgb => PixelFormat::Rgb24,
            Self::Bgr => PixelFormat::Bgr24,
        }
    }

    #[inline(always)]
    fn store(self, px: &mut [u8], y: u8, r: i32, g: i32, b: i32) {
        let y = i32::from(y);
        let (first, last) = match self {
            Self::Rgb => (r, b),
            Self::Bgr => (b, r),
        };
        px[0] = saturate(y + first);
        px[1] = saturate(y + g);
        px[2] = saturate(y + last);
    }
}

/// Clamp a channel value into `0..=255`.
#[inline(always)]
pub(crate) fn saturate(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Red, green and blue offsets contributed by one chroma pair.
#[inline(always)]
pub(crate) fn chroma_offsets(u: u8, v: u8) -> (i32, i32, i32) {
    let u = i32::from(u) - 128;
    let v = i32::from(v) - 128;
    (
        (22987 * v) >> 14,
        (-5636 * u - 11698 * v) >> 14,
        (29049 * u) >> 14,
    )
}

pub fn yuyv_to_rgb(src: &Frame<'_>, dst: &mut Frame<'_>) -> Result<()> {
    convert_packed(src, dst, YUYV, ChannelOrder::Rgb)
}

pub fn yuyv_to_bgr(src: &Frame<'_>, dst: &mut Frame<'_>) -> Result<()> {
    convert_packed(src, dst, YUYV, ChannelOrder::Bgr)
}

pub fn uyvy_to_rgb(src: &Frame<'_>, dst: &mut Frame<'_>) -> Result<()> {
    convert_packed(src, dst, UYVY, ChannelOrder::Rgb)
}

pub fn uyvy_to_bgr(src: &Frame<'_>, dst: &mut Frame<'_>) -> Result<()> {
    convert_packed(src, dst, UYVY, ChannelOrder::Bgr)
}

fn convert_packed(
    src: &Frame<'_>,
    dst: &mut Frame<'_>,
    layout: PackedLayout,
    order: ChannelOrder,
) -> Result<()> {
    let stride = check_source(src, layout.format)?;
    let needed = output_len(src, dst, 3)?;
    dst.ensure_capacity(needed)?;
    dst.inherit(src, order.format());

    let width = src.width as usize;
    if width == 0 {
        return Ok(());
    }
    let rows_in = src.data().chunks(stride);
    let rows_out = dst.data_mut()[..needed].chunks_exact_mut(width * 3);
    for (row_in, row_out) in rows_in.zip(rows_out) {
        convert_row(&row_in[..width * 2], row_out, layout, order);
    }
    Ok(())
}

#[inline]
fn convert_row(row_in: &[u8], row_out: &mut [u8], layout: PackedLayout, order: ChannelOrder) {
    let mut units = row_in.chunks_exact(4);
    let mut pixels = row_out.chunks_exact_mut(6);
    for (unit, px) in (&mut units).zip(&mut pixels) {
        let (r, g, b) = chroma_offsets(unit[layout.u], unit[layout.v]);
        order.store(&mut px[..3], unit[layout.y0], r, g, b);
        order.store(&mut px[3..], unit[layout.y1], r, g, b);
    }

    // Odd width: the last pixel has no chroma partner and is rendered from luma.
    let half = units.remainder();
    let tail = pixels.into_remainder();
    if half.len() == 2 && tail.len() == 3 {
        order.store(tail, half[layout.y0], 0, 0, 0);
    }
}
