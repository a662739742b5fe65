//! Single-channel extraction from YUYV frames.

use super::{check_source, output_len};
use crate::capture::{Frame, PixelFormat};
use crate::error::Result;

/// Extract the luma plane of a YUYV frame as GRAY8.
pub fn yuyv_to_y(src: &Frame<'_>, dst: &mut Frame<'_>) -> Result<()> {
    extract(src, dst, 0)
}

/// Extract chroma from a YUYV frame as GRAY8.
///
/// Takes the second byte of every 2-byte YUYV unit, so the output holds U and
/// V samples interleaved (`U0 V0 U1 V1 ...`) at luma resolution. This is a
/// lossy view, not a chroma plane: luma is discarded and U/V cannot be
/// separated back into full-resolution planes.
pub fn yuyv_to_uv(src: &Frame<'_>, dst: &mut Frame<'_>) -> Result<()> {
    extract(src, dst, 1)
}

fn extract(src: &Frame<'_>, dst: &mut Frame<'_>, offset: usize) -> Result<()> {
    let stride = check_source(src, PixelFormat::Yuyv)?;
    let needed = output_len(src, dst, 1)?;
    dst.ensure_capacity(needed)?;
    dst.inherit(src, PixelFormat::Gray8);

    let width = src.width as usize;
    if width == 0 {
        return Ok(());
    }
    let rows_in = src.data().chunks(stride);
    let rows_out = dst.data_mut()[..needed].chunks_exact_mut(width);
    for (row_in, row_out) in rows_in.zip(rows_out) {
        for (out, pair) in row_out.iter_mut().zip(row_in[..width * 2].chunks_exact(2)) {
            *out = pair[offset];
        }
    }
    Ok(())
}
