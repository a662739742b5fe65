use crate::capture::Frame;
use crate::error::Result;

/// Deep-copy `src` into `dst` without changing its format.
///
/// Pixel data, geometry, timing and source are copied verbatim. Metadata
/// follows the source: copied when `src` carries some, cleared otherwise. The
/// destination's metadata storage grows when needed and is never shrunk.
pub fn duplicate(src: &Frame<'_>, dst: &mut Frame<'_>) -> Result<()> {
    let len = src.data_bytes();
    dst.ensure_capacity(len)?;

    dst.width = src.width;
    dst.height = src.height;
    dst.format = src.format;
    dst.step = src.step;
    dst.sequence = src.sequence;
    dst.capture_time = src.capture_time;
    dst.capture_time_finished = src.capture_time_finished;
    dst.source = src.source;

    dst.data_mut()[..len].copy_from_slice(src.data());

    match src.metadata() {
        Some(meta) => dst.set_metadata(meta)?,
        None => dst.metadata_bytes = 0,
    }
    Ok(())
}
