use super::source_stride;
use crate::capture::{Frame, PixelFormat};
use crate::error::{Error, Result};

/// Swap the red and blue channels in place, turning RGB into BGR and back.
pub fn swap_red_blue(frame: &mut Frame<'_>) -> Result<()> {
    let swapped = match frame.format {
        PixelFormat::Rgb24 => PixelFormat::Bgr24,
        PixelFormat::Bgr24 => PixelFormat::Rgb24,
        other => {
            return Err(Error::InvalidFormat {
                expected: PixelFormat::Bgr24,
                actual: other,
            })
        }
    };

    let stride = source_stride(frame, 3)?;
    let row = frame.width as usize * 3;
    let height = frame.height as usize;

    if row > 0 {
        for line in frame.data_mut().chunks_mut(stride).take(height) {
            for px in line[..row].chunks_exact_mut(3) {
                px.swap(0, 2);
            }
        }
    }
    frame.format = swapped;
    Ok(())
}
