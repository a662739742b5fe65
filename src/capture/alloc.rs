//! Frame storage allocation: the single gate through which frames grow.

use tracing::{debug, trace};

use super::frame::{Frame, FrameBuffer};
use crate::error::{Error, Result};

impl Frame<'static> {
    /// Allocate an owning frame with `initial_bytes` of zeroed storage.
    ///
    /// Zero defers allocation to the first conversion that targets the frame.
    pub fn allocate(initial_bytes: usize) -> Result<Self> {
        let mut data = Vec::new();
        if initial_bytes > 0 {
            resize_exact(&mut data, initial_bytes)?;
        }
        Ok(Self::with_buffer(FrameBuffer::Owned(data)))
    }
}

impl<'a> Frame<'a> {
    /// Make sure the frame can hold `needed` bytes.
    ///
    /// Owned storage is reallocated to exactly `needed` bytes whenever its
    /// size differs. Borrowed storage is never resized: it succeeds only if
    /// it is already large enough. On failure `data` is left untouched.
    pub fn ensure_capacity(&mut self, needed: usize) -> Result<()> {
        match &mut self.data {
            FrameBuffer::Owned(buf) => {
                if buf.len() != needed {
                    trace!(from = buf.len(), to = needed, "resizing owned frame");
                    resize_exact(buf, needed)?;
                }
                Ok(())
            }
            FrameBuffer::Borrowed(buf) if buf.len() >= needed => Ok(()),
            FrameBuffer::Borrowed(buf) => {
                debug!(
                    capacity = buf.len(),
                    needed, "borrowed frame buffer too small"
                );
                Err(Error::OutOfMemory {
                    requested: needed,
                    available: buf.len(),
                })
            }
        }
    }

    /// Load raw bytes delivered by a transport into this frame.
    pub fn fill_from(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_capacity(bytes.len())?;
        self.data_mut()[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Replace the out-of-band payload. The metadata allocation only grows.
    pub fn set_metadata(&mut self, payload: &[u8]) -> Result<()> {
        if payload.is_empty() {
            self.metadata_bytes = 0;
            return Ok(());
        }
        let meta = self.metadata.get_or_insert_with(Vec::new);
        if meta.len() < payload.len() {
            resize_exact(meta, payload.len())?;
        }
        meta[..payload.len()].copy_from_slice(payload);
        self.metadata_bytes = payload.len();
        Ok(())
    }

    /// Destroy the frame.
    ///
    /// Owned pixel storage is freed along with metadata and timestamps. A
    /// borrowed buffer is handed back to its owner untouched.
    pub fn release(self) {
        trace!(
            ownership = ?self.ownership(),
            data_bytes = self.data_bytes(),
            metadata_bytes = self.metadata_bytes,
            "releasing frame"
        );
        match self.data {
            FrameBuffer::Owned(buf) => drop(buf),
            FrameBuffer::Borrowed(_) => {}
        }
    }
}

/// Resize `buf` to exactly `needed` bytes without aborting on allocation
/// failure. `buf` is unchanged when this returns an error.
pub(crate) fn resize_exact(buf: &mut Vec<u8>, needed: usize) -> Result<()> {
    if needed > buf.len() {
        let available = buf.len();
        buf.try_reserve_exact(needed - available)
            .map_err(|_| Error::OutOfMemory {
                requested: needed,
                available,
            })?;
        buf.resize(needed, 0);
    } else {
        buf.truncate(needed);
        buf.shrink_to_fit();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Ownership, PixelFormat};

    #[test]
    fn allocate_zero_defers_storage() {
        let frame = Frame::allocate(0).unwrap();
        assert_eq!(frame.data_bytes(), 0);
        assert_eq!(frame.ownership(), Ownership::Owned);
        assert_eq!(frame.format, PixelFormat::Unknown);
        assert_eq!((frame.width, frame.height, frame.step), (0, 0, 0));
        assert!(frame.capture_time.is_none());
        assert!(frame.capture_time_finished.is_none());
    }

    #[test]
    fn allocate_reserves_requested_bytes() {
        let frame = Frame::allocate(640 * 480 * 3).unwrap();
        assert_eq!(frame.data_bytes(), 640 * 480 * 3);
    }

    #[test]
    fn allocate_reports_impossible_request() {
        let err = Frame::allocate(usize::MAX).unwrap_err();
        assert!(matches!(err, Error::OutOfMemory { requested, .. } if requested == usize::MAX));
    }

    #[test]
    fn owned_frame_grows_and_shrinks_exactly() {
        let mut frame = Frame::allocate(16).unwrap();
        frame.ensure_capacity(64).unwrap();
        assert_eq!(frame.data_bytes(), 64);
        frame.ensure_capacity(8).unwrap();
        assert_eq!(frame.data_bytes(), 8);
    }

    #[test]
    fn same_size_keeps_storage() {
        let mut frame = Frame::allocate(0).unwrap();
        frame.ensure_capacity(1024).unwrap();
        let before = frame.data().as_ptr();
        frame.ensure_capacity(1024).unwrap();
        assert_eq!(frame.data().as_ptr(), before);
    }

    #[test]
    fn failed_growth_leaves_frame_consistent() {
        let mut frame = Frame::allocate(32).unwrap();
        frame.data_mut().fill(9);
        let err = frame.ensure_capacity(usize::MAX).unwrap_err();
        assert!(matches!(err, Error::OutOfMemory { available: 32, .. }));
        assert_eq!(frame.data_bytes(), 32);
        assert!(frame.data().iter().all(|&b| b == 9));
    }

    #[test]
    fn borrowed_frame_accepts_smaller_request() {
        let mut buf = [0u8; 100];
        let mut frame = Frame::from_borrowed(&mut buf);
        frame.ensure_capacity(60).unwrap();
        assert_eq!(frame.data_bytes(), 100);
    }

    #[test]
    fn borrowed_frame_rejects_overflow() {
        let mut buf = [5u8; 100];
        let mut frame = Frame::from_borrowed(&mut buf);
        let err = frame.ensure_capacity(101).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfMemory {
                requested: 101,
                available: 100
            }
        ));
        assert_eq!(frame.data_bytes(), 100);
        frame.release();
        assert!(buf.iter().all(|&b| b == 5));
    }

    #[test]
    fn fill_from_resizes_owned_frame() {
        let mut frame = Frame::allocate(0).unwrap();
        frame.fill_from(&[1, 2, 3, 4]).unwrap();
        assert_eq!(frame.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn metadata_allocation_only_grows() {
        let mut frame = Frame::allocate(0).unwrap();
        frame.set_metadata(&[1, 2, 3, 4, 5, 6]).unwrap();
        frame.set_metadata(&[7, 8]).unwrap();
        assert_eq!(frame.metadata(), Some(&[7u8, 8][..]));
        assert_eq!(frame.metadata.as_ref().map(Vec::len), Some(6));
    }

    #[test]
    fn release_leaves_borrowed_buffer_intact() {
        let mut buf = vec![0xAB; 48];
        let mut frame = Frame::from_borrowed(&mut buf);
        frame.set_metadata(&[1, 2]).unwrap();
        frame.release();
        assert_eq!(buf.len(), 48);
        assert!(buf.iter().all(|&b| b == 0xAB));
    }
}
