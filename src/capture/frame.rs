use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Pixel encodings a frame can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    #[default]
    Unknown,
    /// 4:2:2 packed, `[Y0, U, Y1, V]`
    Yuyv,
    /// 4:2:2 packed, `[U, Y0, V, Y1]`
    Uyvy,
    Rgb24,
    Bgr24,
    Gray8,
    Gray16,
    Mjpeg,
    H264,
    Nv12,
    BayerGrbg8,
    BayerGbrg8,
    BayerRggb8,
    BayerBggr8,
}

impl PixelFormat {
    /// Bytes per pixel for packed formats, `None` for compressed or planar ones.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::Yuyv | Self::Uyvy | Self::Gray16 => Some(2),
            Self::Rgb24 | Self::Bgr24 => Some(3),
            Self::Gray8
            | Self::BayerGrbg8
            | Self::BayerGbrg8
            | Self::BayerRggb8
            | Self::BayerBggr8 => Some(1),
            Self::Unknown | Self::Mjpeg | Self::H264 | Self::Nv12 => None,
        }
    }

    pub fn is_compressed(self) -> bool {
        matches!(self, Self::Mjpeg | Self::H264)
    }
}

/// Opaque reference to the device/stream a frame came from.
///
/// This is a relation only. Nothing in this crate owns or frees through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamHandle(pub u64);

/// Whether the crate may reallocate and free a frame's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Borrowed,
}

/// Backing store of a frame.
///
/// `Owned` storage is resized on demand. `Borrowed` storage has a fixed
/// capacity set by the caller; requests beyond it fail.
pub enum FrameBuffer<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a mut [u8]),
}

impl FrameBuffer<'_> {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Owned(buf) => buf,
            Self::Borrowed(buf) => buf,
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Self::Owned(buf) => buf,
            Self::Borrowed(buf) => buf,
        }
    }

    pub fn ownership(&self) -> Ownership {
        match self {
            Self::Owned(_) => Ownership::Owned,
            Self::Borrowed(_) => Ownership::Borrowed,
        }
    }
}

/// A video frame: pixel storage plus geometry, format and timing.
///
/// Geometry and timing fields are public; storage is only resized through
/// [`Frame::ensure_capacity`].
pub struct Frame<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Bytes per row as laid out, may exceed `width * bytes_per_pixel`.
    pub step: usize,
    pub(crate) data: FrameBuffer<'a>,
    pub(crate) metadata: Option<Vec<u8>>,
    pub(crate) metadata_bytes: usize,
    /// Transport-assigned counter, propagated untouched.
    pub sequence: u32,
    /// Device timestamp of the capture start.
    pub capture_time: Option<Duration>,
    /// Host instant at which the transfer completed.
    pub capture_time_finished: Option<Instant>,
    pub source: Option<StreamHandle>,
}

impl<'a> Frame<'a> {
    pub(crate) fn with_buffer(data: FrameBuffer<'a>) -> Self {
        Self {
            width: 0,
            height: 0,
            format: PixelFormat::Unknown,
            step: 0,
            data,
            metadata: None,
            metadata_bytes: 0,
            sequence: 0,
            capture_time: None,
            capture_time_finished: None,
            source: None,
        }
    }

    /// Wrap a caller-owned buffer. Its capacity is fixed for the frame's
    /// lifetime and it is never freed by [`Frame::release`].
    pub fn from_borrowed(buf: &'a mut [u8]) -> Self {
        Self::with_buffer(FrameBuffer::Borrowed(buf))
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.data.as_mut_slice()
    }

    /// Current capacity of the pixel storage.
    pub fn data_bytes(&self) -> usize {
        self.data.as_slice().len()
    }

    pub fn ownership(&self) -> Ownership {
        self.data.ownership()
    }

    pub fn owns_data(&self) -> bool {
        self.ownership() == Ownership::Owned
    }

    /// Out-of-band payload, `None` when the frame carries none.
    pub fn metadata(&self) -> Option<&[u8]> {
        match &self.metadata {
            Some(meta) if self.metadata_bytes > 0 => Some(&meta[..self.metadata_bytes]),
            _ => None,
        }
    }

    pub fn metadata_bytes(&self) -> usize {
        self.metadata_bytes
    }

    /// Saturates at `usize::MAX` on targets where the geometry doesn't fit.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Row stride and the number of bytes `height` rows of `bpp`-byte pixels
    /// span, honouring `step` when it exceeds the packed row width.
    ///
    /// `None` when the span does not fit in `usize`.
    pub(crate) fn packed_span(&self, bpp: usize) -> Option<(usize, usize)> {
        let row = (self.width as usize).checked_mul(bpp)?;
        let stride = self.step.max(row);
        let span = match self.height as usize {
            0 => 0,
            h => stride.checked_mul(h - 1)?.checked_add(row)?,
        };
        Some((stride, span))
    }

    /// Copy geometry, timing and source from `src`, tagging `self` with
    /// `format` and a tightly packed step.
    pub(crate) fn inherit(&mut self, src: &Frame<'_>, format: PixelFormat) {
        self.width = src.width;
        self.height = src.height;
        self.format = format;
        self.step = src.width as usize * format.bytes_per_pixel().unwrap_or(0);
        self.sequence = src.sequence;
        self.capture_time = src.capture_time;
        self.capture_time_finished = src.capture_time_finished;
        self.source = src.source;
    }
}

impl Frame<'static> {
    /// Build an owning frame around already captured pixels.
    pub fn from_owned(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        let mut frame = Self::with_buffer(FrameBuffer::Owned(data));
        frame.width = width;
        frame.height = height;
        frame.format = format;
        frame.step = width as usize * format.bytes_per_pixel().unwrap_or(0);
        frame
    }
}

impl fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("step", &self.step)
            .field("data_bytes", &self.data_bytes())
            .field("ownership", &self.ownership())
            .field("metadata_bytes", &self.metadata_bytes)
            .field("sequence", &self.sequence)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
