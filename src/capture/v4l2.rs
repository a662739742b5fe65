//! V4L2 transport adapter: fills reusable source frames from mmap'd buffers

use std::time::{Duration, Instant};

use color_eyre::{eyre::eyre, Result};
use tracing::{debug, info, instrument};
use v4l::buffer::Type;
use v4l::capability::Flags as CapFlags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::MmapStream;
use v4l::video::capture::Parameters;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::capture::frame::{Frame, PixelFormat, StreamHandle};
use crate::CaptureConfig;

/// Map a pixel format onto the V4L2 fourcc the device is asked for.
pub fn fourcc_for(format: PixelFormat) -> Option<FourCC> {
    let code = match format {
        PixelFormat::Yuyv => b"YUYV",
        PixelFormat::Uyvy => b"UYVY",
        PixelFormat::Mjpeg => b"MJPG",
        PixelFormat::H264 => b"H264",
        PixelFormat::Gray8 => b"GREY",
        PixelFormat::Rgb24 => b"RGB3",
        PixelFormat::Bgr24 => b"BGR3",
        _ => return None,
    };
    Some(FourCC::new(code))
}

/// V4L2 capture stream
pub struct V4l2Capture {
    device: Box<Device>,
    stream: Option<MmapStream<'static>>,
    // Receives each dequeued buffer on the blocking pool; reused across frames
    staging: Vec<u8>,
    config: CaptureConfig,
    handle: StreamHandle,
    format: PixelFormat,
    width: u32,
    height: u32,
    stride: usize,
}

impl V4l2Capture {
    /// Open the device and negotiate format, size and frame rate
    pub fn new(config: CaptureConfig, handle: StreamHandle) -> Result<Self> {
        info!("Initializing V4L2 capture: {}", config.device);

        let device = Device::with_path(&config.device)?;

        let caps = device.query_caps()?;
        info!("Device: {} ({})", caps.card, caps.driver);

        if !caps.capabilities.contains(CapFlags::VIDEO_CAPTURE) {
            return Err(eyre!("Device doesn't support video capture"));
        }

        let fourcc = fourcc_for(config.format)
            .ok_or_else(|| eyre!("Unsupported pixel format: {:?}", config.format))?;

        let mut fmt = device.format()?;
        fmt.width = config.width;
        fmt.height = config.height;
        fmt.fourcc = fourcc;
        let fmt = device.set_format(&fmt)?;

        if fmt.fourcc != fourcc {
            return Err(eyre!(
                "Device refused {:?}, negotiated {}",
                config.format,
                fmt.fourcc
            ));
        }

        let params = device.set_params(&Parameters::with_fps(config.fps))?;
        info!(
            width = fmt.width,
            height = fmt.height,
            stride = fmt.stride,
            interval = ?params.interval,
            "Negotiated stream format"
        );

        Ok(Self {
            device: Box::new(device),
            stream: None,
            staging: Vec::new(),
            format: config.format,
            width: fmt.width,
            height: fmt.height,
            stride: fmt.stride as usize,
            config,
            handle,
        })
    }

    /// Start streaming with memory-mapped buffers
    pub fn start_stream(&mut self) -> Result<()> {
        let stream =
            MmapStream::with_buffers(&self.device, Type::VideoCapture, self.config.buffer_count)?;

        self.stream = Some(stream);
        info!(
            "Capture stream started with {} buffers",
            self.config.buffer_count
        );
        Ok(())
    }

    /// Dequeue the next buffer into `frame`, reusing its storage.
    ///
    /// The blocking dequeue runs on tokio's blocking pool, so a stalled device
    /// doesn't hold up the caller's other branches. If this future is dropped
    /// mid-dequeue the stream goes with it and must be restarted.
    #[instrument(skip(self, frame))]
    pub async fn capture_into(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        let mut stream = self
            .stream
            .take()
            .ok_or_else(|| eyre!("Stream not started"))?;
        let mut staging = std::mem::take(&mut self.staging);

        let (stream, staging, dequeued) = tokio::task::spawn_blocking(move || {
            let dequeued = stream.next().map(|(buf, meta)| {
                let used = (meta.bytesused as usize).min(buf.len());
                staging.clear();
                staging.extend_from_slice(&buf[..used]);
                let timestamp = Duration::from_secs(meta.timestamp.sec as u64)
                    + Duration::from_micros(meta.timestamp.usec as u64);
                (meta.sequence, timestamp)
            });
            (stream, staging, dequeued)
        })
        .await?;
        self.stream = Some(stream);

        let result = dequeued
            .map_err(Into::into)
            .and_then(|(sequence, timestamp)| {
                frame.fill_from(&staging)?;

                frame.width = self.width;
                frame.height = self.height;
                frame.format = self.format;
                frame.step = self.stride;
                frame.sequence = sequence;
                frame.capture_time = Some(timestamp);
                frame.capture_time_finished = Some(Instant::now());
                frame.source = Some(self.handle);

                debug!(sequence, bytes = staging.len(), "Frame dequeued");
                Ok(())
            });
        self.staging = staging;
        result
    }
}
