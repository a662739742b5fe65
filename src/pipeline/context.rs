//! Per-frame capture callback state.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use super::saver::FrameSaver;
use crate::capture::{Frame, PixelFormat};
use crate::convert::{any_to_bgr, any_to_rgb, swap_red_blue};
use crate::error::{Error, Result};
use crate::{ColorOrder, Config};

/// Running counters for one capture session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub received: u64,
    pub saved: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// What happened to one delivered frame.
#[derive(Debug)]
pub enum FrameOutcome {
    Saved(PathBuf),
    /// No conversion path for this format; the frame was passed over.
    Skipped(PixelFormat),
    /// Conversion or output failed; the frame was dropped.
    Failed,
}

/// State threaded through the capture loop.
///
/// Owns one scratch destination frame that every conversion reuses, the
/// output saver, and the session timer used for periodic progress logs.
pub struct CaptureContext {
    scratch: Frame<'static>,
    saver: FrameSaver,
    order: ColorOrder,
    log_interval: u32,
    started: Option<Instant>,
    stats: CaptureStats,
}

impl CaptureContext {
    pub fn new(config: &Config) -> Result<Self> {
        let capture = &config.capture;
        let scratch = Frame::allocate(capture.width as usize * capture.height as usize * 3)?;
        Ok(Self {
            scratch,
            saver: FrameSaver::new(&config.output.directory, config.output.quality),
            order: config.output.order,
            log_interval: config.pipeline.log_interval,
            started: None,
            stats: CaptureStats::default(),
        })
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    pub fn saver(&self) -> &FrameSaver {
        &self.saver
    }

    /// Handle one frame delivered by the transport.
    ///
    /// Never fails: errors are logged, counted and the stream moves on.
    #[instrument(level = "debug", skip_all, fields(sequence = frame.sequence))]
    pub fn on_frame(&mut self, frame: &Frame<'_>) -> FrameOutcome {
        let started = *self.started.get_or_insert_with(Instant::now);
        self.stats.received += 1;

        debug!(
            format = ?frame.format,
            width = frame.width,
            height = frame.height,
            bytes = frame.data_bytes(),
            "frame delivered"
        );

        let outcome = match self.process(frame) {
            Ok(path) => {
                self.stats.saved += 1;
                FrameOutcome::Saved(path)
            }
            Err(Error::NotSupported(format)) => {
                self.stats.skipped += 1;
                debug!(?format, "no conversion path, skipping frame");
                FrameOutcome::Skipped(format)
            }
            Err(e) => {
                self.stats.failed += 1;
                metrics::counter!("frames_dropped").increment(1);
                warn!(error = %e, "dropping frame");
                FrameOutcome::Failed
            }
        };

        if self.log_interval > 0 && frame.sequence % self.log_interval == 0 {
            info!(
                sequence = frame.sequence,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "got image"
            );
        }
        outcome
    }

    fn process(&mut self, frame: &Frame<'_>) -> Result<PathBuf> {
        match self.order {
            ColorOrder::Rgb => any_to_rgb(frame, &mut self.scratch)?,
            ColorOrder::Bgr => {
                any_to_bgr(frame, &mut self.scratch)?;
                swap_red_blue(&mut self.scratch)?;
            }
        }
        self.saver.save(&self.scratch)
    }
}
