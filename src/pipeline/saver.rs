//! Persistence of converted frames as numbered JPEG files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::capture::Frame;
use crate::encode::encode_jpeg;
use crate::error::Result;

/// Writes `frame_<N>.jpeg` files into a directory.
///
/// `N` is the saver's own counter, independent of the transport sequence. It
/// advances on every attempt, so a failed write leaves a gap. Frames are
/// encoded before the file is created, so an encoder error leaves nothing on
/// disk.
#[derive(Debug)]
pub struct FrameSaver {
    directory: PathBuf,
    quality: u8,
    next_index: u64,
}

impl FrameSaver {
    pub fn new(directory: impl Into<PathBuf>, quality: u8) -> Self {
        Self {
            directory: directory.into(),
            quality,
            next_index: 0,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Index the next saved frame will get.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn save(&mut self, frame: &Frame<'_>) -> Result<PathBuf> {
        let path = self
            .directory
            .join(format!("frame_{}.jpeg", self.next_index));
        self.next_index += 1;

        let jpeg = encode_jpeg(frame, self.quality)?;
        fs::write(&path, &jpeg).map_err(|e| {
            warn!(path = %path.display(), error = %e, "can't write output file");
            e
        })?;

        info!(path = %path.display(), sequence = frame.sequence, "Saved frame");
        metrics::counter!("frames_saved").increment(1);
        Ok(path)
    }
}
