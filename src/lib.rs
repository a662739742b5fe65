pub mod capture;
pub mod convert;
pub mod encode;
pub mod error;
pub mod pipeline;
#[cfg(feature = "v4l2")]
pub mod utils;

use std::path::{Path, PathBuf};

use arc_swap::ArcSwap;
use capture::frame::PixelFormat;
use serde::{Deserialize, Serialize};

pub use capture::Frame;
pub use error::{Error, Result};

/// Global configuration that can be atomically swapped at runtime
pub static CONFIG: once_cell::sync::Lazy<ArcSwap<Config>> =
    once_cell::sync::Lazy::new(|| ArcSwap::from_pointee(Config::default()));

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub capture: CaptureConfig,
    pub output: OutputConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Device node, empty to auto-detect
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub format: PixelFormat,
    pub buffer_count: u32,
}

/// Channel order frames are converted to before being saved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorOrder {
    Rgb,
    /// Convert to BGR, then swap to RGB for the encoder
    Bgr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// JPEG quality, 0..=100
    pub quality: u8,
    pub order: ColorOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Log progress every N transport sequences, 0 disables
    pub log_interval: u32,
    pub stream_duration_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureConfig {
                device: String::new(),
                width: 640,
                height: 480,
                fps: 30,
                format: PixelFormat::Yuyv,
                buffer_count: 4,
            },
            output: OutputConfig {
                directory: PathBuf::from("."),
                quality: encode::DEFAULT_QUALITY,
                order: ColorOrder::Bgr,
            },
            pipeline: PipelineConfig {
                log_interval: 30,
                stream_duration_secs: 3,
            },
        }
    }
}

impl Config {
    /// Layer defaults, an optional TOML file and `UVCFRAME__*` environment
    /// variables, later sources winning.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("UVCFRAME")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}
