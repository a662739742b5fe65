//! Capture demo: stream from a V4L2 camera for a fixed duration, converting
//! every frame and saving it as JPEG.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use tracing::{error, info, warn};

use uvcframe::capture::{self, StreamHandle};
use uvcframe::pipeline::CaptureContext;
use uvcframe::{utils, Config, Frame};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uvcframe=info".into()),
        )
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    info!("uvcframe starting");

    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    uvcframe::CONFIG.store(Arc::new(config));
    let mut config = Config::clone(&uvcframe::CONFIG.load());

    // Auto-detect capture device if needed
    if config.capture.device.is_empty() {
        let found = utils::auto_detect_device().await?;
        config.capture.device = found.path;
        config.capture.format = found.format;
    }
    info!("Using capture device: {}", config.capture.device);

    let mut context = CaptureContext::new(&config)?;
    let mut capture = capture::V4l2Capture::new(config.capture.clone(), StreamHandle(0))?;
    capture.start_stream()?;

    // Reused for every dequeued buffer
    let mut source = Frame::allocate(0)?;
    let duration = Duration::from_secs(config.pipeline.stream_duration_secs);
    let deadline = tokio::time::Instant::now() + duration;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!("Streaming for {:?}...", duration);
    while tokio::time::Instant::now() < deadline {
        let captured = tokio::select! {
            _ = &mut ctrl_c => {
                warn!("Interrupted");
                break;
            }
            captured = capture.capture_into(&mut source) => captured,
        };

        match captured {
            Ok(()) => {
                context.on_frame(&source);
            }
            Err(e) => {
                error!("Capture error: {}", e);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }

    let stats = context.stats();
    info!(
        received = stats.received,
        saved = stats.saved,
        skipped = stats.skipped,
        failed = stats.failed,
        "Done streaming"
    );
    source.release();
    Ok(())
}
