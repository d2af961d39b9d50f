//! Eye-watch - Main Entry Point

use anyhow::Context;
use camera_capture::{FrameSource, ImageSequenceSource, OpenCvCamera};
use clap::Parser;
use dms::{CascadeDetector, FrameSink, HighguiWindow, LogSink, Pipeline};
use drowsy_cli::{init_logging, resolve_settings, Cli, Settings};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const WINDOW_TITLE: &str = "Eye detection (q/ESC to quit)";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    init_logging(&settings.logging)?;

    info!("=== Eye-watch v{} ===", env!("CARGO_PKG_VERSION"));
    run(&cli, &settings)
}

fn run(cli: &Cli, settings: &Settings) -> anyhow::Result<()> {
    let args = cli.command.args();

    // Models first: a missing cascade should fail before the camera opens
    let detector = CascadeDetector::load(
        &settings.dms.face_cascade_path,
        &settings.dms.eye_cascade_path,
        settings.dms.detection_params(),
    )
    .context("failed to load cascade classifiers")?;

    let mut source: Box<dyn FrameSource> = match &args.input {
        Some(dir) => Box::new(
            ImageSequenceSource::open(dir, settings.camera.fps, settings.camera.mirror)
                .context("failed to open image sequence")?,
        ),
        None => Box::new(OpenCvCamera::open(&settings.camera).context("failed to open camera")?),
    };

    let mut sink: Box<dyn FrameSink> = if args.headless {
        Box::new(LogSink::new())
    } else {
        Box::new(HighguiWindow::open(WINDOW_TITLE).context("failed to open preview window")?)
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .context("failed to install Ctrl-C handler")?;
    }

    let mut pipeline = Pipeline::new(settings.dms.clone(), detector, Duration::ZERO)?;
    pipeline.run(source.frames(), sink.as_mut(), &stop)?;

    info!("Shutting down");
    Ok(())
}
