//! Motion tracking eye producer: detects the moving subject and multicasts the eye state.

use animatronic_eyes::config::Config;
use animatronic_eyes::motion::{CaptureSource, DetectionWorker, VideoSourceSpec};
use animatronic_eyes::shutdown::Shutdown;
use animatronic_eyes::tracker::TrackerApp;
use animatronic_eyes::transport::StatePublisher;
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera index, video file or stream URL
    #[arg(default_value = "0")]
    source: String,

    /// Record frames with detections, `{timestamp}` is replaced by the start time
    #[arg(short, long)]
    record: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Mirror the input horizontally
    #[arg(short, long)]
    mirrored: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Animatronic eyes tracker");

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    if args.mirrored {
        config.detection.mirrored = true;
    }
    if args.record.is_some() {
        config.recording.path = args.record;
    }
    config.validate().context("invalid configuration")?;

    let spec: VideoSourceSpec = args.source.parse()?;
    let worker = DetectionWorker::new(CaptureSource::new(spec), &config.detection)?
        .with_recording(&config.detection, &config.recording)
        .context("failed to open recording")?;
    let publisher = StatePublisher::new(&config.transport).context("failed to set up transport")?;

    let shutdown = Shutdown::new();
    shutdown.install()?;
    info!("Press Ctrl+C to exit");

    let mut app = TrackerApp::new(&config, publisher);
    app.run(worker, &shutdown)?;

    info!("Tracker shut down");
    Ok(())
}
