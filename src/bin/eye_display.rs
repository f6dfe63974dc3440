//! Eye display: joins the multicast group and renders one eye.

use animatronic_eyes::animation::Eye;
use animatronic_eyes::config::Config;
use animatronic_eyes::display::{EyeDisplay, LogSurface};
use animatronic_eyes::shutdown::Shutdown;
use animatronic_eyes::transport::StateSubscriber;
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Render the left eye
    #[arg(long, conflicts_with = "right")]
    left: bool,

    /// Render the right eye (default)
    #[arg(long)]
    right: bool,

    /// Do not animate locally before the tracker is heard
    #[arg(long)]
    no_idle: bool,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

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

    let config = if let Some(config_path) = &args.config {
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
    config.validate().context("invalid configuration")?;

    let eye = if args.left { Eye::Left } else { Eye::Right };
    info!("Animatronic eyes display, {:?} eye", eye);

    let subscriber = StateSubscriber::new(&config.transport).context("failed to join multicast group")?;
    let mut display = EyeDisplay::new(subscriber, LogSurface::new(eye), &config.animation, !args.no_idle);

    let shutdown = Shutdown::new();
    shutdown.install()?;
    display.run(&shutdown.token());

    info!("Display shut down after {} frames", display.surface().frames());
    Ok(())
}
