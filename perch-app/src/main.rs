//! Perch Application
//!
//! Replays recorded pose estimates against a video (or synthetic frames) and
//! writes the resulting overlay transforms as JSON lines.
//!
//! Features:
//! - JSON configuration with every field defaulted
//! - Point-cloud and splat assets, with a placeholder box fallback
//! - Single or paired overlay layouts

mod app;
mod config;
mod output;

use clap::Parser;
use config::AppConfig;
use std::error::Error;
use std::path::PathBuf;

/// Perch - pose-driven overlay placement
#[derive(Parser, Debug)]
#[command(name = "perch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overlay asset (binary little-endian PLY)
    #[arg(short, long)]
    asset: Option<PathBuf>,

    /// Pose recording (JSON lines, one record per frame)
    #[arg(short, long)]
    poses: Option<PathBuf>,

    /// Directory of video frames, read in file-name order
    #[arg(short, long)]
    frames: Option<PathBuf>,

    /// Treat the capture as mirrored (front-facing camera)
    #[arg(short, long)]
    mirrored: bool,

    /// Output file for overlay transforms (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<AppConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        if self.asset.is_some() {
            config.asset = self.asset;
        }
        if self.poses.is_some() {
            config.poses = self.poses;
        }
        if self.frames.is_some() {
            config.frames = self.frames;
        }
        if self.output.is_some() {
            config.output = self.output;
        }
        if self.mirrored {
            config.placement.mirrored = true;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        Ok(config)
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = args.into_config()?;
    let output = config.output.clone();
    let stats = app::AppBuilder::new().with_config(config).run()?;
    app::report(&stats, output.as_deref());
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}
