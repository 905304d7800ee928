//! Application setup and main run loop with builder pattern.

use crate::config::{AppConfig, LoggingConfig};
use crate::output::JsonLinesRenderer;
use perch_capture::{
    CaptureSource, FrameStream, ImageSequenceCapture, StreamAdapter, SyntheticCapture,
};
use perch_track::ingest::RecordedPoseSource;
use perch_track::scene::{OverlayAsset, PLACEHOLDER_SIZE, load_or_placeholder};
use perch_track::{Session, TrackingStats};
use std::error::Error;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Builder for configuring and running the application.
pub struct AppBuilder {
    config: AppConfig,
}

impl AppBuilder {
    /// Create a new AppBuilder with default settings.
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Initialise logging, then run the session.
    pub fn run(self) -> Result<TrackingStats, Box<dyn Error>> {
        init_logging(&self.config.logging);
        self.run_session()
    }

    /// Run the session without touching the global subscriber.
    pub fn run_session(self) -> Result<TrackingStats, Box<dyn Error>> {
        let config = self.config;

        let poses_path = config
            .poses
            .as_deref()
            .ok_or("No pose recording configured. Pass --poses or set \"poses\" in the config")?;
        let mut poses =
            RecordedPoseSource::from_path(poses_path)?.with_latency(config.pose_latency_frames);

        let asset = match config.asset.as_deref() {
            Some(path) => load_or_placeholder(path),
            None => {
                info!("No overlay asset configured; using placeholder box");
                OverlayAsset::placeholder(PLACEHOLDER_SIZE)
            }
        };

        let mut frames = open_frames(&config, &poses)?;
        let (width, height) = frames.inner().resolution();
        let camera = config.camera.build(width, height);
        let mut session = Session::with_layout(camera, asset, config.placement, config.layout);

        let writer: Box<dyn Write> = match config.output.as_deref() {
            Some(path) => Box::new(std::io::BufWriter::new(std::fs::File::create(path)?)),
            None => Box::new(std::io::BufWriter::new(std::io::stdout().lock())),
        };
        let mut renderer = JsonLinesRenderer::new(writer);

        info!(
            "Starting session: {}x{} @ {:?} fps, layout {:?}",
            width,
            height,
            frames.frame_rate(),
            config.layout
        );
        let stats = session.run(&mut frames, &mut poses, &mut renderer)?;
        renderer.finish()?;
        Ok(stats)
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame source: the configured image directory, or enough synthetic frames to
/// deliver every recorded estimate.
fn open_frames(
    config: &AppConfig,
    poses: &RecordedPoseSource,
) -> Result<StreamAdapter<Box<dyn CaptureSource>>, Box<dyn Error>> {
    let source: Box<dyn CaptureSource> = match config.frames.as_deref() {
        Some(dir) => Box::new(ImageSequenceCapture::open(dir, config.video.fps)?),
        None => {
            let count = poses.last_frame().map_or(0, |last| last + 1);
            Box::new(SyntheticCapture::try_new(
                config.video.width,
                config.video.height,
                config.video.fps,
                count,
            )?)
        }
    };
    Ok(StreamAdapter::new(source))
}

fn init_logging(logging: &LoggingConfig) {
    #[cfg(feature = "tracy")]
    {
        if logging.enable_tracy {
            use tracing_subscriber::Layer;
            use tracing_subscriber::layer::SubscriberExt;
            use tracing_subscriber::util::SubscriberInitExt;
            tracing_subscriber::registry()
                .with(tracing_tracy::TracyLayer::default())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_filter(
                            tracing_subscriber::EnvFilter::try_from_default_env()
                                .unwrap_or_else(|_| logging.level.clone().into()),
                        ),
                )
                .init();
            return;
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    #[cfg(not(feature = "tracy"))]
    if logging.enable_tracy {
        tracing::warn!("Tracy requested but perch was built without the `tracy` feature");
    }
}

/// Log the end-of-run summary.
pub fn report(stats: &TrackingStats, output: Option<&Path>) {
    info!(
        "Tracked {} of {} frames ({} lost, {} awaiting pose)",
        stats.placed,
        stats.ticks(),
        stats.lost,
        stats.skipped
    );
    if let Some(path) = output {
        info!("Overlay transforms written to {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VideoConfig;
    use perch_track::placement::OverlayLayout;

    fn write_poses(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("poses.jsonl");
        let mut lines = String::new();
        for frame in 0..6 {
            let score = if frame == 3 { 0.1 } else { 0.9 };
            lines.push_str(&format!(
                r#"{{"frame":{frame},"subjects":[{{"keypoints":[{{"name":"left_shoulder","x":400,"y":300,"score":{score}}},{{"name":"right_shoulder","x":600,"y":320,"score":{score}}}]}}]}}"#
            ));
            lines.push('\n');
        }
        std::fs::write(&path, lines).unwrap();
        path
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_replay_writes_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.jsonl");
        let config = AppConfig {
            poses: Some(write_poses(dir.path())),
            output: Some(output.clone()),
            pose_latency_frames: 1,
            video: VideoConfig {
                width: 1280,
                height: 720,
                fps: 30.0,
            },
            ..AppConfig::default()
        };

        let stats = AppBuilder::new().with_config(config).run_session().unwrap();
        assert_eq!(stats.ticks(), 7);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.lost, 1);
        assert_eq!(stats.placed, 5);

        let lines = read_lines(&output);
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0]["overlays"][0]["visible"], false);
        assert_eq!(lines[1]["overlays"][0]["visible"], true);
        assert_eq!(lines[4]["overlays"][0]["visible"], false);
        assert_eq!(lines[1]["overlays"][0]["kind"], "box");
    }

    #[test]
    fn test_missing_asset_falls_back_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.jsonl");
        let config = AppConfig {
            poses: Some(write_poses(dir.path())),
            asset: Some(dir.path().join("missing.ply")),
            output: Some(output.clone()),
            layout: OverlayLayout::Paired { spread: 0.5 },
            ..AppConfig::default()
        };

        AppBuilder::new().with_config(config).run_session().unwrap();
        let lines = read_lines(&output);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0]["overlays"].as_array().unwrap().len(), 2);
        assert_eq!(lines[0]["overlays"][1]["kind"], "box");
    }

    #[test]
    fn test_poses_are_required() {
        assert!(AppBuilder::new().run_session().is_err());
    }
}
