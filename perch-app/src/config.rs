//! Application configuration, loaded from JSON.

use perch_track::placement::{OverlayLayout, PlacementConfig};
use perch_track::scene::CameraModel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    pub enable_tracy: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_tracy: false,
        }
    }
}

/// Configuration for the placement camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraConfig {
    /// Camera at the origin facing -Z for a video of the given size.
    pub fn build(&self, width: u32, height: u32) -> CameraModel {
        let mut camera = CameraModel::facing_forward(width, height).with_clip(self.near, self.far);
        camera.fov_y = self.fov_y_degrees.to_radians();
        camera
    }
}

/// Video settings used when frames are synthesised rather than read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30.0,
        }
    }
}

/// Complete application configuration. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub camera: CameraConfig,
    pub video: VideoConfig,
    pub placement: PlacementConfig,
    pub layout: OverlayLayout,
    /// Frames of delay between a video frame and its pose estimate.
    pub pose_latency_frames: u64,
    /// Overlay asset (binary PLY); the placeholder box is used when absent.
    pub asset: Option<PathBuf>,
    /// Pose recording (JSON lines).
    pub poses: Option<PathBuf>,
    /// Directory of video frames; synthetic frames are used when absent.
    pub frames: Option<PathBuf>,
    /// Output file for overlay transforms; stdout when absent.
    pub output: Option<PathBuf>,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }
}
