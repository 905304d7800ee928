//! Frames read from a directory of still images.

use crate::source::{CaptureError, CaptureSource, FrameData};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Decodes the images of a directory in file-name order, one per frame.
///
/// Every image must share the resolution of the first one.
#[derive(Debug)]
pub struct ImageSequenceCapture {
    paths: Vec<PathBuf>,
    fps: f32,
    resolution: (u32, u32),
    next: usize,
    active: bool,
}

impl ImageSequenceCapture {
    #[tracing::instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn open(dir: impl AsRef<Path>, fps: f32) -> Result<Self, CaptureError> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(CaptureError::InvalidSettings(format!("frame rate {fps}")));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.is_file() && is_image(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let first = paths.first().ok_or_else(|| {
            CaptureError::SourceNotFound(format!("no images in {}", dir.as_ref().display()))
        })?;
        let resolution = image::image_dimensions(first).map_err(|source| CaptureError::Decode {
            path: first.display().to_string(),
            source,
        })?;

        info!(
            "Image sequence: {} frames at {}x{}",
            paths.len(),
            resolution.0,
            resolution.1
        );
        Ok(Self {
            paths,
            fps,
            resolution,
            next: 0,
            active: true,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl CaptureSource for ImageSequenceCapture {
    fn next_frame(&mut self) -> Result<Option<FrameData>, CaptureError> {
        let Some(path) = self.paths.get(self.next).filter(|_| self.active) else {
            self.active = false;
            return Ok(None);
        };

        let image = image::open(path)
            .map_err(|source| CaptureError::Decode {
                path: path.display().to_string(),
                source,
            })?
            .to_rgb8();

        let frame_number = self.next as u64;
        if image.dimensions() != self.resolution {
            return Err(CaptureError::ResolutionChanged {
                frame: frame_number,
                expected: self.resolution,
                actual: image.dimensions(),
            });
        }

        let timestamp = frame_number as f64 / f64::from(self.fps);
        debug!("Decoded {} as frame {}", path.display(), frame_number);
        self.next += 1;
        if self.next == self.paths.len() {
            self.active = false;
        }
        Ok(Some(FrameData::new(image, timestamp, frame_number)))
    }

    fn frame_rate(&self) -> Option<f32> {
        Some(self.fps)
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn stop(&mut self) {
        self.active = false;
    }
}
