//! Blank frames at a fixed resolution and rate.

use crate::source::{CaptureError, CaptureSource, FrameData};
use tracing::{debug, info};

/// Produces `frame_count` frames without pixel data.
///
/// Used to replay recorded poses when no video is at hand.
#[derive(Debug, Clone)]
pub struct SyntheticCapture {
    width: u32,
    height: u32,
    fps: f32,
    frame_count: u64,
    next: u64,
    active: bool,
}

impl SyntheticCapture {
    pub fn new(width: u32, height: u32, fps: f32, frame_count: u64) -> Self {
        Self {
            width,
            height,
            fps,
            frame_count,
            next: 0,
            active: frame_count > 0,
        }
    }

    /// Validate the settings before building.
    pub fn try_new(width: u32, height: u32, fps: f32, frame_count: u64) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidSettings(format!(
                "resolution {width}x{height} has no pixels"
            )));
        }
        if !(fps.is_finite() && fps > 0.0) {
            return Err(CaptureError::InvalidSettings(format!("frame rate {fps}")));
        }
        Ok(Self::new(width, height, fps, frame_count))
    }

    pub fn frames_emitted(&self) -> u64 {
        self.next
    }
}

impl CaptureSource for SyntheticCapture {
    fn next_frame(&mut self) -> Result<Option<FrameData>, CaptureError> {
        if !self.active || self.next >= self.frame_count {
            self.active = false;
            return Ok(None);
        }

        let frame_number = self.next;
        let timestamp = frame_number as f64 / f64::from(self.fps);
        self.next += 1;
        if self.next == self.frame_count {
            self.active = false;
        }

        debug!("Synthetic frame {} at {:.3}s", frame_number, timestamp);
        Ok(Some(FrameData::blank(self.width, self.height, timestamp, frame_number)))
    }

    fn frame_rate(&self) -> Option<f32> {
        Some(self.fps)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn stop(&mut self) {
        if self.active {
            info!("Synthetic capture stopped after {} frames", self.next);
        }
        self.active = false;
    }
}
