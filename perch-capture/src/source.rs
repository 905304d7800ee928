//! Common capture source types and traits.

use image::RgbImage;
use perch_track::ingest::{FrameStream, StreamError, VideoFrame};
use thiserror::Error;

/// Errors that can occur during capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Failed to decode frame {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Frame {frame} is {actual:?}, expected {expected:?}")]
    ResolutionChanged {
        frame: u64,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Invalid capture settings: {0}")]
    InvalidSettings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw frame data from a capture source.
#[derive(Debug, Clone)]
pub struct FrameData {
    pub width: u32,
    pub height: u32,
    /// RGB pixels; synthetic sources leave this empty.
    pub image: Option<RgbImage>,
    /// Frame timestamp in seconds (relative to stream start).
    pub timestamp: f64,
    /// Zero-based frame number.
    pub frame_number: u64,
}

impl FrameData {
    /// Create a frame from decoded pixels.
    pub fn new(image: RgbImage, timestamp: f64, frame_number: u64) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            image: Some(image),
            timestamp,
            frame_number,
        }
    }

    /// Create a frame without pixel data.
    pub fn blank(width: u32, height: u32, timestamp: f64, frame_number: u64) -> Self {
        Self {
            width,
            height,
            image: None,
            timestamp,
            frame_number,
        }
    }

    /// Get image dimensions (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<FrameData> for VideoFrame {
    fn from(frame: FrameData) -> Self {
        match frame.image {
            Some(image) => VideoFrame::from_image(image, frame.timestamp, frame.frame_number),
            None => VideoFrame::new(frame.width, frame.height, frame.timestamp, frame.frame_number),
        }
    }
}

/// Trait for capture sources that provide video frames.
///
/// This is a lower-level trait than `FrameStream`; wrap a source in
/// [`StreamAdapter`] to drive a tracking session with it.
pub trait CaptureSource {
    /// Get the next frame from the source.
    fn next_frame(&mut self) -> Result<Option<FrameData>, CaptureError>;

    /// Get the frame rate, if known.
    fn frame_rate(&self) -> Option<f32>;

    /// Get the resolution (width, height).
    fn resolution(&self) -> (u32, u32);

    /// Check if the source is still active.
    fn is_active(&self) -> bool;

    /// Stop capturing.
    fn stop(&mut self);
}

impl<S: CaptureSource + ?Sized> CaptureSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<FrameData>, CaptureError> {
        (**self).next_frame()
    }

    fn frame_rate(&self) -> Option<f32> {
        (**self).frame_rate()
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

/// Exposes a capture source as a [`FrameStream`].
pub struct StreamAdapter<S: CaptureSource> {
    source: S,
}

impl<S: CaptureSource> StreamAdapter<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Get the underlying source.
    pub fn inner(&self) -> &S {
        &self.source
    }

    /// Get the underlying source mutably.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: CaptureSource> FrameStream for StreamAdapter<S> {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, StreamError> {
        match self.source.next_frame() {
            Ok(frame) => Ok(frame.map(VideoFrame::from)),
            Err(CaptureError::Io(e)) => Err(StreamError::Io(e)),
            Err(CaptureError::Decode { source, .. }) => Err(StreamError::ImageDecode(source)),
            Err(e) => Err(StreamError::InvalidData(e.to_string())),
        }
    }

    fn frame_rate(&self) -> Option<f32> {
        self.source.frame_rate()
    }

    fn is_active(&self) -> bool {
        self.source.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyntheticCapture;

    #[test]
    fn test_frame_data_into_video_frame() {
        let blank: VideoFrame = FrameData::blank(320, 240, 0.5, 7).into();
        assert_eq!(blank.dimensions(), (320, 240));
        assert_eq!(blank.frame_number, 7);
        assert!(blank.image.is_none());

        let decoded: VideoFrame = FrameData::new(RgbImage::new(4, 2), 0.0, 0).into();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert!(decoded.image.is_some());
    }

    #[test]
    fn test_adapter_forwards_frames() {
        let mut stream = StreamAdapter::new(SyntheticCapture::new(64, 48, 25.0, 2));
        assert_eq!(stream.frame_rate(), Some(25.0));
        assert!(stream.is_active());

        let first = stream.next_frame().unwrap().unwrap();
        assert_eq!(first.frame_number, 0);
        assert_eq!(first.dimensions(), (64, 48));
        let second = stream.next_frame().unwrap().unwrap();
        assert!((second.timestamp - 0.04).abs() < 1e-9);
        assert!(stream.next_frame().unwrap().is_none());
        assert!(!stream.is_active());
    }
}
