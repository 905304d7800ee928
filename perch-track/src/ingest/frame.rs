//! Video frame interfaces for the per-frame loop

use image::RgbImage;

/// A single frame from a video source
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Timestamp in seconds (relative to stream start)
    pub timestamp: f64,
    /// Monotonic frame counter
    pub frame_number: u64,
    /// Pixel data, when the source decodes it
    pub image: Option<RgbImage>,
}

impl VideoFrame {
    /// Create a frame that only carries its dimensions
    pub fn new(width: u32, height: u32, timestamp: f64, frame_number: u64) -> Self {
        Self {
            width,
            height,
            timestamp,
            frame_number,
            image: None,
        }
    }

    /// Create a frame from decoded pixels
    pub fn from_image(image: RgbImage, timestamp: f64, frame_number: u64) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            timestamp,
            frame_number,
            image: Some(image),
        }
    }

    /// Get frame dimensions (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for video frame sources
pub trait FrameStream {
    /// Get the next frame from the stream
    /// Returns None when the stream ends
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, StreamError>;

    /// Get the frame rate (frames per second), if known
    fn frame_rate(&self) -> Option<f32>;

    /// Check if the stream is still active
    fn is_active(&self) -> bool;
}

/// Errors that can occur during stream processing
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image decoding error: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("Invalid frame data: {0}")]
    InvalidData(String),
}
