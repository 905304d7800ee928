//! Perch Capture - Video frames for the placement loop
//!
//! This crate provides frame sources that feed the `FrameStream` trait from
//! perch-track:
//!
//! - Synthetic blank frames at a fixed resolution, for replaying recorded poses
//! - Image sequences read from a directory
//!
//! ## Example
//!
//! ```ignore
//! use perch_capture::{ImageSequenceCapture, StreamAdapter};
//! use perch_track::ingest::FrameStream;
//!
//! let mut frames = StreamAdapter::new(ImageSequenceCapture::open("frames/", 30.0)?);
//! while let Some(frame) = frames.next_frame()? {
//!     // Process frame...
//! }
//! ```

mod sequence;
mod source;
mod synthetic;

pub use sequence::ImageSequenceCapture;
pub use source::{CaptureError, CaptureSource, FrameData, StreamAdapter};
pub use synthetic::SyntheticCapture;

// Re-export FrameStream trait for convenience
pub use perch_track::ingest::{FrameStream, StreamError, VideoFrame};
