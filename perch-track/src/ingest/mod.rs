//! Data ingestion module
//!
//! Interfaces for the external collaborators feeding the per-frame loop:
//! - Video frames (dimensions, optional pixels)
//! - Pose estimates (named, scored 2D keypoints per subject)
//! - Recorded pose replay for headless runs and tests

pub mod frame;
pub mod keypoint;
pub mod pose_source;

pub use frame::{FrameStream, StreamError, VideoFrame};
pub use keypoint::{Joint, Keypoint, PoseFrame};
pub use pose_source::{PoseEstimate, PoseRecord, PoseSource, PoseSourceError, RecordedPoseSource};
