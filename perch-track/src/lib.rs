//! Perch tracking crate
//!
//! Places a 3D overlay on a person's upper back from 2D pose keypoints, one
//! video frame at a time.
//!
//! ## Modules
//!
//! - [`ingest`]: Video frames, pose keypoints and pose sources
//! - [`extract`]: Confidence-gated shoulder and hip extraction
//! - [`placement`]: Pose-to-world transform and temporal smoothing
//! - [`scene`]: Camera model and overlay assets
//! - [`session`]: The per-frame driver tying the above together

pub mod extract;
pub mod ingest;
pub mod placement;
pub mod scene;
pub mod session;

pub use ingest::{PoseFrame, PoseSource, VideoFrame};
pub use placement::{Placement, PlacementConfig, PlacementEngine};
pub use scene::{CameraModel, OverlayAsset};
pub use session::{OverlayRenderer, Session, SessionError, TickOutcome, TrackingStats};
