//! Overlay placement
//!
//! Converts confident shoulder keypoints into a smoothed 3D transform for
//! each overlay, frame over frame.

pub mod config;
pub mod engine;
pub mod layout;
pub mod smoothing;

pub use config::PlacementConfig;
pub use engine::{
    Placement, PlacementEngine, RAY_Z_EPSILON, pixel_to_ndc, scale_factor, target_transform,
    unproject_to_depth,
};
pub use layout::{OverlayLayout, OverlaySlot};
pub use smoothing::{LossPolicy, SmoothedTransform};
