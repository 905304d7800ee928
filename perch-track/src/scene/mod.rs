//! Scene representation for overlay placement
//!
//! The camera the overlay is placed through and the overlay assets
//! themselves.

pub mod camera;
pub mod overlay;

pub use camera::CameraModel;
pub use overlay::{
    LoadError, OverlayAsset, OverlayGeometry, PLACEHOLDER_SIZE, load_or_placeholder,
    load_overlay_asset,
};
