//! Perch Data Crate
//!
//! Decoding for the point-cloud and splat assets drawn as overlays.
//! This crate is GPU-agnostic and focuses on data parsing and geometry.

pub mod ply;
pub mod types;

pub use ply::{ParseError, ReadError, load_point_cloud, parse_point_cloud};
pub use types::{Bounds, ColorSource, PointCloudRecord};
