//! Overlay assets: the 3D object drawn on the subject's back.

use crate::placement::Placement;
use glam::Vec3;
use perch_data::{Bounds, ColorSource, PointCloudRecord, ReadError, load_point_cloud};
use std::path::Path;
use tracing::{info, warn};

/// Extent of the placeholder box used when no asset can be loaded.
pub const PLACEHOLDER_SIZE: Vec3 = Vec3::new(1.0, 0.6, 0.1);

/// Errors that can occur while loading an overlay asset.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read asset: {0}")]
    Read(#[from] ReadError),
    #[error("asset has no finite positions")]
    NoFinitePositions,
}

/// Geometry backing an overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayGeometry {
    /// Axis-aligned box placeholder of the given extent.
    Box { size: Vec3 },
    /// Colored points drawn as-is.
    PointCloud(PointCloudRecord),
    /// Gaussian-splat centers with colors decoded from spherical harmonics.
    Splat(PointCloudRecord),
}

impl OverlayGeometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::PointCloud(_) => "point_cloud",
            Self::Splat(_) => "splat",
        }
    }

    pub fn point_count(&self) -> usize {
        match self {
            Self::Box { .. } => 0,
            Self::PointCloud(record) | Self::Splat(record) => record.len(),
        }
    }
}

/// A loaded overlay object.
///
/// Geometry and bounds are fixed at load time; only the transform and
/// visibility change from frame to frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayAsset {
    geometry: OverlayGeometry,
    bounds: Bounds,
    pub position: Vec3,
    /// Uniform scale applied on all three axes.
    pub scale: Vec3,
    /// Euler angles (pitch, yaw, roll) in radians.
    pub rotation: Vec3,
    pub visible: bool,
}

impl OverlayAsset {
    fn with_geometry(geometry: OverlayGeometry, bounds: Bounds) -> Self {
        Self {
            geometry,
            bounds,
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            visible: false,
        }
    }

    /// Box placeholder centred on the origin.
    pub fn placeholder(size: Vec3) -> Self {
        Self::with_geometry(OverlayGeometry::Box { size }, Bounds::centered(size))
    }

    /// Wrap a decoded record; colors from spherical harmonics mark it as a splat.
    pub fn from_point_cloud(record: PointCloudRecord) -> Result<Self, LoadError> {
        let bounds = record.bounds().ok_or(LoadError::NoFinitePositions)?;
        let geometry = match record.color_source {
            ColorSource::SphericalHarmonicsDc => OverlayGeometry::Splat(record),
            ColorSource::Rgb | ColorSource::Default => OverlayGeometry::PointCloud(record),
        };
        Ok(Self::with_geometry(geometry, bounds))
    }

    pub fn geometry(&self) -> &OverlayGeometry {
        &self.geometry
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Bounding-box extent, computed once at load.
    pub fn bounding_box_size(&self) -> Vec3 {
        self.bounds.size()
    }

    /// Copy a placement's transform onto the asset.
    pub fn apply(&mut self, placement: &Placement) {
        self.position = placement.position;
        self.rotation = placement.rotation;
        self.scale = Vec3::splat(placement.scale);
    }
}

/// Load a point-cloud or splat asset from disk.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_overlay_asset(path: impl AsRef<Path>) -> Result<OverlayAsset, LoadError> {
    let record = load_point_cloud(path.as_ref())?;
    let asset = OverlayAsset::from_point_cloud(record)?;
    info!(
        "Overlay asset loaded: {} with {} points, bounds {:?}",
        asset.geometry().kind(),
        asset.geometry().point_count(),
        asset.bounding_box_size()
    );
    Ok(asset)
}

/// Load an asset, falling back to the box placeholder on any failure.
pub fn load_or_placeholder(path: impl AsRef<Path>) -> OverlayAsset {
    load_overlay_asset(path.as_ref()).unwrap_or_else(|err| {
        warn!(
            "Could not load overlay {}: {}; using placeholder box",
            path.as_ref().display(),
            err
        );
        OverlayAsset::placeholder(PLACEHOLDER_SIZE)
    })
}
