//! Core data types for decoded point clouds.
//!
//! These are CPU-side representations shared by the overlay loader and the
//! placement engine. Nothing here knows about rendering.

use glam::Vec3;

/// Where the decoded colors came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSource {
    /// Plain `red/green/blue` properties.
    Rgb,
    /// Spherical-harmonics DC term (`f_dc_0/1/2`), as written by splat trainers.
    SphericalHarmonicsDc,
    /// No color properties; every point is white.
    Default,
}

/// Flat output of the point-cloud parser.
///
/// `positions` and `colors` hold one xyz / rgb triple per point, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloudRecord {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub point_count: usize,
    pub color_source: ColorSource,
}

impl PointCloudRecord {
    /// Build a record from pre-flattened arrays.
    ///
    /// Returns `None` if the arrays disagree with `point_count`.
    pub fn new(
        positions: Vec<f32>,
        colors: Vec<f32>,
        point_count: usize,
        color_source: ColorSource,
    ) -> Option<Self> {
        let len = point_count.checked_mul(3)?;
        if positions.len() != len || colors.len() != len {
            return None;
        }
        Some(Self {
            positions,
            colors,
            point_count,
            color_source,
        })
    }

    pub fn len(&self) -> usize {
        self.point_count
    }

    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }

    /// Position of the point at `index`.
    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.positions
            .get(index * 3..index * 3 + 3)
            .map(Vec3::from_slice)
    }

    /// Color of the point at `index`.
    pub fn color(&self, index: usize) -> Option<Vec3> {
        self.colors.get(index * 3..index * 3 + 3).map(Vec3::from_slice)
    }

    /// Axis-aligned bounds of all positions, or `None` for an empty record.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.positions.chunks_exact(3).map(Vec3::from_slice))
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// A box of the given extent centred on the origin.
    pub fn centered(size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: -half,
            max: half,
        }
    }

    /// Fold an iterator of positions into bounds; non-finite positions are ignored.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut bounds: Option<Self> = None;
        for p in points.into_iter().filter(|p| p.is_finite()) {
            bounds = Some(match bounds {
                Some(b) => Self::new(b.min.min(p), b.max.max(p)),
                None => Self::new(p, p),
            });
        }
        bounds
    }

    /// Per-axis extent.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Mean of the three extents, used to normalise overlay scale.
    pub fn average_dimension(&self) -> f32 {
        let size = self.size();
        (size.x + size.y + size.z) / 3.0
    }
}
