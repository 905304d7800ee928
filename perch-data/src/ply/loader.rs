//! Binary point-cloud decoding.

use super::header::{PlyHeader, PlyProperty, PropertyType};
use super::{ParseError, ReadError};
use crate::types::{ColorSource, PointCloudRecord};
use std::path::Path;
use tracing::{debug, info};

/// First-order spherical-harmonics normalisation constant, `1 / (2 * sqrt(pi))`.
pub const SH_C0: f32 = 0.282_094_8;

/// Decode a spherical-harmonics DC coefficient into a `[0, 1]` color channel.
pub fn sh_dc_to_channel(raw: f32) -> f32 {
    (0.5 + SH_C0 * raw).clamp(0.0, 1.0)
}

enum ColorLayout<'a> {
    Rgb([&'a PlyProperty; 3]),
    ShDc([&'a PlyProperty; 3]),
    White,
}

/// Parse a binary little-endian point cloud held entirely in memory.
///
/// Only the flat vertex-record subset is supported: one `vertex` element of
/// scalar properties, with `x/y/z` positions and optional `red/green/blue` or
/// `f_dc_0/1/2` colors.
pub fn parse_point_cloud(bytes: &[u8]) -> Result<PointCloudRecord, ParseError> {
    let header = PlyHeader::parse(bytes)?;
    if header.vertex_count == 0 {
        return Err(ParseError::EmptyPointCloud);
    }

    let position = header
        .triple(["x", "y", "z"])
        .ok_or_else(|| ParseError::MissingPositionField(missing_position_fields(&header)))?;

    let color = if let Some(rgb) = header.triple(["red", "green", "blue"]) {
        ColorLayout::Rgb(rgb)
    } else if let Some(dc) = header.triple(["f_dc_0", "f_dc_1", "f_dc_2"]) {
        ColorLayout::ShDc(dc)
    } else {
        ColorLayout::White
    };

    let body = &bytes[header.body_offset..];
    let expected = header.body_len().ok_or_else(|| {
        ParseError::InvalidHeader(format!(
            "vertex count {} overflows the body length",
            header.vertex_count
        ))
    })?;
    if body.len() < expected {
        return Err(ParseError::Truncated {
            expected,
            actual: body.len(),
        });
    }

    // Bounded by the body length checked above.
    let count = header.vertex_count;
    let mut positions = Vec::with_capacity(count * 3);
    let mut colors = Vec::with_capacity(count * 3);

    for record in body[..expected].chunks_exact(header.stride) {
        for prop in position {
            positions.push(read_scalar(record, prop)?);
        }
        match &color {
            ColorLayout::Rgb(props) => {
                for prop in props {
                    let value = read_scalar(record, prop)?;
                    colors.push(match prop.ty {
                        PropertyType::UChar => value / 255.0,
                        _ => value.clamp(0.0, 1.0),
                    });
                }
            }
            ColorLayout::ShDc(props) => {
                for prop in props {
                    colors.push(sh_dc_to_channel(read_scalar(record, prop)?));
                }
            }
            ColorLayout::White => colors.extend_from_slice(&[1.0, 1.0, 1.0]),
        }
    }

    let color_source = match color {
        ColorLayout::Rgb(_) => ColorSource::Rgb,
        ColorLayout::ShDc(_) => ColorSource::SphericalHarmonicsDc,
        ColorLayout::White => ColorSource::Default,
    };
    debug!(
        "Decoded {} points (stride {} bytes, colors: {:?})",
        count, header.stride, color_source
    );

    PointCloudRecord::new(positions, colors, count, color_source).ok_or(ParseError::Truncated {
        expected,
        actual: body.len(),
    })
}

/// Read and decode a point-cloud file from disk.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_point_cloud(path: impl AsRef<Path>) -> Result<PointCloudRecord, ReadError> {
    let bytes = std::fs::read(path.as_ref())?;
    debug!("Read {} bytes", bytes.len());
    let record = parse_point_cloud(&bytes)?;
    info!("Point cloud loaded: {} points", record.len());
    Ok(record)
}

fn missing_position_fields(header: &PlyHeader) -> String {
    ["x", "y", "z"]
        .into_iter()
        .filter(|name| header.property(name).is_none())
        .collect::<Vec<_>>()
        .join(", ")
}

fn read_scalar(record: &[u8], prop: &PlyProperty) -> Result<f32, ParseError> {
    let end = prop.offset + prop.ty.size();
    let bytes = record
        .get(prop.offset..end)
        .ok_or_else(|| ParseError::FieldOutOfBounds(prop.name.clone()))?;
    // Lengths are fixed by the slice above.
    let value = match prop.ty {
        PropertyType::Float => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        PropertyType::Int => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
        PropertyType::UChar => bytes[0] as f32,
        PropertyType::Double => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(bytes);
            f64::from_le_bytes(raw) as f32
        }
    };
    Ok(value)
}
