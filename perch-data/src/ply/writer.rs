//! Binary encoder for the same flat vertex-record subset the loader reads.

use super::loader::SH_C0;

/// How colors are stored in an encoded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorEncoding {
    /// `uchar red/green/blue`, colors in `[0, 1]` quantised to bytes.
    Rgb8,
    /// `float f_dc_0/1/2`, values written as-is (raw spherical-harmonics DC terms).
    ShDc,
    /// No color properties.
    None,
}

/// Convert a `[0, 1]` color channel into the DC coefficient that decodes back to it.
pub fn channel_to_sh_dc(channel: f32) -> f32 {
    (channel - 0.5) / SH_C0
}

/// Encode positions (and colors) as a binary little-endian point cloud.
///
/// `positions` holds xyz triples. `colors` must match it for [`ColorEncoding::Rgb8`]
/// and [`ColorEncoding::ShDc`] and is ignored for [`ColorEncoding::None`].
pub fn encode_point_cloud(positions: &[f32], colors: &[f32], encoding: ColorEncoding) -> Vec<u8> {
    let count = positions.len() / 3;
    let mut header = format!(
        "ply\nformat binary_little_endian 1.0\ncomment perch\nelement vertex {count}\n\
         property float x\nproperty float y\nproperty float z\n"
    );
    match encoding {
        ColorEncoding::Rgb8 => {
            header.push_str("property uchar red\nproperty uchar green\nproperty uchar blue\n")
        }
        ColorEncoding::ShDc => {
            header.push_str("property float f_dc_0\nproperty float f_dc_1\nproperty float f_dc_2\n")
        }
        ColorEncoding::None => {}
    }
    header.push_str("end_header\n");

    let mut bytes = header.into_bytes();
    for i in 0..count {
        for value in &positions[i * 3..i * 3 + 3] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        let color = colors.get(i * 3..i * 3 + 3).unwrap_or(&[1.0, 1.0, 1.0]);
        match encoding {
            ColorEncoding::Rgb8 => {
                bytes.extend(color.iter().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8));
            }
            ColorEncoding::ShDc => {
                for value in color {
                    bytes.extend_from_slice(&value.to_le_bytes());
                }
            }
            ColorEncoding::None => {}
        }
    }
    bytes
}
