//! Binary point-cloud (PLY subset) parsing

mod header;
mod loader;
mod writer;

pub use header::{MAX_HEADER_BYTES, PlyHeader, PlyProperty, PropertyType};
pub use loader::{SH_C0, load_point_cloud, parse_point_cloud, sh_dc_to_channel};
pub use writer::{ColorEncoding, channel_to_sh_dc, encode_point_cloud};

use thiserror::Error;

/// Errors produced while decoding point-cloud bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no end_header marker within the header window")]
    MissingHeaderEnd,

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("unsupported format '{0}', expected binary_little_endian")]
    UnsupportedFormat(String),

    #[error("unknown property type '{0}'")]
    UnknownPropertyType(String),

    #[error("header does not declare a vertex count")]
    MissingVertexCount,

    #[error("point cloud declares zero vertices")]
    EmptyPointCloud,

    #[error("missing position field(s): {0}")]
    MissingPositionField(String),

    #[error("body truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("field '{0}' lies outside its record")]
    FieldOutOfBounds(String),
}

/// Errors produced while reading a point-cloud file.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}
