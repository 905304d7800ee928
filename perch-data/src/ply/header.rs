//! Header parsing and stride layout for binary point-cloud files.

use super::ParseError;

/// Upper bound on how many leading bytes are searched for the header.
pub const MAX_HEADER_BYTES: usize = 4096;

const END_HEADER: &[u8] = b"end_header";

/// Scalar property types understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Float,
    Double,
    UChar,
    Int,
}

impl PropertyType {
    /// Parse a PLY type keyword, accepting both the classic and sized spellings.
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "float" | "float32" => Some(Self::Float),
            "double" | "float64" => Some(Self::Double),
            "uchar" | "uint8" => Some(Self::UChar),
            "int" | "int32" => Some(Self::Int),
            _ => None,
        }
    }

    /// Size in bytes of one value.
    pub fn size(self) -> usize {
        match self {
            Self::Float | Self::Int => 4,
            Self::Double => 8,
            Self::UChar => 1,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Double => "double",
            Self::UChar => "uchar",
            Self::Int => "int",
        }
    }
}

/// One named field of a vertex record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyProperty {
    pub name: String,
    pub ty: PropertyType,
    /// Byte offset of this field inside a record.
    pub offset: usize,
}

/// Parsed vertex layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyHeader {
    /// Number of vertex records declared by `element vertex N`.
    pub vertex_count: usize,
    pub properties: Vec<PlyProperty>,
    /// Bytes per vertex record.
    pub stride: usize,
    /// Length of the header including the trailing newline; the body starts here.
    pub body_offset: usize,
}

impl PlyHeader {
    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&PlyProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Look up three properties at once, only succeeding if all exist.
    pub fn triple(&self, names: [&str; 3]) -> Option<[&PlyProperty; 3]> {
        Some([
            self.property(names[0])?,
            self.property(names[1])?,
            self.property(names[2])?,
        ])
    }

    /// Bytes the body must hold for every declared record, `None` on overflow.
    pub fn body_len(&self) -> Option<usize> {
        self.vertex_count.checked_mul(self.stride)
    }

    /// Parse the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let window = &bytes[..bytes.len().min(MAX_HEADER_BYTES)];
        let body_offset = find_header_end(window).ok_or(ParseError::MissingHeaderEnd)?;
        let text = std::str::from_utf8(&window[..body_offset])
            .map_err(|_| ParseError::InvalidHeader("header is not valid UTF-8".to_string()))?;

        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        if lines.next() != Some("ply") {
            return Err(ParseError::InvalidHeader("missing 'ply' magic".to_string()));
        }

        let mut vertex_count = None;
        let mut properties = Vec::new();
        let mut stride = 0;
        // Properties of elements other than `vertex` are not part of the record.
        let mut in_vertex = false;
        let mut elements = 0usize;

        for line in lines {
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("format") => {
                    let format = tokens.next().unwrap_or_default();
                    if format != "binary_little_endian" {
                        return Err(ParseError::UnsupportedFormat(format.to_string()));
                    }
                }
                Some("element") => {
                    let name = tokens.next().unwrap_or_default();
                    in_vertex = name == "vertex";
                    elements += 1;
                    // The body is read as flat vertex records from its first byte.
                    if in_vertex && elements > 1 {
                        return Err(ParseError::InvalidHeader(
                            "vertex must be the first element".to_string(),
                        ));
                    }
                    if in_vertex {
                        let count = tokens.next().ok_or(ParseError::MissingVertexCount)?;
                        let count = count.parse::<usize>().map_err(|_| {
                            ParseError::InvalidHeader(format!("bad vertex count '{count}'"))
                        })?;
                        vertex_count = Some(count);
                    }
                }
                Some("property") if in_vertex => {
                    let (ty, name) = match (tokens.next(), tokens.next()) {
                        (Some("list"), _) => {
                            return Err(ParseError::UnknownPropertyType("list".to_string()));
                        }
                        (Some(ty), Some(name)) => (ty, name),
                        _ => {
                            return Err(ParseError::InvalidHeader(format!(
                                "malformed property line '{line}'"
                            )));
                        }
                    };
                    let ty = PropertyType::parse(ty)
                        .ok_or_else(|| ParseError::UnknownPropertyType(ty.to_string()))?;
                    properties.push(PlyProperty {
                        name: name.to_string(),
                        ty,
                        offset: stride,
                    });
                    stride += ty.size();
                }
                Some("end_header") => break,
                _ => {}
            }
        }

        let vertex_count = vertex_count.ok_or(ParseError::MissingVertexCount)?;
        let header = Self {
            vertex_count,
            properties,
            stride,
            body_offset,
        };
        if header.body_len().is_none() {
            return Err(ParseError::InvalidHeader(format!(
                "vertex count {vertex_count} overflows the body length"
            )));
        }
        Ok(header)
    }
}

/// Offset just past the line that reads exactly `end_header`.
fn find_header_end(bytes: &[u8]) -> Option<usize> {
    let mut start = 0;
    while let Some(len) = bytes[start..].iter().position(|&b| b == b'\n') {
        let end = start + len;
        if bytes[start..end].trim_ascii() == END_HEADER {
            return Some(end + 1);
        }
        start = end + 1;
    }
    None
}
