//! STL decoding into triangle-list geometry
//!
//! Both encodings are accepted:
//! - Binary: 80-byte header, little-endian u32 facet count, then 50 bytes per facet
//!   (normal, three vertices, u16 attribute byte count)
//! - ASCII: `solid` / `facet normal` / `outer loop` / `vertex` / `endsolid`
//!
//! The encoding is detected the same way common web loaders do it: a buffer whose
//! length matches the binary layout exactly is binary, otherwise a buffer starting
//! with `solid` is parsed as text.

use glam::Vec3;
use thiserror::Error;

use crate::bounds::Aabb;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

#[derive(Error, Debug, PartialEq)]
pub enum StlError {
    #[error("STL data too short ({0} bytes)")]
    TooShort(usize),
    #[error("Binary STL length mismatch: {count} facets need {expected} bytes, got {actual}")]
    LengthMismatch {
        count: u32,
        expected: usize,
        actual: usize,
    },
    #[error("ASCII STL is not valid UTF-8")]
    InvalidText,
    #[error("ASCII STL parse error at line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("STL contains no triangles")]
    Empty,
}

/// Non-indexed triangle list; every three positions form one triangle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl Geometry {
    /// Build from triangles, computing flat normals
    pub fn from_triangles(triangles: impl IntoIterator<Item = [Vec3; 3]>) -> Self {
        let mut geometry = Self::default();
        for triangle in triangles {
            geometry.push(triangle, Vec3::ZERO);
        }
        geometry
    }

    fn push(&mut self, triangle: [Vec3; 3], normal: Vec3) {
        let normal = if normal.length_squared() > 0.0 {
            normal.normalize()
        } else {
            face_normal(triangle)
        };
        self.positions.extend_from_slice(&triangle);
        self.normals.extend_from_slice(&[normal; 3]);
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.len() < 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.positions.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Encode as binary STL
    pub fn to_binary_stl(&self) -> Vec<u8> {
        let count = self.triangle_count();
        let mut out = Vec::with_capacity(HEADER_LEN + 4 + count * FACET_LEN);
        let mut header = [0u8; HEADER_LEN];
        let tag = b"aorta binary stl";
        header[..tag.len()].copy_from_slice(tag);
        out.extend_from_slice(&header);
        out.extend_from_slice(&(count as u32).to_le_bytes());

        for (i, triangle) in self.triangles().enumerate() {
            let normal = self.normals.get(i * 3).copied().unwrap_or(Vec3::ZERO);
            for v in std::iter::once(normal).chain(triangle) {
                for c in v.to_array() {
                    out.extend_from_slice(&c.to_le_bytes());
                }
            }
            out.extend_from_slice(&0u16.to_le_bytes());
        }
        out
    }
}

fn face_normal([a, b, c]: [Vec3; 3]) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

/// Decode an STL buffer. Geometry without triangles is an error.
pub fn decode(bytes: &[u8]) -> Result<Geometry, StlError> {
    let geometry = if is_binary(bytes) {
        decode_binary(bytes)?
    } else if starts_with_solid(bytes) {
        decode_ascii(bytes)?
    } else {
        // Not text; report against the binary layout
        decode_binary(bytes)?
    };

    if geometry.is_empty() {
        return Err(StlError::Empty);
    }
    Ok(geometry)
}

fn facet_count(bytes: &[u8]) -> Option<u32> {
    let raw = bytes.get(HEADER_LEN..HEADER_LEN + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn is_binary(bytes: &[u8]) -> bool {
    facet_count(bytes)
        .map(|count| HEADER_LEN + 4 + count as usize * FACET_LEN == bytes.len())
        .unwrap_or(false)
}

fn starts_with_solid(bytes: &[u8]) -> bool {
    let trimmed = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|start| &bytes[start..])
        .unwrap_or(&[]);
    trimmed.len() >= 5 && trimmed[..5].eq_ignore_ascii_case(b"solid")
}

fn decode_binary(bytes: &[u8]) -> Result<Geometry, StlError> {
    let count = facet_count(bytes).ok_or(StlError::TooShort(bytes.len()))?;
    let expected = HEADER_LEN + 4 + count as usize * FACET_LEN;
    if expected != bytes.len() {
        return Err(StlError::LengthMismatch {
            count,
            expected,
            actual: bytes.len(),
        });
    }

    let read_vec3 = |chunk: &[u8]| {
        let f = |i: usize| f32::from_le_bytes([chunk[i], chunk[i + 1], chunk[i + 2], chunk[i + 3]]);
        Vec3::new(f(0), f(4), f(8))
    };

    let mut geometry = Geometry {
        positions: Vec::with_capacity(count as usize * 3),
        normals: Vec::with_capacity(count as usize * 3),
    };
    for facet in bytes[HEADER_LEN + 4..].chunks_exact(FACET_LEN) {
        let normal = read_vec3(&facet[0..12]);
        let triangle = [
            read_vec3(&facet[12..24]),
            read_vec3(&facet[24..36]),
            read_vec3(&facet[36..48]),
        ];
        geometry.push(triangle, normal);
    }
    Ok(geometry)
}

fn decode_ascii(bytes: &[u8]) -> Result<Geometry, StlError> {
    let text = std::str::from_utf8(bytes).map_err(|_| StlError::InvalidText)?;

    let mut geometry = Geometry::default();
    let mut normal = Vec3::ZERO;
    let mut vertices: Vec<Vec3> = Vec::with_capacity(3);

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "facet" => {
                // "facet normal nx ny nz"
                if tokens.next().map(|t| t.eq_ignore_ascii_case("normal")) != Some(true) {
                    return Err(syntax(line_no, "expected 'facet normal'"));
                }
                normal = parse_vec3(&mut tokens, line_no)?;
                vertices.clear();
            }
            "vertex" => {
                vertices.push(parse_vec3(&mut tokens, line_no)?);
            }
            "endfacet" => {
                if vertices.len() != 3 {
                    return Err(syntax(
                        line_no,
                        &format!("facet has {} vertices, expected 3", vertices.len()),
                    ));
                }
                geometry.push([vertices[0], vertices[1], vertices[2]], normal);
                vertices.clear();
            }
            "solid" | "endsolid" | "outer" | "endloop" => {}
            other => {
                return Err(syntax(line_no, &format!("unexpected keyword '{}'", other)));
            }
        }
    }

    Ok(geometry)
}

fn parse_vec3<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vec3, StlError> {
    let mut next = || -> Result<f32, StlError> {
        let token = tokens
            .next()
            .ok_or_else(|| syntax(line, "expected three coordinates"))?;
        token
            .parse::<f32>()
            .map_err(|_| syntax(line, &format!("invalid number '{}'", token)))
    };
    Ok(Vec3::new(next()?, next()?, next()?))
}

fn syntax(line: usize, message: &str) -> StlError {
    StlError::Syntax {
        line,
        message: message.to_string(),
    }
}
