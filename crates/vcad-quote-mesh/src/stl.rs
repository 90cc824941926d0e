//! STL decoding and encoding.
//!
//! # Binary Format
//!
//! ```text
//! UINT8[80]    – Header (ignored)
//! UINT32       – Number of triangles
//! foreach triangle
//!     REAL32[3] – Normal vector (ignored, recomputed from winding)
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute byte count (ignored)
//! end
//! ```
//!
//! A buffer is decoded as binary only when its length matches the declared
//! facet count exactly. Anything else goes through the ASCII decoder, which
//! only looks at `vertex x y z` records and ignores every other keyword.

use tracing::debug;

use crate::error::{ParseError, Result};
use crate::mesh::{Triangle, TriangleMesh};
use crate::Point3;

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Header plus the facet count.
const PREAMBLE_SIZE: usize = HEADER_SIZE + 4;

/// Size of one facet in binary STL (normal + 3 vertices + attribute).
const FACET_SIZE: usize = 50;

/// Decode an STL buffer (binary or ASCII) into a triangle mesh.
///
/// # Errors
///
/// - [`ParseError::BufferTooSmall`] if the buffer is shorter than 84 bytes.
/// - [`ParseError::NoVertices`] if neither decoder finds any vertex.
/// - [`ParseError::NoTriangles`] if the vertices found do not make a triangle.
pub fn parse_stl(bytes: &[u8]) -> Result<TriangleMesh> {
    if bytes.len() < PREAMBLE_SIZE {
        return Err(ParseError::BufferTooSmall { len: bytes.len() });
    }

    let facet_count = u32::from_le_bytes([
        bytes[HEADER_SIZE],
        bytes[HEADER_SIZE + 1],
        bytes[HEADER_SIZE + 2],
        bytes[HEADER_SIZE + 3],
    ]) as usize;

    let expected = facet_count
        .checked_mul(FACET_SIZE)
        .and_then(|n| n.checked_add(PREAMBLE_SIZE));

    if expected == Some(bytes.len()) {
        if let Some(mesh) = parse_binary(bytes, facet_count) {
            debug!(triangles = mesh.num_triangles(), "decoded binary STL");
            return Ok(mesh);
        }
        debug!("binary STL decode failed, retrying as ASCII");
    }

    let mesh = parse_ascii(bytes)?;
    debug!(triangles = mesh.num_triangles(), "decoded ASCII STL");
    Ok(mesh)
}

/// Decode the binary body. `None` means the data is not a usable binary STL.
fn parse_binary(bytes: &[u8], facet_count: usize) -> Option<TriangleMesh> {
    if facet_count == 0 {
        return None;
    }

    let mut triangles = Vec::with_capacity(facet_count);
    for facet in bytes[PREAMBLE_SIZE..].chunks_exact(FACET_SIZE) {
        // Skip normal (12 bytes), read 3 vertices (36 bytes total)
        let a = read_vertex(&facet[12..24])?;
        let b = read_vertex(&facet[24..36])?;
        let c = read_vertex(&facet[36..48])?;
        triangles.push(Triangle::new(a, b, c));
    }

    Some(TriangleMesh::from_triangles(triangles))
}

/// Read a vertex from 12 bytes (3 little-endian f32s). Rejects NaN/inf.
fn read_vertex(buf: &[u8]) -> Option<Point3> {
    let coord = |i: usize| f32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
    let (x, y, z) = (coord(0), coord(4), coord(8));
    if !(x.is_finite() && y.is_finite() && z.is_finite()) {
        return None;
    }
    Some(Point3::new(f64::from(x), f64::from(y), f64::from(z)))
}

/// Scan text for `vertex x y z` records; consecutive triples form triangles.
fn parse_ascii(bytes: &[u8]) -> Result<TriangleMesh> {
    let text = String::from_utf8_lossy(bytes);
    let mut vertices: Vec<Point3> = Vec::new();

    let mut tokens = text.split_whitespace();
    while let Some(token) = tokens.next() {
        if !token.eq_ignore_ascii_case("vertex") {
            continue;
        }
        let coords: Vec<f64> = tokens
            .by_ref()
            .take(3)
            .filter_map(|t| t.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .collect();
        if let &[x, y, z] = coords.as_slice() {
            vertices.push(Point3::new(x, y, z));
        }
    }

    if vertices.is_empty() {
        return Err(ParseError::NoVertices);
    }
    if vertices.len() < 3 {
        return Err(ParseError::NoTriangles {
            vertices: vertices.len(),
        });
    }

    // An incomplete trailing triple is dropped.
    Ok(vertices
        .chunks_exact(3)
        .map(|v| Triangle::new(v[0], v[1], v[2]))
        .collect())
}

/// Encode a mesh as binary STL with normals recomputed from the winding.
pub fn write_binary_stl(mesh: &TriangleMesh) -> Vec<u8> {
    let num_triangles = mesh.num_triangles();
    let mut data = Vec::with_capacity(PREAMBLE_SIZE + num_triangles * FACET_SIZE);

    let mut header = [b' '; HEADER_SIZE];
    let label = b"vcad-quote STL export";
    header[..label.len()].copy_from_slice(label);
    data.extend_from_slice(&header);
    data.extend_from_slice(&(num_triangles as u32).to_le_bytes());

    for tri in mesh.triangles() {
        let n = tri.normal();
        for value in [n.x, n.y, n.z] {
            data.extend_from_slice(&(value as f32).to_le_bytes());
        }
        for v in &tri.vertices {
            for value in [v.x, v.y, v.z] {
                data.extend_from_slice(&(value as f32).to_le_bytes());
            }
        }
        // Attribute byte count
        data.extend_from_slice(&0u16.to_le_bytes());
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Binary STL for the z=0 face of a unit cube (two triangles).
    fn unit_face_binary() -> Vec<u8> {
        let faces: [[[f32; 3]; 3]; 2] = [
            [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
            [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
        ];
        let mut data = vec![0u8; HEADER_SIZE];
        data.extend_from_slice(&2u32.to_le_bytes());
        for face in &faces {
            data.extend_from_slice(&[0u8; 12]);
            for v in face {
                for c in v {
                    data.extend_from_slice(&c.to_le_bytes());
                }
            }
            data.extend_from_slice(&[0u8; 2]);
        }
        data
    }

    #[test]
    fn test_binary_round_trip_coordinates() {
        let data = unit_face_binary();
        assert_eq!(data.len(), 84 + 2 * 50);

        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.num_triangles(), 2);

        let t0 = &mesh.triangles()[0];
        assert_eq!(t0.vertices[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(t0.vertices[1], Point3::new(1.0, 1.0, 0.0));
        assert_eq!(t0.vertices[2], Point3::new(1.0, 0.0, 0.0));

        let t1 = &mesh.triangles()[1];
        assert_eq!(t1.vertices[1], Point3::new(0.0, 1.0, 0.0));
        assert_eq!(t1.vertices[2], Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_buffer_too_small() {
        let data = vec![0u8; 50];
        assert_eq!(
            parse_stl(&data),
            Err(ParseError::BufferTooSmall { len: 50 })
        );
    }

    #[test]
    fn test_ascii_fallback() {
        let text = "solid test\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex 0 0 0\n\
                vertex 10 0 0\n\
                vertex 0 10 0\n\
              endloop\n\
            endfacet\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex 10 0 0\n\
                vertex 10 10 0\n\
                vertex 0 10 0\n\
              endloop\n\
            endfacet\n\
            endsolid test\n";
        let mesh = parse_stl(text.as_bytes()).unwrap();
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.triangles()[1].vertices[1], Point3::new(10.0, 10.0, 0.0));
    }

    #[test]
    fn test_size_mismatch_without_vertices_fails() {
        // Declares 5 facets but carries none.
        let mut data = vec![0u8; HEADER_SIZE];
        data.extend_from_slice(&5u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 16]);
        assert_eq!(parse_stl(&data), Err(ParseError::NoVertices));
    }

    #[test]
    fn test_two_vertices_are_not_a_mesh() {
        let mut text = String::from("solid stub\nvertex 0 0 0\nvertex 10 0 0\nendsolid stub\n");
        text.push_str(&" ".repeat(100));
        assert_eq!(
            parse_stl(text.as_bytes()),
            Err(ParseError::NoTriangles { vertices: 2 })
        );
    }

    #[test]
    fn test_zero_facets_is_not_a_mesh() {
        let mut data = vec![0u8; HEADER_SIZE];
        data.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(parse_stl(&data), Err(ParseError::NoVertices));
    }

    #[test]
    fn test_write_then_parse() {
        let mesh = parse_stl(&unit_face_binary()).unwrap();
        let bytes = write_binary_stl(&mesh);
        assert_eq!(bytes.len(), 84 + 2 * 50);
        assert_eq!(parse_stl(&bytes).unwrap(), mesh);
    }
}
