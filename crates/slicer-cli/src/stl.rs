//! STL loading — a thin adapter, not part of the geometry core. Reads
//! both the binary and ASCII variants into a flat triangle list ready
//! for `slicer_core::MeshIndex::build`.

use std::io::Read;
use std::path::Path;

use slicer_core::SlicerError;

/// One volume's raw triangle soup, in millimeters, not yet welded.
pub type Triangles = Vec<[[f64; 3]; 3]>;

/// Load an STL file (binary or ASCII, auto-detected) from disk.
pub fn load_stl(path: &Path) -> Result<Triangles, SlicerError> {
    let bytes = std::fs::read(path)
        .map_err(|e| SlicerError::LoadError(format!("{}: {e}", path.display())))?;

    if is_binary_stl(&bytes) {
        parse_binary(&bytes)
    } else {
        let text = String::from_utf8_lossy(&bytes);
        parse_ascii(&text)
    }
}

/// Binary STL always starts with an 80-byte header followed by a 4-byte
/// triangle count; an ASCII file starts with the literal text `solid`.
/// Some binary exporters still write `solid` in the header as a human
/// label, so the authoritative test is whether the declared triangle
/// count matches the remaining byte length.
fn is_binary_stl(bytes: &[u8]) -> bool {
    if bytes.len() < 84 {
        return false;
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    let expected_len = 84 + count * 50;
    bytes.len() == expected_len
}

fn parse_binary(bytes: &[u8]) -> Result<Triangles, SlicerError> {
    let mut cursor = &bytes[80..];
    let mut count_buf = [0u8; 4];
    cursor
        .read_exact(&mut count_buf)
        .map_err(|e| SlicerError::LoadError(format!("truncated STL header: {e}")))?;
    let count = u32::from_le_bytes(count_buf) as usize;

    let mut triangles = Vec::with_capacity(count);
    for _ in 0..count {
        let mut record = [0u8; 50];
        cursor
            .read_exact(&mut record)
            .map_err(|e| SlicerError::LoadError(format!("truncated STL triangle record: {e}")))?;

        // Bytes 0..12 are the facet normal; we recompute our own during
        // slicing rather than trusting the file's.
        let mut verts = [[0.0f64; 3]; 3];
        for (vi, vert) in verts.iter_mut().enumerate() {
            let base = 12 + vi * 12;
            for axis in 0..3 {
                let off = base + axis * 4;
                let f = f32::from_le_bytes([
                    record[off],
                    record[off + 1],
                    record[off + 2],
                    record[off + 3],
                ]);
                vert[axis] = f as f64;
            }
        }
        triangles.push(verts);
    }

    Ok(triangles)
}

fn parse_ascii(text: &str) -> Result<Triangles, SlicerError> {
    let mut triangles = Vec::new();
    let mut current: Vec<[f64; 3]> = Vec::with_capacity(3);

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("vertex") {
            let coords: Vec<f64> = rest
                .split_whitespace()
                .map(|t| t.parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|e| SlicerError::LoadError(format!("bad STL vertex line: {e}")))?;
            if coords.len() != 3 {
                return Err(SlicerError::LoadError(
                    "STL vertex line did not have 3 coordinates".into(),
                ));
            }
            current.push([coords[0], coords[1], coords[2]]);
            if current.len() == 3 {
                triangles.push([current[0], current[1], current[2]]);
                current.clear();
            }
        }
    }

    if triangles.is_empty() {
        return Err(SlicerError::LoadError(
            "STL file contained no triangles".into(),
        ));
    }

    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_cube_bytes() -> Vec<u8> {
        let tris: Triangles = vec![
            [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 10.0, 0.0]],
            [[0.0, 0.0, 0.0], [10.0, 10.0, 0.0], [0.0, 10.0, 0.0]],
        ];
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&(tris.len() as u32).to_le_bytes());
        for tri in &tris {
            data.extend_from_slice(&0.0f32.to_le_bytes());
            data.extend_from_slice(&0.0f32.to_le_bytes());
            data.extend_from_slice(&1.0f32.to_le_bytes());
            for v in tri {
                for axis in v {
                    data.extend_from_slice(&(*axis as f32).to_le_bytes());
                }
            }
            data.extend_from_slice(&0u16.to_le_bytes());
        }
        data
    }

    #[test]
    fn detects_binary_stl_by_length() {
        let bytes = binary_cube_bytes();
        assert!(is_binary_stl(&bytes));
    }

    #[test]
    fn parses_binary_triangles() {
        let bytes = binary_cube_bytes();
        let tris = parse_binary(&bytes).unwrap();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[0][1][0], 10.0);
    }

    #[test]
    fn parses_ascii_triangles() {
        let text = "solid test\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex 0 0 0\n\
                vertex 10 0 0\n\
                vertex 10 10 0\n\
              endloop\n\
            endfacet\n\
            endsolid test\n";
        let tris = parse_ascii(text).unwrap();
        assert_eq!(tris.len(), 1);
        assert_eq!(tris[0][1], [10.0, 0.0, 0.0]);
    }
}
