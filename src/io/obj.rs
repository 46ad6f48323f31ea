//! Wavefront OBJ format support.
//!
//! Only geometry is read: `v` records and the vertex part of `f` records.
//! Texture coordinates, normals, groups and materials are skipped. Face
//! indices may be 1-based or negative (relative to the latest vertex).

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{to_face_vertex, HalfEdgeMesh, MeshIndex, PolygonSoup};

/// Read the vertices and faces of an OBJ file.
pub fn read<P: AsRef<Path>>(path: P) -> Result<PolygonSoup> {
    let path = path.as_ref();
    let file = File::open(path)?;
    parse(BufReader::new(file), path)
}

/// Parse OBJ text; `path` is only used in error messages.
pub fn parse<R: BufRead>(reader: R, path: &Path) -> Result<PolygonSoup> {
    let mut soup = PolygonSoup::default();

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_num = line_idx + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        match parts.next() {
            Some("v") => {
                let coords: Vec<f64> = parts
                    .take(3)
                    .map(|s| s.parse::<f64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|_| {
                        MeshError::load(path, format!("line {}: invalid vertex coordinate", line_num))
                    })?;
                if coords.len() < 3 {
                    return Err(MeshError::load(
                        path,
                        format!("line {}: vertex requires 3 coordinates", line_num),
                    ));
                }
                soup.vertices.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let mut face = Vec::new();
                for token in parts {
                    face.push(resolve_index(token, soup.vertices.len()).ok_or_else(|| {
                        MeshError::load(
                            path,
                            format!("line {}: invalid vertex reference '{}'", line_num, token),
                        )
                    })?);
                }
                if face.len() < 3 {
                    return Err(MeshError::load(
                        path,
                        format!("line {}: face requires at least 3 vertices", line_num),
                    ));
                }
                soup.faces.push(face);
            }
            _ => {}
        }
    }

    Ok(soup)
}

/// Turn an `f` token (`7`, `7/1`, `7//3`, `-1/2/3`) into a 0-based index.
fn resolve_index(token: &str, num_vertices: usize) -> Option<usize> {
    let raw: i64 = token.split('/').next()?.parse().ok()?;
    if raw > 0 {
        let idx = (raw - 1) as usize;
        (idx < num_vertices).then_some(idx)
    } else if raw < 0 {
        num_vertices.checked_sub(raw.unsigned_abs() as usize)
    } else {
        None
    }
}

/// Save a mesh to an OBJ file.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "# inkline OBJ export")?;
    writeln!(writer, "# vertices: {}, faces: {}", vertices.len(), faces.len())?;
    for v in &vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for f in &faces {
        writeln!(writer, "f {} {} {}", f[0] + 1, f[1] + 1, f[2] + 1)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse_str(text: &str) -> Result<PolygonSoup> {
        parse(Cursor::new(text), Path::new("test.obj"))
    }

    #[test]
    fn test_parse_with_attributes() {
        let soup = parse_str(
            "# square\n\
             o quad\n\
             v 0 0 0\n\
             v 1 0 0\n\
             v 1 1 0\n\
             v 0 1 0\n\
             vt 0 0\n\
             vn 0 0 1\n\
             f 1/1/1 2/1/1 3/1/1\n\
             f 1//1 3//1 4//1\n",
        )
        .unwrap();

        assert_eq!(soup.vertices.len(), 4);
        assert_eq!(soup.faces, vec![vec![0, 1, 2], vec![0, 2, 3]]);
    }

    #[test]
    fn test_negative_indices() {
        let soup = parse_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
        assert_eq!(soup.faces, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_quad_is_kept_as_polygon() {
        let soup = parse_str("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        assert_eq!(soup.faces, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_errors_name_the_line() {
        let err = parse_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("test.obj"), "{}", message);
        assert!(message.contains("line 4"), "{}", message);

        let err = parse_str("v 0 zero 0\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));

        let err = parse_str("v 0 0 0\nv 1 0 0\nf 1 2\n").unwrap_err();
        assert!(err.is_load_error());
    }
}
