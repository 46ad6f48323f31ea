//! Object File Format (OFF) support.
//!
//! Reads ASCII `OFF`, `COFF`, `NOFF`, `STOFF` and similar 3D headers. Anything after
//! the coordinates on a vertex line and after the indices on a face line
//! (colours, normals) is ignored. Comments start with `#`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{to_face_vertex, HalfEdgeMesh, MeshIndex, PolygonSoup};

/// Header counts are untrusted; reserve at most this many elements up front.
const MAX_PREALLOC: usize = 1 << 20;

/// Read the vertices and faces of an OFF file.
pub fn read<P: AsRef<Path>>(path: P) -> Result<PolygonSoup> {
    let path = path.as_ref();
    let file = File::open(path)?;
    parse(BufReader::new(file), path)
}

/// Parse OFF text; `path` is only used in error messages.
pub fn parse<R: BufRead>(reader: R, path: &Path) -> Result<PolygonSoup> {
    // Non-empty, comment-stripped lines with their 1-based line numbers.
    let mut lines = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.split('#').next().unwrap_or("").trim().to_string();
        if !content.is_empty() {
            lines.push((idx + 1, content));
        }
    }
    let mut lines = lines.into_iter();

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| MeshError::load(path, "empty file"))?;
    let keyword = header.split_whitespace().next().unwrap_or("");
    if !keyword.ends_with("OFF") {
        return Err(MeshError::load(
            path,
            format!("line {}: missing OFF header", header_line),
        ));
    }
    if keyword.contains('4') || keyword.starts_with('n') {
        return Err(MeshError::load(
            path,
            format!("line {}: unsupported OFF variant '{}'", header_line, keyword),
        ));
    }

    // Counts may share the header line.
    let rest: Vec<&str> = header.split_whitespace().skip(1).collect();
    let (counts_line, counts_text) = if rest.is_empty() {
        lines
            .next()
            .ok_or_else(|| MeshError::load(path, "missing counts line"))?
    } else {
        (header_line, rest.join(" "))
    };
    let counts: Vec<usize> = counts_text
        .split_whitespace()
        .map(|s| s.parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| MeshError::load(path, format!("line {}: invalid counts", counts_line)))?;
    if counts.len() < 2 {
        return Err(MeshError::load(
            path,
            format!("line {}: expected vertex and face counts", counts_line),
        ));
    }
    let (num_vertices, num_faces) = (counts[0], counts[1]);

    let mut soup = PolygonSoup {
        vertices: Vec::with_capacity(num_vertices.min(MAX_PREALLOC)),
        faces: Vec::with_capacity(num_faces.min(MAX_PREALLOC)),
    };

    for i in 0..num_vertices {
        let (line_num, text) = lines
            .next()
            .ok_or_else(|| MeshError::load(path, format!("unexpected end of file at vertex {}", i)))?;
        let coords: Vec<f64> = text
            .split_whitespace()
            .take(3)
            .map(|s| s.parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| MeshError::load(path, format!("line {}: invalid vertex", line_num)))?;
        if coords.len() < 3 {
            return Err(MeshError::load(
                path,
                format!("line {}: vertex requires 3 coordinates", line_num),
            ));
        }
        soup.vertices.push(Point3::new(coords[0], coords[1], coords[2]));
    }

    for i in 0..num_faces {
        let (line_num, text) = lines
            .next()
            .ok_or_else(|| MeshError::load(path, format!("unexpected end of file at face {}", i)))?;
        let invalid = || MeshError::load(path, format!("line {}: invalid face", line_num));

        let mut fields = text.split_whitespace();
        let arity: usize = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)?;
        let face: Vec<usize> = fields
            .take(arity)
            .map(|s| s.parse::<usize>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| invalid())?;
        if face.len() != arity || arity < 3 {
            return Err(invalid());
        }
        soup.faces.push(face);
    }

    Ok(soup)
}

/// Save a mesh to an ASCII OFF file.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "OFF")?;
    writeln!(writer, "{} {} 0", vertices.len(), faces.len())?;
    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }
    for f in &faces {
        writeln!(writer, "3 {} {} {}", f[0], f[1], f[2])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse_str(text: &str) -> Result<PolygonSoup> {
        parse(Cursor::new(text), Path::new("test.off"))
    }

    #[test]
    fn test_read_off_triangle() {
        let soup = parse_str("OFF\n# comment\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n").unwrap();
        assert_eq!(soup.vertices.len(), 3);
        assert_eq!(soup.faces, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_counts_on_header_line_and_colours() {
        let soup = parse_str(
            "COFF 4 1 0\n\
             0 0 0 255 0 0 255\n\
             1 0 0 255 0 0 255\n\
             1 1 0 255 0 0 255\n\
             0 1 0 255 0 0 255\n\
             4 0 1 2 3 0.5 0.5 0.5\n",
        )
        .unwrap();
        assert_eq!(soup.vertices.len(), 4);
        assert_eq!(soup.faces, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_truncated_face_is_rejected() {
        let err = parse_str("OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1\n").unwrap_err();
        assert!(err.to_string().contains("line 6"), "{}", err);
    }

    #[test]
    fn test_huge_counts_are_a_load_error() {
        let err = parse_str("OFF\n18446744073709551615 1 0\n0 0 0\n").unwrap_err();
        assert!(err.is_load_error());

        let err = parse_str("OFF\n100000000000 100000000000 0\n0 0 0\n1 0 0\n").unwrap_err();
        assert!(err.to_string().contains("unexpected end of file"), "{}", err);
    }

    #[test]
    fn test_fewer_faces_than_declared() {
        let err = parse_str("OFF\n3 2 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n").unwrap_err();
        assert!(err.to_string().contains("face 1"), "{}", err);
    }

    #[test]
    fn test_missing_header() {
        assert!(parse_str("3 1 0\n0 0 0\n").unwrap_err().is_load_error());
    }
}
