//! Triangle-adjacency index stream.
//!
//! For every face, in storage order, and every half-edge `e` of that face,
//! in winding order starting at the face's first half-edge, two indices are
//! emitted:
//!
//! 1. the vertex `e` starts at;
//! 2. the vertex across `e` on the neighbouring triangle, or the first index
//!    again when `e` has no opposite.
//!
//! The result has `6 × faces` entries and is laid out as the
//! "triangles with adjacency" primitive expects: corners at even positions,
//! neighbour apices at odd positions.

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Build the adjacency stream with 32-bit indices.
///
/// # Errors
///
/// [`MeshError::InvalidState`] if the mesh still holds removed elements,
/// since vertex handles would not match the attribute arrays.
pub fn build_adjacency<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Result<Vec<u32>> {
    build_adjacency_as(mesh)
}

/// Build the adjacency stream with 16-bit indices.
///
/// # Errors
///
/// As [`build_adjacency`], plus [`MeshError::IndexOverflow`] if a vertex
/// index exceeds `u16::MAX`.
pub fn build_adjacency_u16<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Result<Vec<u16>> {
    build_adjacency_as(mesh)
}

fn build_adjacency_as<I, T>(mesh: &HalfEdgeMesh<I>) -> Result<Vec<T>>
where
    I: MeshIndex,
    T: TryFrom<usize> + Copy,
{
    if mesh.has_garbage() {
        return Err(MeshError::InvalidState(
            "adjacency requires a compacted mesh; run garbage_collection first".into(),
        ));
    }

    let narrow = |index: usize| -> Result<T> {
        T::try_from(index).map_err(|_| MeshError::IndexOverflow {
            index,
            bits: (std::mem::size_of::<T>() * 8) as u32,
        })
    };

    let mut indices = Vec::with_capacity(mesh.num_faces() * 6);
    for f in mesh.face_ids() {
        for he in mesh.face_halfedges(f) {
            let corner = narrow(mesh.from_vertex(he).index())?;
            let apex = match mesh.opposite(he) {
                Some(opp) => narrow(mesh.opposite_vertex(opp).index())?,
                None => corner,
            };
            indices.push(corner);
            indices.push(apex);
        }
    }

    log::debug!(
        "Adjacency stream: {} indices for {} faces",
        indices.len(),
        mesh.num_faces()
    );

    Ok(indices)
}

/// Number of (corner, apex) pairs whose apex repeats the corner.
///
/// On a freshly built mesh this equals the number of boundary half-edges.
pub fn self_paired_count<T: PartialEq>(indices: &[T]) -> usize {
    indices
        .chunks_exact(2)
        .filter(|pair| pair[0] == pair[1])
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;

    fn tetrahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_single_triangle_repeats_every_corner() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();

        let adj = build_adjacency(&mesh).unwrap();
        assert_eq!(adj, vec![0, 0, 1, 1, 2, 2]);
        assert_eq!(self_paired_count(&adj), 3);
    }

    #[test]
    fn test_tetrahedron_has_no_self_pairs() {
        let mesh = tetrahedron();
        let adj = build_adjacency(&mesh).unwrap();

        assert_eq!(adj.len(), 24);
        assert_eq!(self_paired_count(&adj), 0);

        // Face [0, 2, 1]: edge 0->2 borders face [2, 0, 3], edge 2->1 borders
        // [1, 2, 3], edge 1->0 borders [0, 1, 3].
        assert_eq!(&adj[..6], &[0, 3, 2, 3, 1, 3]);
    }

    #[test]
    fn test_two_triangles_share_apex() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        let adj = build_adjacency(&mesh).unwrap();
        assert_eq!(adj, vec![0, 3, 1, 1, 2, 2, 1, 2, 0, 0, 3, 3]);
        assert_eq!(self_paired_count(&adj), mesh.num_boundary_halfedges());
    }

    #[test]
    fn test_non_manifold_edge_uses_boundary_rule() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3], [0, 1, 4]];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        let adj = build_adjacency(&mesh).unwrap();
        assert_eq!(adj.len(), 18);
        assert_eq!(self_paired_count(&adj), 9);
        assert_eq!(self_paired_count(&adj), mesh.num_boundary_halfedges());
    }

    #[test]
    fn test_u16_matches_u32() {
        let mesh = tetrahedron();
        let wide = build_adjacency(&mesh).unwrap();
        let narrow = build_adjacency_u16(&mesh).unwrap();
        assert!(wide.iter().zip(&narrow).all(|(&a, &b)| a == b as u32));
    }

    #[test]
    fn test_u16_overflow() {
        let mut vertices = vec![Point3::origin(); 70_000];
        vertices[69_997] = Point3::new(1.0, 0.0, 0.0);
        vertices[69_998] = Point3::new(0.0, 1.0, 0.0);
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[69_997, 69_998, 69_999]]).unwrap();

        assert!(matches!(
            build_adjacency_u16(&mesh),
            Err(MeshError::IndexOverflow { index: 69_997, bits: 16 })
        ));
        assert!(build_adjacency(&mesh).is_ok());
    }
}
