//! Mesh construction utilities.
//!
//! This module turns indexed face lists, as found in mesh files, into a
//! [`HalfEdgeMesh`] and back. Edges that cannot be paired into a consistent
//! two-face edge are kept as boundary and reported through
//! [`HalfEdgeMesh::diagnostics`].

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh, NormalWeighting};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{Diagnostic, MeshError, Result};

/// Vertex positions plus faces of arbitrary arity, as read from a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonSoup {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,
    /// Faces as lists of vertex indices.
    pub faces: Vec<Vec<usize>>,
}

impl PolygonSoup {
    /// Create a soup from triangles.
    pub fn from_triangles(vertices: Vec<Point3<f64>>, faces: &[[usize; 3]]) -> Self {
        Self {
            vertices,
            faces: faces.iter().map(|f| f.to_vec()).collect(),
        }
    }

    /// Convert every face into triangles.
    ///
    /// With `triangulate` set, faces with more than three corners are split
    /// into a fan around their first corner. Otherwise any non-triangle face
    /// is an error.
    pub fn triangles(&self, triangulate: bool) -> Result<Vec<[usize; 3]>> {
        let mut triangles = Vec::with_capacity(self.faces.len());

        for (fi, face) in self.faces.iter().enumerate() {
            match face.len() {
                3 => triangles.push([face[0], face[1], face[2]]),
                n if n > 3 && triangulate => {
                    for k in 1..n - 1 {
                        triangles.push([face[0], face[k], face[k + 1]]);
                    }
                }
                arity => return Err(MeshError::NonTriangularFace { face: fi, arity }),
            }
        }

        Ok(triangles)
    }
}

/// Build a half-edge mesh from vertices and triangle faces.
///
/// Opposite links are created for every edge shared by exactly two faces
/// with opposite winding. Edges with a single face are boundary. Edges with
/// more than two faces, or two faces winding the same way, are left as
/// boundary on every face and a [`Diagnostic`] is recorded.
///
/// # Example
/// ```
/// use inkline::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    // Half-edges are the largest arena.
    let largest = (faces.len() * 3).max(vertices.len());
    if I::try_from_usize(largest).is_none() {
        return Err(MeshError::IndexOverflow {
            index: largest,
            bits: I::BITS,
        });
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());

    let vertex_ids: Vec<VertexId<I>> = vertices.iter().map(|&pos| mesh.add_vertex(pos)).collect();

    // Undirected edge -> half-edges running along it, in first-seen order.
    let mut edge_map: HashMap<(usize, usize), Vec<HalfEdgeId<I>>> = HashMap::new();
    let mut edge_order: Vec<(usize, usize)> = Vec::new();

    for (fi, face) in faces.iter().enumerate() {
        let base = mesh.halfedges.len();
        let face_id = FaceId::<I>::new(fi);
        let ids = [0, 1, 2].map(|k| HalfEdgeId::<I>::new(base + k));

        mesh.faces.push(Face::new(ids[0]));

        for k in 0..3 {
            let mut he = HalfEdge::new();
            he.origin = vertex_ids[face[k]];
            he.next = ids[(k + 1) % 3];
            he.prev = ids[(k + 2) % 3];
            he.face = face_id;
            mesh.halfedges.push(he);

            // Overwritten for shared vertices, fixed up below.
            mesh.vertex_mut(vertex_ids[face[k]]).halfedge = ids[k];

            let (a, b) = (face[k], face[(k + 1) % 3]);
            let key = (a.min(b), a.max(b));
            let slot = edge_map.entry(key).or_insert_with(|| {
                edge_order.push(key);
                Vec::with_capacity(2)
            });
            slot.push(ids[k]);
        }
    }

    for key in edge_order {
        let hes = &edge_map[&key];
        match hes.as_slice() {
            [_] => {}
            &[h0, h1] => {
                if mesh.from_vertex(h0) == mesh.to_vertex(h1) {
                    mesh.halfedge_mut(h0).opposite = h1;
                    mesh.halfedge_mut(h1).opposite = h0;
                } else {
                    mesh.push_diagnostic(Diagnostic::InconsistentOrientation {
                        v0: key.0,
                        v1: key.1,
                    });
                }
            }
            many => {
                mesh.push_diagnostic(Diagnostic::NonManifoldEdge {
                    v0: key.0,
                    v1: key.1,
                    faces: many.len(),
                });
            }
        }
    }

    for v in vertex_ids {
        mesh.adjust_outgoing_halfedge(v);
    }

    mesh.update_normals(NormalWeighting::default());

    for diagnostic in mesh.diagnostics() {
        log::warn!("{}", diagnostic);
    }
    log::debug!(
        "Built mesh: {} vertices, {} faces, {} boundary half-edges",
        mesh.num_vertices(),
        mesh.num_faces(),
        mesh.num_boundary_halfedges()
    );

    Ok(mesh)
}

/// Build a half-edge mesh from a polygon soup.
///
/// See [`PolygonSoup::triangles`] for how `triangulate` treats faces with
/// more than three corners.
pub fn build_from_polygons<I: MeshIndex>(
    soup: &PolygonSoup,
    triangulate: bool,
) -> Result<HalfEdgeMesh<I>> {
    let triangles = soup.triangles(triangulate)?;
    build_from_triangles(&soup.vertices, &triangles)
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Vertices and faces are emitted in storage order, skipping removed
/// elements, and face indices refer to the emitted vertex list.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut remap = vec![usize::MAX; mesh.num_vertex_slots()];
    let mut vertices = Vec::with_capacity(mesh.num_vertices());
    for v in mesh.vertex_ids() {
        remap[v.index()] = vertices.len();
        vertices.push(*mesh.position(v));
    }

    let faces = mesh
        .face_ids()
        .map(|f| mesh.face_triangle(f).map(|v| remap[v.index()]))
        .collect();

    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2]];
        (vertices, faces)
    }

    fn two_triangles() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        // Two triangles sharing an edge
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        (vertices, faces)
    }

    #[test]
    fn test_single_triangle() {
        let (vertices, faces) = single_triangle();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.num_halfedges(), 3);
        assert_eq!(mesh.num_boundary_halfedges(), 3);
        assert!(mesh.is_valid());
        assert!(mesh.diagnostics().is_empty());

        for v in mesh.vertex_ids() {
            assert!(mesh.is_boundary_vertex(v));
        }
    }

    #[test]
    fn test_two_triangles() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_halfedges(), 6);
        assert_eq!(mesh.num_boundary_halfedges(), 4);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_face_starts_at_first_corner() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        for (fi, face) in faces.iter().enumerate() {
            let tri = mesh.face_triangle(FaceId::new(fi)).map(|v| v.index());
            assert_eq!(&tri, face);
        }
    }

    #[test]
    fn test_roundtrip() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        let (out_verts, out_faces) = to_face_vertex(&mesh);

        assert_eq!(out_faces, faces);
        for (v_in, v_out) in vertices.iter().zip(out_verts.iter()) {
            assert!((v_in - v_out).norm() < 1e-10);
        }
    }

    #[test]
    fn test_isolated_vertex_is_kept() {
        let (mut vertices, faces) = single_triangle();
        vertices.push(Point3::new(5.0, 5.0, 5.0));
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        let isolated = VertexId::new(3);
        assert_eq!(mesh.valence(isolated), 0);
        assert_eq!(mesh.vertex_normal(isolated), nalgebra::Vector3::zeros());
    }

    #[test]
    fn test_non_manifold_edge_becomes_boundary() {
        // Three triangles hinged on edge (0, 1).
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3], [0, 1, 4]];
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert!(mesh.is_valid());
        assert_eq!(mesh.num_boundary_halfedges(), 9);
        assert_eq!(
            mesh.diagnostics(),
            &[Diagnostic::NonManifoldEdge {
                v0: 0,
                v1: 1,
                faces: 3
            }]
        );
    }

    #[test]
    fn test_inconsistent_orientation_is_reported() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 1, 3]];
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert!(mesh.is_valid());
        assert_eq!(mesh.num_boundary_halfedges(), 6);
        assert_eq!(
            mesh.diagnostics(),
            &[Diagnostic::InconsistentOrientation { v0: 0, v1: 1 }]
        );
    }

    #[test]
    fn test_empty_and_invalid_inputs() {
        let (vertices, _) = single_triangle();

        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &[]);
        assert!(matches!(result, Err(MeshError::EmptyMesh)));

        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &[[0, 1, 7]]);
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 7 })
        ));

        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &[[0, 0, 2]]);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_polygon_soup_strict_and_fan() {
        let soup = PolygonSoup {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            faces: vec![vec![0, 1, 2, 3]],
        };

        let strict: Result<HalfEdgeMesh<u32>> = build_from_polygons(&soup, false);
        assert!(matches!(
            strict,
            Err(MeshError::NonTriangularFace { face: 0, arity: 4 })
        ));

        let mesh: HalfEdgeMesh<u32> = build_from_polygons(&soup, true).unwrap();
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_boundary_halfedges(), 4);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_small_index_overflow() {
        let vertices = vec![Point3::origin(); 3];
        let faces = vec![[0, 1, 2]; 30_000];
        let result: Result<HalfEdgeMesh<u16>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(
            result,
            Err(MeshError::IndexOverflow { bits: 16, .. })
        ));
    }
}
