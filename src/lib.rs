//! # Inkline
//!
//! Mesh preparation for silhouette and contour rendering.
//!
//! Inkline turns a triangle mesh into the buffers a geometry-shader outline
//! renderer consumes: per-vertex positions and normals plus a
//! triangles-with-adjacency index stream, together with the scale and
//! centre that map the model into the unit cube. An optional quadric error
//! decimation pass reduces the mesh to a target vertex count first.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe indices
//! - **Flexible indexing**: 16-bit, 32-bit, and 64-bit indices
//! - **File formats**: OBJ, OFF, STL, PLY, glTF
//! - **QEM decimation**: vertex-count targets with honest reporting
//! - **Adjacency streams**: six indices per triangle, boundaries self-paired
//!
//! ## Quick Start
//!
//! ```no_run
//! use inkline::pipeline::{rebuild, FileSource, RebuildConfig};
//!
//! let config = RebuildConfig::default()
//!     .with_simplification(true)
//!     .with_target_vertex_count(500);
//! let buffers = rebuild(&FileSource::new("bunny.obj"), &config).unwrap();
//!
//! println!("{} triangles", buffers.num_faces());
//! if let Some(report) = buffers.decimation {
//!     println!("{} of {} vertices requested", report.achieved_vertices, report.requested_vertices);
//! }
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use inkline::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! let adjacency = build_adjacency(&mesh).unwrap();
//!
//! assert_eq!(adjacency.len(), 6 * mesh.num_faces());
//! assert_eq!(self_paired_count(&adjacency), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;
pub mod pipeline;

/// Prelude module for convenient imports.
///
/// ```
/// use inkline::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{
        build_adjacency, qem_decimate, self_paired_count, DecimateOptions, DecimationReport,
        Normalization,
    };
    pub use crate::error::{Diagnostic, MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, to_face_vertex, Face, FaceId, HalfEdge,
        HalfEdgeId, HalfEdgeMesh, MeshIndex, NormalWeighting, PolygonSoup, Vertex, VertexId,
    };
    pub use crate::pipeline::{rebuild, RebuildConfig, RenderBuffers, ViewerCore};
}

pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_tetrahedron() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];

        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        // Closed: every half-edge has an opposite.
        assert_eq!(mesh.num_halfedges(), 12);
        assert_eq!(mesh.num_boundary_halfedges(), 0);
        assert!(mesh.is_valid());

        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v), "vertex {:?} should not be on boundary", v);
        }
    }
}
