//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation used by every
//! other part of the crate.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], which represents a triangle mesh
//! using a half-edge data structure. Each triangle owns three half-edges;
//! an edge shared by two triangles pairs their half-edges as opposites, and
//! an edge with one triangle is a boundary. Adjacency queries are O(1).
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe handles:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//!
//! Handles are generic over the underlying integer type ([`MeshIndex`]
//! trait), so `u16`, `u32` or `u64` storage can be chosen by mesh size.
//!
//! # Construction
//!
//! ```
//! use inkline::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_boundary_halfedges(), 3);
//! ```

mod builder;
mod halfedge;
mod index;

pub use builder::{build_from_polygons, build_from_triangles, to_face_vertex, PolygonSoup};
pub use halfedge::{
    Face, HalfEdge, HalfEdgeMesh, NormalWeighting, Vertex, VertexHalfEdgeIter,
};
pub use index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
