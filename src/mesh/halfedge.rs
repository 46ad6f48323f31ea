//! Half-edge mesh data structure.
//!
//! This module provides an arena-backed half-edge representation for
//! triangle meshes. Vertices, half-edges and faces each live in a dense
//! `Vec` and refer to one another through typed handles, so edge collapse
//! only has to mark records as removed and compaction only has to remap
//! integers.
//!
//! # Structure
//!
//! - Every half-edge belongs to exactly one triangle and knows its
//!   **origin**, **next**, **prev**, **face** and **opposite**.
//! - An interior edge is two half-edges that are each other's opposite.
//! - A boundary edge is a single half-edge whose opposite is invalid. There
//!   are no face-less half-edges.
//! - Each vertex stores one outgoing half-edge (its *anchor*). For boundary
//!   vertices the anchor is chosen so that the half-edge entering the vertex
//!   just before it has no opposite, which lets [`VertexHalfEdgeIter`] sweep
//!   the whole fan in one direction.
//!
//! # Removal
//!
//! Elements removed by decimation stay in their arenas as tombstones until
//! [`HalfEdgeMesh::garbage_collection`] compacts the storage.

use nalgebra::{Point3, Vector3};

use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::Diagnostic;

/// How adjacent face normals are combined into a vertex normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalWeighting {
    /// Plain average of unit face normals.
    Uniform,
    /// Face normals weighted by face area.
    #[default]
    Area,
    /// Face normals weighted by the corner angle at the vertex.
    Angle,
}

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// Unit normal, zero for isolated vertices.
    pub normal: Vector3<f64>,

    /// One outgoing half-edge from this vertex.
    pub halfedge: HalfEdgeId<I>,

    pub(crate) removed: bool,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: Vector3::zeros(),
            halfedge: HalfEdgeId::invalid(),
            removed: false,
        }
    }

    /// Whether this vertex has been removed and awaits compaction.
    #[inline]
    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

/// A directed edge of a triangle.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge originates from.
    pub origin: VertexId<I>,

    /// The reverse half-edge in the neighbouring face, invalid on a boundary.
    pub opposite: HalfEdgeId<I>,

    /// The next half-edge around the face.
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face.
    pub prev: HalfEdgeId<I>,

    /// The face this half-edge belongs to.
    pub face: FaceId<I>,

    pub(crate) removed: bool,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create a new unlinked half-edge.
    pub fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            opposite: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
            removed: false,
        }
    }

    /// Whether this half-edge lies on a boundary (has no opposite).
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.opposite.is_valid()
    }

    /// Whether this half-edge has been removed and awaits compaction.
    #[inline]
    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

impl<I: MeshIndex> Default for HalfEdge<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A triangular face.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// The first half-edge of the face's winding.
    pub halfedge: HalfEdgeId<I>,

    pub(crate) removed: bool,
}

impl<I: MeshIndex> Face<I> {
    /// Create a new face starting at the given half-edge.
    pub fn new(halfedge: HalfEdgeId<I>) -> Self {
        Self {
            halfedge,
            removed: false,
        }
    }

    /// Whether this face has been removed and awaits compaction.
    #[inline]
    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

/// A half-edge mesh data structure for triangle meshes.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
    pub(crate) faces: Vec<Face<I>>,

    removed_vertices: usize,
    removed_halfedges: usize,
    removed_faces: usize,

    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_faces * 3),
            faces: Vec::with_capacity(num_faces),
            removed_vertices: 0,
            removed_halfedges: 0,
            removed_faces: 0,
            diagnostics: Vec::new(),
        }
    }

    // ==================== Counts ====================

    /// Number of live vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() - self.removed_vertices
    }

    /// Number of live half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len() - self.removed_halfedges
    }

    /// Number of live faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len() - self.removed_faces
    }

    /// Number of vertex slots, including removed ones.
    #[inline]
    pub fn num_vertex_slots(&self) -> usize {
        self.vertices.len()
    }

    /// Whether any element is waiting to be compacted.
    #[inline]
    pub fn has_garbage(&self) -> bool {
        self.removed_vertices + self.removed_halfedges + self.removed_faces > 0
    }

    /// Non-fatal conditions recorded while building or processing this mesh.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    // ==================== Accessors ====================

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    /// Get a mutable vertex by ID.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    /// Get a mutable half-edge by ID.
    #[inline]
    pub fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Get a mutable face by ID.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId<I>) -> &mut Face<I> {
        &mut self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
    }

    /// The stored normal of a vertex.
    ///
    /// Valid after [`update_normals`](Self::update_normals); the builder and
    /// garbage collection both refresh it.
    #[inline]
    pub fn vertex_normal(&self, v: VertexId<I>) -> Vector3<f64> {
        self.vertex(v).normal
    }

    // ==================== Topology Queries ====================

    /// The opposite half-edge, or `None` if `he` is a boundary half-edge.
    #[inline]
    pub fn opposite(&self, he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        self.halfedge(he).opposite.valid()
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// The vertex a half-edge starts at.
    #[inline]
    pub fn from_vertex(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).origin
    }

    /// The vertex a half-edge points to.
    #[inline]
    pub fn to_vertex(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.from_vertex(self.next(he))
    }

    /// The vertex of `he`'s triangle that is not an endpoint of `he`.
    #[inline]
    pub fn opposite_vertex(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.from_vertex(self.prev(he))
    }

    /// Get the face of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// Whether a half-edge has no opposite.
    #[inline]
    pub fn is_boundary(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Whether a vertex touches a boundary edge or has no faces at all.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        if !self.vertex(v).halfedge.is_valid() {
            return true;
        }
        self.vertex_halfedges(v)
            .any(|he| self.is_boundary(he) || self.is_boundary(self.prev(he)))
    }

    /// The three half-edges of a face in winding order.
    #[inline]
    pub fn face_halfedges(&self, f: FaceId<I>) -> [HalfEdgeId<I>; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [he0, he1, he2]
    }

    /// The three vertices of a face in winding order.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        self.face_halfedges(f).map(|he| self.from_vertex(he))
    }

    /// The positions of the three vertices of a face.
    pub fn face_positions(&self, f: FaceId<I>) -> [Point3<f64>; 3] {
        self.face_triangle(f).map(|v| *self.position(v))
    }

    /// Number of live half-edges without an opposite.
    pub fn num_boundary_halfedges(&self) -> usize {
        self.halfedges
            .iter()
            .filter(|he| !he.removed && he.is_boundary())
            .count()
    }

    // ==================== Iteration ====================

    /// Iterate over live vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.removed)
            .map(|(i, _)| VertexId::new(i))
    }

    /// Iterate over live half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .filter(|(_, he)| !he.removed)
            .map(|(i, _)| HalfEdgeId::new(i))
    }

    /// Iterate over live face IDs in storage order.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.removed)
            .map(|(i, _)| FaceId::new(i))
    }

    /// Iterate over the outgoing half-edges of a vertex's fan.
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        let anchor = self.vertex(v).halfedge;
        // On an open fan the neighbour behind the anchor is not the target
        // of any outgoing half-edge.
        let trailing = anchor
            .valid()
            .map(|he| self.prev(he))
            .filter(|&incoming| self.is_boundary(incoming))
            .map(|incoming| self.from_vertex(incoming));

        self.vertex_halfedges(v)
            .map(move |he| self.to_vertex(he))
            .chain(trailing)
    }

    /// Iterate over faces adjacent to a vertex.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_halfedges(v).map(move |he| self.face_of(he))
    }

    /// Number of edges incident to a vertex.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_neighbors(v).count()
    }

    // ==================== Geometry ====================

    /// Unit normal of a face, zero for a degenerate triangle.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        (p1 - p0)
            .cross(&(p2 - p0))
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, he: HalfEdgeId<I>) -> f64 {
        (self.position(self.to_vertex(he)) - self.position(self.from_vertex(he))).norm()
    }

    /// Recompute every live vertex normal from the adjacent faces.
    pub fn update_normals(&mut self, weighting: NormalWeighting) {
        let mut sums = vec![Vector3::<f64>::zeros(); self.vertices.len()];

        for f in self.face_ids() {
            let corners = self.face_triangle(f);
            let [p0, p1, p2] = self.face_positions(f);
            let cross = (p1 - p0).cross(&(p2 - p0));
            let Some(unit) = cross.try_normalize(f64::EPSILON) else {
                continue;
            };

            match weighting {
                NormalWeighting::Uniform => {
                    for v in corners {
                        sums[v.index()] += unit;
                    }
                }
                NormalWeighting::Area => {
                    for v in corners {
                        sums[v.index()] += cross;
                    }
                }
                NormalWeighting::Angle => {
                    let points = [p0, p1, p2];
                    for (k, v) in corners.into_iter().enumerate() {
                        let a = points[(k + 1) % 3] - points[k];
                        let b = points[(k + 2) % 3] - points[k];
                        sums[v.index()] += unit * a.angle(&b);
                    }
                }
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            if !vertex.removed {
                vertex.normal = sum
                    .try_normalize(f64::EPSILON)
                    .unwrap_or_else(Vector3::zeros);
            }
        }
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        id
    }

    /// Re-anchor a vertex so its fan can be swept from the anchor.
    ///
    /// On a boundary vertex the anchor becomes the outgoing half-edge whose
    /// preceding (incoming) half-edge has no opposite.
    pub(crate) fn adjust_outgoing_halfedge(&mut self, v: VertexId<I>) {
        let start = self.vertex(v).halfedge;
        if !start.is_valid() {
            return;
        }

        let mut he = start;
        loop {
            match self.opposite(self.prev(he)) {
                None => {
                    self.vertex_mut(v).halfedge = he;
                    return;
                }
                Some(outgoing) => {
                    he = outgoing;
                    if he == start {
                        return;
                    }
                }
            }
        }
    }

    // ==================== Removal ====================

    pub(crate) fn remove_vertex(&mut self, v: VertexId<I>) {
        let vertex = self.vertex_mut(v);
        if !vertex.removed {
            vertex.removed = true;
            vertex.halfedge = HalfEdgeId::invalid();
            self.removed_vertices += 1;
        }
    }

    pub(crate) fn remove_halfedge(&mut self, he: HalfEdgeId<I>) {
        let halfedge = self.halfedge_mut(he);
        if !halfedge.removed {
            halfedge.removed = true;
            halfedge.opposite = HalfEdgeId::invalid();
            self.removed_halfedges += 1;
        }
    }

    pub(crate) fn remove_face(&mut self, f: FaceId<I>) {
        let face = self.face_mut(f);
        if !face.removed {
            face.removed = true;
            self.removed_faces += 1;
        }
    }

    /// Drop removed elements and renumber the survivors contiguously.
    ///
    /// Relative order of surviving elements is preserved. Every handle held
    /// outside the mesh is invalidated.
    pub fn garbage_collection(&mut self) {
        if !self.has_garbage() {
            return;
        }

        let vertex_map = compact_map(self.vertices.iter().map(|v| v.removed));
        let halfedge_map = compact_map(self.halfedges.iter().map(|he| he.removed));
        let face_map = compact_map(self.faces.iter().map(|f| f.removed));

        let remap_vertex = |v: VertexId<I>| -> VertexId<I> {
            v.valid()
                .and_then(|v| vertex_map[v.index()])
                .map_or_else(VertexId::invalid, VertexId::new)
        };
        let remap_halfedge = |he: HalfEdgeId<I>| -> HalfEdgeId<I> {
            he.valid()
                .and_then(|he| halfedge_map[he.index()])
                .map_or_else(HalfEdgeId::invalid, HalfEdgeId::new)
        };
        let remap_face = |f: FaceId<I>| -> FaceId<I> {
            f.valid()
                .and_then(|f| face_map[f.index()])
                .map_or_else(FaceId::invalid, FaceId::new)
        };

        self.vertices.retain(|v| !v.removed);
        for vertex in &mut self.vertices {
            vertex.halfedge = remap_halfedge(vertex.halfedge);
        }

        self.halfedges.retain(|he| !he.removed);
        for he in &mut self.halfedges {
            he.origin = remap_vertex(he.origin);
            he.opposite = remap_halfedge(he.opposite);
            he.next = remap_halfedge(he.next);
            he.prev = remap_halfedge(he.prev);
            he.face = remap_face(he.face);
        }

        self.faces.retain(|f| !f.removed);
        for face in &mut self.faces {
            face.halfedge = remap_halfedge(face.halfedge);
        }

        self.diagnostics.retain_mut(|d| match d {
            Diagnostic::NonManifoldEdge { v0, v1, .. }
            | Diagnostic::InconsistentOrientation { v0, v1 } => {
                match (vertex_map[*v0], vertex_map[*v1]) {
                    (Some(a), Some(b)) => {
                        *v0 = a;
                        *v1 = b;
                        true
                    }
                    _ => false,
                }
            }
            Diagnostic::DecimationIncomplete { .. } => true,
        });

        self.removed_vertices = 0;
        self.removed_halfedges = 0;
        self.removed_faces = 0;
    }

    // ==================== Validation ====================

    /// Check that all live connectivity is consistent.
    pub fn is_valid(&self) -> bool {
        let live_he = |he: HalfEdgeId<I>| he.is_valid() && !self.halfedge(he).removed;

        for v in self.vertex_ids() {
            let anchor = self.vertex(v).halfedge;
            if anchor.is_valid() && (!live_he(anchor) || self.from_vertex(anchor) != v) {
                return false;
            }
        }

        for heid in self.halfedge_ids() {
            let he = self.halfedge(heid);

            if !live_he(he.next) || !live_he(he.prev) {
                return false;
            }
            if self.prev(he.next) != heid || self.next(he.prev) != heid {
                return false;
            }
            if self.next(self.next(he.next)) != heid {
                return false;
            }
            if !he.face.is_valid() || self.face(he.face).removed || self.face_of(he.next) != he.face
            {
                return false;
            }
            if he.origin == self.to_vertex(heid) {
                return false;
            }

            if let Some(opp) = he.opposite.valid() {
                if !live_he(opp) || self.halfedge(opp).opposite != heid {
                    return false;
                }
                if self.from_vertex(opp) != self.to_vertex(heid) || self.face_of(opp) == he.face {
                    return false;
                }
            }
        }

        for f in self.face_ids() {
            let he = self.face(f).halfedge;
            if !live_he(he) || self.face_of(he) != f {
                return false;
            }
        }

        true
    }
}

/// Old-slot to new-slot mapping for a compaction pass.
fn compact_map(removed: impl Iterator<Item = bool>) -> Vec<Option<usize>> {
    let mut next = 0;
    removed
        .map(|gone| {
            if gone {
                None
            } else {
                next += 1;
                Some(next - 1)
            }
        })
        .collect()
}

/// Iterator over the outgoing half-edges of a vertex.
///
/// Starts at the vertex anchor and rotates through neighbouring faces until
/// it returns to the anchor or reaches a boundary.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> VertexHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // he: v -> w, opposite: w -> v, and the half-edge after the opposite
        // leaves v again in the neighbouring face.
        match self.mesh.opposite(self.current) {
            Some(opp) => {
                self.current = self.mesh.next(opp);
                if self.current == self.start {
                    self.done = true;
                }
            }
            None => self.done = true,
        }

        Some(result)
    }
}
