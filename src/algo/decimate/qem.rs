//! Quadric Error Metrics (QEM) decimation by half-edge collapse.
//!
//! Every live vertex keeps its cheapest legal outgoing collapse in an
//! indexed min-heap. Collapsing `v0 -> v1` removes `v0` and the one or two
//! triangles on the edge, moves `v1` to the quadric-optimal position and
//! refreshes the candidates of `v1`'s one-ring. Removed elements stay as
//! tombstones until the final garbage collection.

use nalgebra::{Point3, Vector3};

use super::heap::IndexedHeap;
use super::quadric::Quadric;
use super::{DecimateOptions, DecimationReport};
use crate::algo::progress::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeId, HalfEdgeMesh, MeshIndex, NormalWeighting, VertexId};

/// Relative slack when re-validating a popped candidate.
const STALE_TOLERANCE: f64 = 1e-12;

/// Collapses between progress callbacks.
const PROGRESS_INTERVAL: usize = 64;

/// The cheapest legal collapse leaving a vertex.
#[derive(Debug, Clone, Copy)]
struct Candidate<I: MeshIndex> {
    /// Half-edge `v0 -> v1`; `v0` is removed.
    halfedge: HalfEdgeId<I>,
    position: Point3<f64>,
    cost: f64,
}

struct Decimator<'a, I: MeshIndex> {
    mesh: &'a mut HalfEdgeMesh<I>,
    options: &'a DecimateOptions,
    quadrics: Vec<Quadric>,
    /// Live outgoing half-edges per vertex slot.
    outgoing: Vec<Vec<HalfEdgeId<I>>>,
    heap: IndexedHeap,
}

pub(super) fn decimate_internal<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &DecimateOptions,
    progress: Option<&Progress>,
) -> Result<DecimationReport> {
    options.validate()?;
    if mesh.has_garbage() {
        mesh.garbage_collection();
    }

    let original = mesh.num_vertices();
    let requested = options.compute_target(original);
    if requested == 0 {
        return Err(MeshError::invalid_param(
            "target_vertices",
            requested,
            "must be positive",
        ));
    }

    if requested >= original {
        log::debug!(
            "Decimation skipped: {} vertices already at or below target {}",
            original,
            requested
        );
        return Ok(DecimationReport {
            original_vertices: original,
            requested_vertices: requested,
            achieved_vertices: original,
            collapses: 0,
        });
    }

    let mut decimator = Decimator::new(mesh, options);
    let collapses = decimator.run(requested, progress);

    mesh.garbage_collection();
    mesh.update_normals(NormalWeighting::default());

    let report = DecimationReport {
        original_vertices: original,
        requested_vertices: requested,
        achieved_vertices: mesh.num_vertices(),
        collapses,
    };

    log::info!(
        "QEM decimation: {} -> {} vertices ({} requested, {} collapses)",
        report.original_vertices,
        report.achieved_vertices,
        report.requested_vertices,
        report.collapses
    );
    if let Some(diagnostic) = report.diagnostic() {
        log::warn!("{}", diagnostic);
        mesh.push_diagnostic(diagnostic);
    }

    Ok(report)
}

impl<'a, I: MeshIndex> Decimator<'a, I> {
    fn new(mesh: &'a mut HalfEdgeMesh<I>, options: &'a DecimateOptions) -> Self {
        let slots = mesh.num_vertex_slots();

        let mut outgoing = vec![Vec::new(); slots];
        for he in mesh.halfedge_ids() {
            outgoing[mesh.from_vertex(he).index()].push(he);
        }

        let mut quadrics = vec![Quadric::zero(); slots];
        for f in mesh.face_ids() {
            let corners = mesh.face_triangle(f);
            let [p0, p1, p2] = mesh.face_positions(f);
            if let Some(q) = Quadric::from_triangle(&p0, &p1, &p2) {
                for v in corners {
                    quadrics[v.index()] += q;
                }
            }
        }

        if !options.preserve_boundary && options.boundary_weight > 0.0 {
            for he in mesh.halfedge_ids().filter(|&he| mesh.is_boundary(he)) {
                let (a, b) = (mesh.from_vertex(he), mesh.to_vertex(he));
                let normal = mesh.face_normal(mesh.face_of(he));
                if let Some(q) = Quadric::from_boundary_edge(
                    mesh.position(a),
                    mesh.position(b),
                    &normal,
                    options.boundary_weight,
                ) {
                    quadrics[a.index()] += q;
                    quadrics[b.index()] += q;
                }
            }
        }

        Self {
            mesh,
            options,
            quadrics,
            outgoing,
            heap: IndexedHeap::with_keys(slots),
        }
    }

    fn run(&mut self, target: usize, progress: Option<&Progress>) -> usize {
        let vertices: Vec<VertexId<I>> = self.mesh.vertex_ids().collect();
        for v in vertices {
            self.refresh(v);
        }
        log::debug!("QEM decimation: {} initial candidates", self.heap.len());

        let start = self.mesh.num_vertices();
        let total = start - target;
        let mut collapses = 0;

        while self.mesh.num_vertices() > target {
            let Some((slot, cost)) = self.heap.pop() else {
                break;
            };
            let v0 = VertexId::new(slot);

            if let Some(max_error) = self.options.max_error {
                if cost > max_error {
                    log::debug!("QEM decimation: stopping at error {:e}", cost);
                    break;
                }
            }

            // Neighbourhoods change under other collapses, so the queued
            // entry may be stale.
            let Some(candidate) = self.best_candidate(v0) else {
                continue;
            };
            if candidate.cost > cost + STALE_TOLERANCE * cost.abs().max(1.0) {
                self.heap.push_or_update(slot, candidate.cost);
                continue;
            }

            self.collapse(candidate);
            collapses += 1;

            if let Some(progress) = progress {
                if collapses % PROGRESS_INTERVAL == 0 {
                    let done = start - self.mesh.num_vertices();
                    progress.report(done, total, "QEM decimation");
                }
            }
        }

        if let Some(progress) = progress {
            progress.report(total, total, "QEM decimation");
        }

        collapses
    }

    /// Recompute and requeue the best collapse leaving `v`.
    fn refresh(&mut self, v: VertexId<I>) {
        match self.best_candidate(v) {
            Some(candidate) => self.heap.push_or_update(v.index(), candidate.cost),
            None => self.heap.remove(v.index()),
        }
    }

    fn best_candidate(&self, v0: VertexId<I>) -> Option<Candidate<I>> {
        let mut best: Option<Candidate<I>> = None;

        for &he in &self.outgoing[v0.index()] {
            if !self.is_collapse_legal(he) {
                continue;
            }
            let v1 = self.mesh.to_vertex(he);
            let (position, cost) = self.placement(v0, v1);

            if self.options.prevent_normal_flips && self.flips_normals(v0, v1, &position) {
                continue;
            }

            if best.map_or(true, |b| cost < b.cost) {
                best = Some(Candidate {
                    halfedge: he,
                    position,
                    cost,
                });
            }
        }

        best
    }

    /// Position of the merged vertex and its quadric error.
    fn placement(&self, v0: VertexId<I>, v1: VertexId<I>) -> (Point3<f64>, f64) {
        let q = self.quadrics[v0.index()] + self.quadrics[v1.index()];
        let p0 = *self.mesh.position(v0);
        let p1 = *self.mesh.position(v1);

        if self.options.preserve_boundary && self.is_boundary_vertex(v1) {
            return (p1, q.evaluate(&p1).max(0.0));
        }

        let midpoint = Point3::from((p0.coords + p1.coords) * 0.5);
        let edge_len = (p1 - p0).norm();

        if let Some(p) = q.optimal_point() {
            if (p - midpoint).norm() < edge_len * 2.0 {
                return (p, q.evaluate(&p).max(0.0));
            }
        }

        // Singular or far-off optimum: best of the kept endpoint, the
        // removed endpoint and the midpoint, in that order on ties.
        [p1, p0, midpoint]
            .into_iter()
            .map(|p| (p, q.evaluate(&p).max(0.0)))
            .fold(None, |best: Option<(Point3<f64>, f64)>, (p, e)| match best {
                Some((_, be)) if be <= e => best,
                _ => Some((p, e)),
            })
            .unwrap_or((p1, 0.0))
    }

    // ==================== Topology helpers ====================

    fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        self.outgoing[v.index()]
            .iter()
            .any(|&he| self.mesh.is_boundary(he) || self.mesh.is_boundary(self.mesh.prev(he)))
    }

    /// Sorted, deduplicated one-ring of `v`.
    fn ring(&self, v: VertexId<I>) -> Vec<VertexId<I>> {
        let mut ring: Vec<VertexId<I>> = self.outgoing[v.index()]
            .iter()
            .flat_map(|&he| [self.mesh.to_vertex(he), self.mesh.opposite_vertex(he)])
            .collect();
        ring.sort_unstable();
        ring.dedup();
        ring
    }

    /// Whether collapsing `he` keeps the mesh a valid triangle mesh.
    fn is_collapse_legal(&self, he: HalfEdgeId<I>) -> bool {
        let mesh = &*self.mesh;
        let v0 = mesh.from_vertex(he);
        let v1 = mesh.to_vertex(he);
        let opp = mesh.opposite(he);

        let v0_boundary = self.is_boundary_vertex(v0);
        if self.options.preserve_boundary && v0_boundary {
            return false;
        }

        // Interior edge joining two boundary vertices would pinch the surface.
        if opp.is_some() && v0_boundary && self.is_boundary_vertex(v1) {
            return false;
        }

        // Triangles on the edge and their third corners.
        let mut edge_halfedges = vec![he];
        edge_halfedges.extend(opp);
        let mut thirds: Vec<VertexId<I>> = edge_halfedges
            .iter()
            .map(|&h| mesh.opposite_vertex(h))
            .collect();
        if thirds.len() == 2 && thirds[0] == thirds[1] {
            return false;
        }

        // Any other face spanning v0 and v1 means the edge is not a clean
        // two-face edge.
        let spanning = self.outgoing[v0.index()]
            .iter()
            .filter(|&&h| mesh.to_vertex(h) == v1 || mesh.opposite_vertex(h) == v1)
            .count();
        if spanning != edge_halfedges.len() {
            return false;
        }

        // A triangle whose other two edges are already boundary would leave
        // a dangling edge behind.
        for &h in &edge_halfedges {
            if mesh.is_boundary(mesh.next(h)) && mesh.is_boundary(mesh.prev(h)) {
                return false;
            }
        }

        // Link condition: the shared neighbours are exactly the third corners.
        let ring0 = self.ring(v0);
        let ring1 = self.ring(v1);
        let mut common: Vec<VertexId<I>> = ring0
            .iter()
            .copied()
            .filter(|v| ring1.binary_search(v).is_ok())
            .collect();
        common.sort_unstable();
        thirds.sort_unstable();
        if common != thirds {
            return false;
        }

        // Third corners lose an edge; they must keep enough to stay a fan.
        for &t in &thirds {
            let valence = self.ring(t).len();
            let minimum = if self.is_boundary_vertex(t) { 2 } else { 3 };
            if valence <= minimum {
                return false;
            }
        }

        true
    }

    /// Whether moving `v0` and `v1` to `p` turns any surviving face over.
    fn flips_normals(&self, v0: VertexId<I>, v1: VertexId<I>, p: &Point3<f64>) -> bool {
        let mesh = &*self.mesh;

        self.outgoing[v0.index()]
            .iter()
            .chain(&self.outgoing[v1.index()])
            .map(|&he| mesh.face_of(he))
            .any(|f| {
                let corners = mesh.face_triangle(f);
                if corners.contains(&v0) && corners.contains(&v1) {
                    return false;
                }

                let before = corners.map(|v| *mesh.position(v));
                let after = corners.map(|v| if v == v0 || v == v1 { *p } else { *mesh.position(v) });

                let n_before = triangle_cross(&before);
                let n_after = triangle_cross(&after);
                n_before.dot(&n_after) <= 0.0
            })
    }

    // ==================== Collapse ====================

    fn collapse(&mut self, candidate: Candidate<I>) {
        let he = candidate.halfedge;
        let v0 = self.mesh.from_vertex(he);
        let v1 = self.mesh.to_vertex(he);

        let mut edge_halfedges = vec![he];
        edge_halfedges.extend(self.mesh.opposite(he));

        let mut touched = vec![v1];
        for e in edge_halfedges {
            let a = self.mesh.next(e);
            let b = self.mesh.prev(e);
            touched.push(self.mesh.from_vertex(b));

            // The two outer edges of the vanishing triangle become one edge.
            let oa = self.mesh.opposite(a);
            let ob = self.mesh.opposite(b);
            if let Some(oa) = oa {
                self.mesh.halfedge_mut(oa).opposite = ob.unwrap_or_else(HalfEdgeId::invalid);
            }
            if let Some(ob) = ob {
                self.mesh.halfedge_mut(ob).opposite = oa.unwrap_or_else(HalfEdgeId::invalid);
            }

            let face = self.mesh.face_of(e);
            self.mesh.remove_face(face);
            for h in [e, a, b] {
                let origin = self.mesh.from_vertex(h).index();
                self.outgoing[origin].retain(|&x| x != h);
                self.mesh.remove_halfedge(h);
            }
        }

        let moved = std::mem::take(&mut self.outgoing[v0.index()]);
        for &h in &moved {
            self.mesh.halfedge_mut(h).origin = v1;
        }
        self.outgoing[v1.index()].extend(moved);

        self.mesh.remove_vertex(v0);
        self.heap.remove(v0.index());
        self.mesh.set_position(v1, candidate.position);
        let q0 = self.quadrics[v0.index()];
        self.quadrics[v1.index()] += q0;

        for &v in &touched {
            let anchor = self.outgoing[v.index()]
                .first()
                .copied()
                .unwrap_or_else(HalfEdgeId::invalid);
            self.mesh.vertex_mut(v).halfedge = anchor;
            self.mesh.adjust_outgoing_halfedge(v);
        }

        self.refresh(v1);
        for v in self.ring(v1) {
            self.refresh(v);
        }
    }
}

fn triangle_cross(p: &[Point3<f64>; 3]) -> Vector3<f64> {
    (p[1] - p[0]).cross(&(p[2] - p[0]))
}
