//! Bounding box and unit-scale normalization.
//!
//! [`Normalization`] maps a mesh into the cube `[-1, 1]³` centred on the
//! origin with one uniform scale. Stored positions are never changed; the
//! transform is handed to the renderer as a model matrix.

use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Half-extents at or below this are treated as zero.
pub const MIN_HALF_EXTENT: f64 = 1e-12;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Component-wise minimum.
    pub min: Point3<f64>,
    /// Component-wise maximum.
    pub max: Point3<f64>,
}

impl BoundingBox {
    /// Bounding box of a point set, `None` if it is empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;

        Some(points.fold(
            Self {
                min: first,
                max: first,
            },
            |b, p| Self {
                min: b.min.inf(p),
                max: b.max.sup(p),
            },
        ))
    }

    /// Bounding box of all live vertices, `None` for a mesh without vertices.
    pub fn of_mesh<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Option<Self> {
        Self::from_points(mesh.vertex_ids().map(|v| mesh.position(v)))
    }

    /// Midpoint of the box.
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// `max - center` per axis.
    pub fn half_extent(&self) -> Vector3<f64> {
        self.max - self.center()
    }

    /// Full size per axis.
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }
}

/// Uniform scale and centre that fit a mesh into `[-1, 1]³`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    /// The box the transform was derived from.
    pub bounds: BoundingBox,
    /// Midpoint of the bounding box.
    pub center: Point3<f64>,
    /// `1 / max(half-extent)`.
    pub scale: f64,
}

impl Normalization {
    /// Compute the normalization of a mesh's live vertices.
    ///
    /// # Errors
    ///
    /// [`MeshError::DegenerateMesh`] if the mesh has no vertices or its
    /// largest half-extent is at most [`MIN_HALF_EXTENT`].
    pub fn from_mesh<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Result<Self> {
        let bounds = BoundingBox::of_mesh(mesh).ok_or(MeshError::DegenerateMesh { extent: 0.0 })?;
        Self::from_bounds(bounds)
    }

    /// Compute the normalization of a bounding box.
    pub fn from_bounds(bounds: BoundingBox) -> Result<Self> {
        let center = bounds.center();
        let extent = bounds.half_extent().max();

        // Also rejects NaN.
        if !(extent > MIN_HALF_EXTENT) {
            return Err(MeshError::DegenerateMesh { extent });
        }

        Ok(Self {
            bounds,
            center,
            scale: 1.0 / extent,
        })
    }

    /// Map a point into the normalized frame.
    pub fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from((p - self.center) * self.scale)
    }

    /// Model matrix `scale · translate(-center)` for the renderer.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        let m = Matrix4::new_scaling(self.scale) * Matrix4::new_translation(&(-self.center.coords));
        m.cast::<f32>()
    }

    /// Centre as three floats.
    pub fn center_f32(&self) -> [f32; 3] {
        [
            self.center.x as f32,
            self.center.y as f32,
            self.center.z as f32,
        ]
    }

    /// Scale as a float.
    pub fn scale_f32(&self) -> f32 {
        self.scale as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;

    fn tetrahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
        ];
        let faces = vec![[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn max_abs(p: &Point3<f64>) -> f64 {
        p.coords.amax()
    }

    #[test]
    fn test_bounding_box() {
        let points = [
            Point3::new(1.0, -2.0, 3.0),
            Point3::new(-1.0, 4.0, 0.0),
            Point3::new(0.0, 0.0, 5.0),
        ];
        let b = BoundingBox::from_points(&points).unwrap();
        assert_eq!(b.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Point3::new(1.0, 4.0, 5.0));
        assert_eq!(b.center(), Point3::new(0.0, 1.0, 2.5));
        assert_eq!(b.half_extent(), Vector3::new(1.0, 3.0, 2.5));

        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_regular_tetrahedron_scale() {
        let mesh = tetrahedron();
        let n = Normalization::from_mesh(&mesh).unwrap();

        assert_eq!(n.center, Point3::origin());
        assert!((n.scale - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_points_fill_unit_cube() {
        let vertices = vec![
            Point3::new(10.0, 20.0, 30.0),
            Point3::new(14.0, 21.0, 30.5),
            Point3::new(12.0, 26.0, 31.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let n = Normalization::from_mesh(&mesh).unwrap();

        let extents: Vec<f64> = vertices.iter().map(|p| max_abs(&n.apply(p))).collect();
        assert!(extents.iter().all(|&e| e <= 1.0 + 1e-12));
        assert!(extents.iter().any(|&e| (e - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_model_matrix_matches_apply() {
        let vertices = vec![
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(4.0, 2.0, 1.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let n = Normalization::from_mesh(&mesh).unwrap();
        let m = n.model_matrix();

        for p in &vertices {
            let expected = n.apply(p);
            let got = m.transform_point(&p.cast::<f32>());
            assert!((got.x as f64 - expected.x).abs() < 1e-6);
            assert!((got.y as f64 - expected.y).abs() < 1e-6);
            assert!((got.z as f64 - expected.z).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_extent_fails() {
        let single = BoundingBox::from_points(&[Point3::new(1.0, 1.0, 1.0)]).unwrap();
        assert!(matches!(
            Normalization::from_bounds(single),
            Err(MeshError::DegenerateMesh { .. })
        ));

        let empty: HalfEdgeMesh = HalfEdgeMesh::new();
        assert!(matches!(
            Normalization::from_mesh(&empty),
            Err(MeshError::DegenerateMesh { .. })
        ));
    }

    #[test]
    fn test_flat_mesh_is_not_degenerate() {
        // Zero thickness along one axis is fine as long as another axis has extent.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let n = Normalization::from_mesh(&mesh).unwrap();
        assert!((n.scale - 1.0).abs() < 1e-12);
    }
}
