//! Quadric error metric.

use std::ops::{Add, AddAssign};

use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// A symmetric 4x4 quadric measuring squared distance to a set of planes.
///
/// Only the upper triangle is stored:
/// ```text
/// | a b c d |
/// | b e f g |
/// | c f h i |
/// | d g i j |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Quadric {
    data: [f64; 10],
}

impl Quadric {
    /// The zero quadric.
    pub fn zero() -> Self {
        Self { data: [0.0; 10] }
    }

    /// Quadric of the plane `n·x + d = 0`, scaled by `weight`.
    ///
    /// `n` is expected to be unit length.
    pub fn from_plane(n: &Vector3<f64>, d: f64, weight: f64) -> Self {
        let (a, b, c) = (n.x, n.y, n.z);
        let data = [
            a * a,
            a * b,
            a * c,
            a * d,
            b * b,
            b * c,
            b * d,
            c * c,
            c * d,
            d * d,
        ];
        Self {
            data: data.map(|x| x * weight),
        }
    }

    /// Quadric of a triangle's supporting plane, `None` if degenerate.
    pub fn from_triangle(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Option<Self> {
        let n = (p1 - p0).cross(&(p2 - p0)).try_normalize(1e-12)?;
        Some(Self::from_plane(&n, -n.dot(&p0.coords), 1.0))
    }

    /// Constraint plane through the edge `p0 -> p1`, perpendicular to the
    /// adjacent face whose unit normal is `face_normal`.
    pub fn from_boundary_edge(
        p0: &Point3<f64>,
        p1: &Point3<f64>,
        face_normal: &Vector3<f64>,
        weight: f64,
    ) -> Option<Self> {
        let n = (p1 - p0).cross(face_normal).try_normalize(1e-12)?;
        Some(Self::from_plane(&n, -n.dot(&p0.coords), weight))
    }

    /// Evaluate `vᵀ Q v` for `v = [x, y, z, 1]`.
    pub fn evaluate(&self, p: &Point3<f64>) -> f64 {
        let [a, b, c, d, e, f, g, h, i, j] = self.data;
        let (x, y, z) = (p.x, p.y, p.z);

        a * x * x
            + 2.0 * b * x * y
            + 2.0 * c * x * z
            + 2.0 * d * x
            + e * y * y
            + 2.0 * f * y * z
            + 2.0 * g * y
            + h * z * z
            + 2.0 * i * z
            + j
    }

    fn to_matrix(self) -> Matrix4<f64> {
        let [a, b, c, d, e, f, g, h, i, j] = self.data;
        Matrix4::new(
            a, b, c, d, //
            b, e, f, g, //
            c, f, h, i, //
            d, g, i, j,
        )
    }

    /// The point minimising this quadric, `None` if the system is singular.
    pub fn optimal_point(&self) -> Option<Point3<f64>> {
        let mut m = self.to_matrix();
        m[(3, 0)] = 0.0;
        m[(3, 1)] = 0.0;
        m[(3, 2)] = 0.0;
        m[(3, 3)] = 1.0;

        let v = m.try_inverse()? * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let p = Point3::new(v.x, v.y, v.z);
        p.coords.iter().all(|c| c.is_finite()).then_some(p)
    }
}

impl AddAssign for Quadric {
    fn add_assign(&mut self, other: Quadric) {
        for (lhs, rhs) in self.data.iter_mut().zip(other.data) {
            *lhs += rhs;
        }
    }
}

impl Add for Quadric {
    type Output = Quadric;

    fn add(mut self, other: Quadric) -> Quadric {
        self += other;
        self
    }
}
