//! Mesh decimation (simplification).
//!
//! Reduces a triangle mesh to a target vertex count while preserving its
//! overall shape, editing the half-edge store in place.
//!
//! # Quadric Error Metrics (QEM)
//!
//! Each vertex accumulates a quadric measuring squared distance to the
//! planes of its original faces. Edges are collapsed cheapest-first; the
//! surviving vertex moves to the point minimising the combined quadric.
//! A collapse that would break the triangle mesh (link condition, pinched
//! boundaries, degenerate fans, flipped faces) is never performed, so the
//! requested count may not always be reached. The returned
//! [`DecimationReport`] says how far it got.
//!
//! # Example
//!
//! ```no_run
//! use inkline::prelude::*;
//! use inkline::algo::decimate::{qem_decimate, DecimateOptions};
//!
//! let mut mesh: HalfEdgeMesh = inkline::io::load("input.obj").unwrap();
//!
//! let report = qem_decimate(&mut mesh, &DecimateOptions::with_target_vertices(200)).unwrap();
//! if !report.is_complete() {
//!     eprintln!("stopped at {} vertices", report.achieved_vertices);
//! }
//! ```
//!
//! # References
//!
//! - Garland, M. & Heckbert, P. (1997). "Surface Simplification Using Quadric
//!   Error Metrics." SIGGRAPH '97.

mod heap;
mod qem;
mod quadric;

use crate::algo::progress::Progress;
use crate::error::{Diagnostic, MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Options for mesh decimation.
#[derive(Debug, Clone)]
pub struct DecimateOptions {
    /// Target number of vertices after decimation.
    /// If None, uses target_ratio instead.
    pub target_vertices: Option<usize>,

    /// Target ratio of vertices to keep (0.0 to 1.0).
    /// Only used if target_vertices is None.
    pub target_ratio: f64,

    /// Never remove boundary vertices or move them.
    pub preserve_boundary: bool,

    /// Weight of the constraint planes added along boundary edges.
    ///
    /// Only used when `preserve_boundary` is off; zero disables them.
    pub boundary_weight: f64,

    /// Maximum allowed error for a single collapse.
    /// Decimation stops once the cheapest collapse exceeds it.
    pub max_error: Option<f64>,

    /// Reject collapses that turn a surviving face over.
    pub prevent_normal_flips: bool,
}

impl Default for DecimateOptions {
    fn default() -> Self {
        Self {
            target_vertices: None,
            target_ratio: 0.5,
            preserve_boundary: false,
            boundary_weight: 1000.0,
            max_error: None,
            prevent_normal_flips: true,
        }
    }
}

impl DecimateOptions {
    /// Create options to reduce to a target number of vertices.
    pub fn with_target_vertices(target: usize) -> Self {
        Self {
            target_vertices: Some(target),
            ..Self::default()
        }
    }

    /// Create options to reduce to a ratio of the original vertex count.
    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_ratio: ratio.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    /// Set whether to preserve boundary vertices.
    pub fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.preserve_boundary = preserve;
        self
    }

    /// Set the boundary constraint weight.
    pub fn with_boundary_weight(mut self, weight: f64) -> Self {
        self.boundary_weight = weight;
        self
    }

    /// Set maximum error threshold for collapses.
    pub fn with_max_error(mut self, max_error: f64) -> Self {
        self.max_error = Some(max_error);
        self
    }

    /// Set whether collapses that flip a face are rejected.
    pub fn with_prevent_normal_flips(mut self, prevent: bool) -> Self {
        self.prevent_normal_flips = prevent;
        self
    }

    /// Compute the target number of vertices given the original count.
    pub fn compute_target(&self, original_vertices: usize) -> usize {
        match self.target_vertices {
            Some(target) => target,
            None => ((original_vertices as f64) * self.target_ratio).round() as usize,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.boundary_weight.is_finite() || self.boundary_weight < 0.0 {
            return Err(MeshError::invalid_param(
                "boundary_weight",
                self.boundary_weight,
                "must be finite and non-negative",
            ));
        }
        if let Some(max_error) = self.max_error {
            if max_error.is_nan() || max_error < 0.0 {
                return Err(MeshError::invalid_param(
                    "max_error",
                    max_error,
                    "must be non-negative",
                ));
            }
        }
        Ok(())
    }
}

/// Outcome of a decimation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimationReport {
    /// Live vertices before decimation.
    pub original_vertices: usize,
    /// Vertex count that was asked for.
    pub requested_vertices: usize,
    /// Live vertices after decimation.
    pub achieved_vertices: usize,
    /// Number of edge collapses performed.
    pub collapses: usize,
}

impl DecimationReport {
    /// Whether the requested count was reached.
    pub fn is_complete(&self) -> bool {
        self.achieved_vertices <= self.requested_vertices
    }

    /// The diagnostic to surface when the target was not reached.
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        (!self.is_complete()).then_some(Diagnostic::DecimationIncomplete {
            requested: self.requested_vertices,
            achieved: self.achieved_vertices,
        })
    }
}

/// Performs QEM decimation on a triangle mesh.
///
/// The mesh is edited in place and compacted before returning, so every
/// previously held handle is invalidated. Vertex normals are refreshed.
///
/// # Errors
///
/// Returns [`MeshError::InvalidParameter`] for a zero target or invalid
/// weights. Failing to reach the target is not an error; check
/// [`DecimationReport::is_complete`].
pub fn qem_decimate<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &DecimateOptions,
) -> Result<DecimationReport> {
    qem::decimate_internal(mesh, options, None)
}

/// QEM decimation with progress reporting.
pub fn qem_decimate_with_progress<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &DecimateOptions,
    progress: &Progress,
) -> Result<DecimationReport> {
    qem::decimate_internal(mesh, options, Some(progress))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_target() {
        assert_eq!(DecimateOptions::with_target_vertices(200).compute_target(1000), 200);
        assert_eq!(DecimateOptions::with_target_vertices(2000).compute_target(1000), 2000);
        assert_eq!(DecimateOptions::with_target_ratio(0.25).compute_target(1000), 250);
        assert_eq!(DecimateOptions::with_target_ratio(7.0).target_ratio, 1.0);
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        assert!(DecimateOptions::default().validate().is_ok());
        assert!(DecimateOptions::default()
            .with_boundary_weight(-1.0)
            .validate()
            .is_err());
        assert!(DecimateOptions::default()
            .with_max_error(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_report_completeness() {
        let done = DecimationReport {
            original_vertices: 100,
            requested_vertices: 20,
            achieved_vertices: 20,
            collapses: 80,
        };
        assert!(done.is_complete());
        assert_eq!(done.diagnostic(), None);

        let short = DecimationReport {
            achieved_vertices: 24,
            collapses: 76,
            ..done
        };
        assert!(!short.is_complete());
        assert_eq!(
            short.diagnostic(),
            Some(Diagnostic::DecimationIncomplete {
                requested: 20,
                achieved: 24
            })
        );
    }
}
