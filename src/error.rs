//! Error types for inkline.
//!
//! Fatal conditions are reported as [`MeshError`]. Conditions that are
//! handled by local policy (an edge falling back to boundary, a decimation
//! target that could not be reached) are reported as [`Diagnostic`] values
//! and never abort a rebuild.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face repeats a vertex index.
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A face does not have exactly three vertices.
    #[error("face {face} has {arity} vertices, only triangles are supported")]
    NonTriangularFace {
        /// The face index.
        face: usize,
        /// Number of vertex indices in the face.
        arity: usize,
    },

    /// The bounding box has no extent, so no normalization scale exists.
    #[error("mesh bounding box is degenerate (largest half-extent {extent:e})")]
    DegenerateMesh {
        /// The largest half-extent found.
        extent: f64,
    },

    /// A vertex index does not fit the requested index width.
    #[error("vertex index {index} does not fit in {bits}-bit indices")]
    IndexOverflow {
        /// The offending index.
        index: usize,
        /// Width of the target index type.
        bits: u32,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid mesh state for the requested operation.
    #[error("invalid mesh state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a load error for a file.
    pub fn load<P: Into<PathBuf>, M: Into<String>>(path: P, message: M) -> Self {
        MeshError::LoadError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the mesh source could not be turned into a mesh.
    ///
    /// These abort a rebuild before anything is published.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            MeshError::EmptyMesh
                | MeshError::InvalidVertexIndex { .. }
                | MeshError::DegenerateFace { .. }
                | MeshError::NonTriangularFace { .. }
                | MeshError::Io(_)
                | MeshError::LoadError { .. }
                | MeshError::UnsupportedFormat { .. }
        )
    }
}

/// A non-fatal condition found while building or processing a mesh.
///
/// Vertex indices refer to the vertex numbering of the mesh the diagnostic
/// is attached to; they are remapped when the mesh is compacted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An edge is shared by more than two faces and is treated as boundary.
    #[error("edge ({v0}, {v1}) has {faces} incident faces, treated as boundary")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
        /// Number of incident faces.
        faces: usize,
    },

    /// Two faces traverse a shared edge in the same direction.
    #[error("edge ({v0}, {v1}) is traversed twice in the same direction, treated as boundary")]
    InconsistentOrientation {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// Decimation stopped before the requested vertex count.
    #[error("decimation reached {achieved} vertices, {requested} requested")]
    DecimationIncomplete {
        /// Requested vertex count.
        requested: usize,
        /// Vertex count actually reached.
        achieved: usize,
    },
}
