//! Mesh file I/O.
//!
//! Every loader first reads the file into a [`PolygonSoup`] and then builds
//! the half-edge mesh from it, so all formats share the same validation and
//! the same non-manifold handling.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Positions and faces only |
//! | Object File Format | `.off` | ✓ | ✓ | ASCII |
//! | PLY | `.ply` | ✓ | ✓ | Saved as ASCII |
//! | STL | `.stl` | ✓ | ✓ | Binary and ASCII in, binary out |
//! | glTF | `.gltf`, `.glb` | ✓ | ✗ | Triangle primitives only |
//!
//! # Usage
//!
//! ```no_run
//! use inkline::io::{load_with, save, LoadOptions};
//! use inkline::mesh::HalfEdgeMesh;
//!
//! // Quads and n-gons are rejected unless triangulation is requested.
//! let options = LoadOptions::default().with_triangulate(true);
//! let mesh: HalfEdgeMesh = load_with("model.obj", &options).unwrap();
//!
//! save(&mesh, "output.ply").unwrap();
//! ```

pub mod gltf;
pub mod obj;
pub mod off;
pub mod ply;
pub mod stl;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, HalfEdgeMesh, MeshIndex, PolygonSoup};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// Object File Format.
    Off,
    /// STL (stereolithography) format.
    Stl,
    /// PLY (Stanford polygon) format.
    Ply,
    /// glTF format.
    Gltf,
    /// glTF binary format.
    Glb,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "off" => Some(Format::Off),
            "stl" => Some(Format::Stl),
            "ply" => Some(Format::Ply),
            "gltf" => Some(Format::Gltf),
            "glb" => Some(Format::Glb),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }

    fn detect(path: &Path) -> Result<Format> {
        Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("(none)")
                .to_string(),
        })
    }
}

/// Options for turning a file into a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Fan-triangulate faces with more than three corners instead of
    /// rejecting them.
    pub triangulate: bool,
}

impl LoadOptions {
    /// Set whether polygons are triangulated.
    pub fn with_triangulate(mut self, triangulate: bool) -> Self {
        self.triangulate = triangulate;
        self
    }
}

/// Read a file's raw vertices and faces without building a mesh.
pub fn read<P: AsRef<Path>>(path: P) -> Result<PolygonSoup> {
    let path = path.as_ref();
    let soup = match Format::detect(path)? {
        Format::Obj => obj::read(path),
        Format::Off => off::read(path),
        Format::Stl => stl::read(path),
        Format::Ply => ply::read(path),
        Format::Gltf | Format::Glb => gltf::read(path),
    }?;

    if soup.faces.is_empty() {
        return Err(MeshError::load(path, "file contains no faces"));
    }

    log::info!(
        "Read {}: {} vertices, {} faces",
        path.display(),
        soup.vertices.len(),
        soup.faces.len()
    );
    Ok(soup)
}

/// Load a mesh from a file with automatic format detection and strict
/// triangle checking.
///
/// # Example
///
/// ```no_run
/// use inkline::io::load;
/// use inkline::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    load_with(path, &LoadOptions::default())
}

/// Load a mesh from a file with explicit options.
pub fn load_with<P: AsRef<Path>, I: MeshIndex>(
    path: P,
    options: &LoadOptions,
) -> Result<HalfEdgeMesh<I>> {
    let soup = read(path)?;
    build_from_polygons(&soup, options.triangulate)
}

/// Save a mesh to a file with automatic format detection.
///
/// # Example
///
/// ```no_run
/// use inkline::io::save;
/// use inkline::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// save(&mesh, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();

    match Format::detect(path)? {
        Format::Obj => obj::save(mesh, path),
        Format::Off => off::save(mesh, path),
        Format::Stl => stl::save(mesh, path),
        Format::Ply => ply::save(mesh, path),
        Format::Gltf | Format::Glb => Err(MeshError::SaveError {
            path: path.to_path_buf(),
            message: "glTF saving is not supported".to_string(),
        }),
    }
}
