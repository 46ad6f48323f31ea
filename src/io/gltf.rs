//! glTF format support (loading only).
//!
//! All triangle primitives of all meshes in the document are merged into
//! one polygon soup. Node transforms are not applied. Point and line
//! primitives are skipped.

use std::path::Path;

use ::gltf::mesh::Mode;
use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::PolygonSoup;

/// Read the vertices and triangles of a glTF or GLB file.
pub fn read<P: AsRef<Path>>(path: P) -> Result<PolygonSoup> {
    let path = path.as_ref();

    let (document, buffers, _images) =
        ::gltf::import(path).map_err(|e| MeshError::load(path, e.to_string()))?;

    let mut soup = PolygonSoup::default();

    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let offset = soup.vertices.len();
            soup.vertices.extend(
                positions.map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64)),
            );
            let count = soup.vertices.len() - offset;

            // Non-indexed primitives draw their vertices in order.
            let indices: Vec<usize> = match reader.read_indices() {
                Some(indices) => indices.into_u32().map(|i| i as usize + offset).collect(),
                None => (offset..offset + count).collect(),
            };

            match primitive.mode() {
                Mode::Triangles => {
                    soup.faces
                        .extend(indices.chunks_exact(3).map(|c| vec![c[0], c[1], c[2]]));
                }
                Mode::TriangleStrip => {
                    for i in 0..indices.len().saturating_sub(2) {
                        // Odd triangles are wound the other way.
                        let face = if i % 2 == 0 {
                            vec![indices[i], indices[i + 1], indices[i + 2]]
                        } else {
                            vec![indices[i], indices[i + 2], indices[i + 1]]
                        };
                        soup.faces.push(face);
                    }
                }
                Mode::TriangleFan => {
                    for i in 1..indices.len().saturating_sub(1) {
                        soup.faces.push(vec![indices[0], indices[i], indices[i + 1]]);
                    }
                }
                other => {
                    log::debug!("{}: skipping {:?} primitive", path.display(), other);
                }
            }
        }
    }

    Ok(soup)
}
