//! Rebuild pipeline: load → decimate → normals → normalize → adjacency.
//!
//! [`rebuild`] is a pure function of a [`MeshSource`] and a
//! [`RebuildConfig`]. It always starts from a fresh load, so toggling
//! simplification never compounds decimation passes. [`ViewerCore`] keeps
//! the last successful [`RenderBuffers`] and only replaces them when a new
//! rebuild completes.
//!
//! # Example
//!
//! ```
//! use inkline::pipeline::{rebuild, InMemorySource, RebuildConfig};
//! use nalgebra::Point3;
//!
//! let source = InMemorySource::from_triangles(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(2.0, 0.0, 0.0),
//!         Point3::new(0.0, 2.0, 0.0),
//!     ],
//!     &[[0, 1, 2]],
//! );
//!
//! let buffers = rebuild(&source, &RebuildConfig::default()).unwrap();
//! assert_eq!(buffers.adjacency, vec![0, 0, 1, 1, 2, 2]);
//! assert_eq!(buffers.normalization.scale, 1.0);
//! ```

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use nalgebra::{Matrix4, Point3};

use crate::algo::adjacency::{build_adjacency, self_paired_count};
use crate::algo::bounds::Normalization;
use crate::algo::decimate::{qem_decimate, DecimateOptions, DecimationReport};
use crate::error::{Diagnostic, MeshError, Result};
use crate::io::{self, LoadOptions};
use crate::mesh::{build_from_polygons, HalfEdgeMesh, NormalWeighting, PolygonSoup};

/// Default simplification target.
pub const DEFAULT_TARGET_VERTEX_COUNT: usize = 200;

/// Caller-supplied settings for one rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildConfig {
    /// Run decimation before building buffers.
    pub simplification_enabled: bool,
    /// Vertex count decimation aims for. Must be positive.
    pub target_vertex_count: usize,
    /// How face normals are combined into vertex normals.
    pub normal_weighting: NormalWeighting,
    /// Keep boundary vertices fixed during decimation.
    pub preserve_boundary: bool,
    /// Options passed to the loader.
    pub load: LoadOptions,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            simplification_enabled: false,
            target_vertex_count: DEFAULT_TARGET_VERTEX_COUNT,
            normal_weighting: NormalWeighting::default(),
            preserve_boundary: false,
            load: LoadOptions::default(),
        }
    }
}

impl RebuildConfig {
    /// Set whether decimation runs.
    pub fn with_simplification(mut self, enabled: bool) -> Self {
        self.simplification_enabled = enabled;
        self
    }

    /// Set the decimation target.
    pub fn with_target_vertex_count(mut self, target: usize) -> Self {
        self.target_vertex_count = target;
        self
    }

    /// Set the vertex normal weighting.
    pub fn with_normal_weighting(mut self, weighting: NormalWeighting) -> Self {
        self.normal_weighting = weighting;
        self
    }

    /// Set whether decimation keeps boundary vertices.
    pub fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.preserve_boundary = preserve;
        self
    }

    /// Set the loader options.
    pub fn with_load_options(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }

    /// Check the configuration before any work is done.
    pub fn validate(&self) -> Result<()> {
        if self.target_vertex_count == 0 {
            return Err(MeshError::invalid_param(
                "target_vertex_count",
                self.target_vertex_count,
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Decimation options derived from this configuration.
    pub fn decimate_options(&self) -> DecimateOptions {
        DecimateOptions::with_target_vertices(self.target_vertex_count)
            .with_preserve_boundary(self.preserve_boundary)
    }
}

/// Where a rebuild gets its mesh from.
///
/// Every call must produce a fresh, unmodified mesh.
pub trait MeshSource: Debug {
    /// Load a new copy of the mesh.
    fn load(&self, options: &LoadOptions) -> Result<HalfEdgeMesh>;
}

/// A mesh file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Source reading `path` with format detection by extension.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// The file this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MeshSource for FileSource {
    fn load(&self, options: &LoadOptions) -> Result<HalfEdgeMesh> {
        io::load_with(&self.path, options)
    }
}

/// A mesh held in memory as raw vertices and faces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InMemorySource {
    soup: PolygonSoup,
}

impl InMemorySource {
    /// Source from vertices and faces of any arity.
    pub fn new(vertices: Vec<Point3<f64>>, faces: Vec<Vec<usize>>) -> Self {
        Self {
            soup: PolygonSoup { vertices, faces },
        }
    }

    /// Source from vertices and triangles.
    pub fn from_triangles(vertices: Vec<Point3<f64>>, faces: &[[usize; 3]]) -> Self {
        Self {
            soup: PolygonSoup::from_triangles(vertices, faces),
        }
    }
}

impl From<PolygonSoup> for InMemorySource {
    fn from(soup: PolygonSoup) -> Self {
        Self { soup }
    }
}

impl MeshSource for InMemorySource {
    fn load(&self, options: &LoadOptions) -> Result<HalfEdgeMesh> {
        build_from_polygons(&self.soup, options.triangulate)
    }
}

/// Flat arrays handed to the renderer after a rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBuffers {
    /// `3 × vertices` floats, xyz per vertex.
    pub positions: Vec<f32>,
    /// `3 × vertices` floats, same order as `positions`.
    pub normals: Vec<f32>,
    /// `6 × faces` indices in triangles-with-adjacency layout.
    pub adjacency: Vec<u32>,
    /// Scale and centre for the model transform.
    pub normalization: Normalization,
    /// Outcome of decimation, if it ran.
    pub decimation: Option<DecimationReport>,
    /// Non-fatal conditions met while building these buffers.
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderBuffers {
    /// Number of vertices described by the attribute arrays.
    pub fn num_vertices(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles described by the adjacency stream.
    pub fn num_faces(&self) -> usize {
        self.adjacency.len() / 6
    }

    /// Adjacency pairs whose apex repeats the corner (boundary edges).
    pub fn self_paired_slots(&self) -> usize {
        self_paired_count(&self.adjacency)
    }

    /// The adjacency stream narrowed to 16-bit indices.
    pub fn adjacency_u16(&self) -> Result<Vec<u16>> {
        self.adjacency
            .iter()
            .map(|&i| {
                u16::try_from(i).map_err(|_| MeshError::IndexOverflow {
                    index: i as usize,
                    bits: 16,
                })
            })
            .collect()
    }

    /// Model matrix applying the normalization.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.normalization.model_matrix()
    }

    /// Position data as bytes for upload.
    pub fn positions_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Normal data as bytes for upload.
    pub fn normals_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Adjacency indices as bytes for upload.
    pub fn adjacency_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.adjacency)
    }
}

/// Run the whole pipeline on a fresh load of `source`.
///
/// Nothing is returned unless every stage succeeds.
pub fn rebuild(source: &dyn MeshSource, config: &RebuildConfig) -> Result<RenderBuffers> {
    config.validate()?;
    let mut mesh = source.load(&config.load)?;
    build_buffers(&mut mesh, config)
}

/// Run the pipeline stages after loading on an already built mesh.
///
/// The mesh is decimated in place when simplification is enabled.
pub fn build_buffers(mesh: &mut HalfEdgeMesh, config: &RebuildConfig) -> Result<RenderBuffers> {
    config.validate()?;

    let decimation = if config.simplification_enabled {
        Some(qem_decimate(mesh, &config.decimate_options())?)
    } else {
        None
    };
    if mesh.has_garbage() {
        mesh.garbage_collection();
    }

    mesh.update_normals(config.normal_weighting);
    let normalization = Normalization::from_mesh(mesh)?;

    let mut positions = Vec::with_capacity(mesh.num_vertices() * 3);
    let mut normals = Vec::with_capacity(mesh.num_vertices() * 3);
    for v in mesh.vertex_ids() {
        let p = mesh.position(v);
        let n = mesh.vertex_normal(v);
        positions.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        normals.extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
    }

    let adjacency = build_adjacency(mesh)?;

    log::info!(
        "Rebuilt buffers: {} vertices, {} faces, scale {:.6}, {} boundary slots",
        mesh.num_vertices(),
        mesh.num_faces(),
        normalization.scale,
        self_paired_count(&adjacency)
    );

    Ok(RenderBuffers {
        positions,
        normals,
        adjacency,
        normalization,
        decimation,
        diagnostics: mesh.diagnostics().to_vec(),
    })
}

/// Mesh source, configuration and the last published buffers.
///
/// Every operation rebuilds from a fresh load and publishes only when the
/// rebuild succeeds. On failure the previous buffers stay published and the
/// configuration is left as it was.
#[derive(Debug)]
pub struct ViewerCore {
    source: Box<dyn MeshSource>,
    config: RebuildConfig,
    published: Option<RenderBuffers>,
}

impl ViewerCore {
    /// Create a viewer core with nothing published yet.
    pub fn new<S: MeshSource + 'static>(source: S, config: RebuildConfig) -> Self {
        Self {
            source: Box::new(source),
            config,
            published: None,
        }
    }

    /// The current configuration.
    pub fn config(&self) -> &RebuildConfig {
        &self.config
    }

    /// The last successfully built buffers.
    pub fn published(&self) -> Option<&RenderBuffers> {
        self.published.as_ref()
    }

    /// Rebuild with the current configuration.
    pub fn reload(&mut self) -> Result<&RenderBuffers> {
        let buffers = rebuild(self.source.as_ref(), &self.config)?;
        Ok(&*self.published.insert(buffers))
    }

    /// Flip simplification and rebuild.
    pub fn toggle_simplification(&mut self) -> Result<&RenderBuffers> {
        let config = self
            .config
            .clone()
            .with_simplification(!self.config.simplification_enabled);
        log::info!(
            "Simplification {}",
            if config.simplification_enabled { "on" } else { "off" }
        );
        self.apply(config)
    }

    /// Change the simplification target and rebuild.
    pub fn set_target_vertex_count(&mut self, target: usize) -> Result<&RenderBuffers> {
        let config = self.config.clone().with_target_vertex_count(target);
        self.apply(config)
    }

    fn apply(&mut self, config: RebuildConfig) -> Result<&RenderBuffers> {
        match rebuild(self.source.as_ref(), &config) {
            Ok(buffers) => {
                self.config = config;
                Ok(&*self.published.insert(buffers))
            }
            Err(e) => {
                log::warn!("Rebuild failed, keeping previous buffers: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn tetrahedron() -> InMemorySource {
        InMemorySource::from_triangles(
            vec![
                Point3::new(1.0, 1.0, 1.0),
                Point3::new(1.0, -1.0, -1.0),
                Point3::new(-1.0, 1.0, -1.0),
                Point3::new(-1.0, -1.0, 1.0),
            ],
            &[[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]],
        )
    }

    /// Source that succeeds a fixed number of times, then fails.
    #[derive(Debug)]
    struct Flaky {
        inner: InMemorySource,
        remaining: Cell<usize>,
    }

    impl MeshSource for Flaky {
        fn load(&self, options: &LoadOptions) -> Result<HalfEdgeMesh> {
            match self.remaining.get() {
                0 => Err(MeshError::load("flaky.obj", "gone")),
                n => {
                    self.remaining.set(n - 1);
                    self.inner.load(options)
                }
            }
        }
    }

    #[test]
    fn test_tetrahedron_buffers() {
        let buffers = rebuild(&tetrahedron(), &RebuildConfig::default()).unwrap();

        assert_eq!(buffers.positions.len(), 12);
        assert_eq!(buffers.normals.len(), 12);
        assert_eq!(buffers.adjacency.len(), 24);
        assert_eq!(buffers.self_paired_slots(), 0);
        assert!((buffers.normalization.scale - 1.0).abs() < 1e-12);
        assert!(buffers.decimation.is_none());
        assert!(buffers.diagnostics.is_empty());
        assert_eq!(buffers.positions_bytes().len(), 48);
        assert_eq!(buffers.adjacency_u16().unwrap().len(), 24);
    }

    #[test]
    fn test_zero_target_rejected() {
        let config = RebuildConfig::default().with_target_vertex_count(0);
        assert!(matches!(
            rebuild(&tetrahedron(), &config),
            Err(MeshError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_degenerate_source_fails() {
        let source = InMemorySource::from_triangles(vec![Point3::origin(); 3], &[[0, 1, 2]]);
        assert!(matches!(
            rebuild(&source, &RebuildConfig::default()),
            Err(MeshError::DegenerateMesh { .. })
        ));
    }

    #[test]
    fn test_quad_source_needs_triangulation() {
        let source = InMemorySource::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![vec![0, 1, 2, 3]],
        );

        let strict = rebuild(&source, &RebuildConfig::default());
        assert!(strict.unwrap_err().is_load_error());

        let config =
            RebuildConfig::default().with_load_options(LoadOptions::default().with_triangulate(true));
        let buffers = rebuild(&source, &config).unwrap();
        assert_eq!(buffers.num_faces(), 2);
        assert_eq!(buffers.self_paired_slots(), 4);
    }

    #[test]
    fn test_viewer_publishes_only_on_success() {
        let source = Flaky {
            inner: tetrahedron(),
            remaining: Cell::new(1),
        };
        let mut viewer = ViewerCore::new(source, RebuildConfig::default());
        assert!(viewer.published().is_none());

        let first = viewer.reload().unwrap().clone();

        assert!(viewer.toggle_simplification().is_err());
        assert!(!viewer.config().simplification_enabled);
        assert_eq!(viewer.published(), Some(&first));

        assert!(viewer.set_target_vertex_count(50).is_err());
        assert_eq!(viewer.config().target_vertex_count, DEFAULT_TARGET_VERTEX_COUNT);
        assert_eq!(viewer.published(), Some(&first));
    }

    #[test]
    fn test_toggle_on_and_off() {
        let mut viewer = ViewerCore::new(tetrahedron(), RebuildConfig::default());
        let plain = viewer.reload().unwrap().clone();

        let simplified = viewer.toggle_simplification().unwrap().clone();
        assert!(viewer.config().simplification_enabled);
        let report = simplified.decimation.unwrap();
        assert_eq!(report.collapses, 0);

        let again = viewer.toggle_simplification().unwrap().clone();
        assert_eq!(again, plain);
    }
}
