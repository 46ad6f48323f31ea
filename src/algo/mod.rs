//! Mesh processing passes.
//!
//! - **Bounds**: bounding box and unit-cube normalization
//! - **Adjacency**: triangle-with-adjacency index stream
//! - **Decimation**: quadric error metric edge collapse
//! - **Progress**: callbacks for long-running passes

pub mod adjacency;
pub mod bounds;
pub mod decimate;
pub mod progress;

pub use adjacency::{build_adjacency, build_adjacency_u16, self_paired_count};
pub use bounds::{BoundingBox, Normalization};
pub use decimate::{qem_decimate, qem_decimate_with_progress, DecimateOptions, DecimationReport};
pub use progress::Progress;
