//! Mesh dump module
//!
//! Writes the final Q10 gain mesh as a 16-bit grayscale TIFF, channels stacked
//! vertically in R, Gr, Gb, B order.

mod writer;
mod standard_mesh_writer;
pub mod types;

pub use writer::MeshWriter;
pub use standard_mesh_writer::StandardMeshWriter;
pub use types::{TiffCompression, DumpConfig, DumpConfigBuilder};
