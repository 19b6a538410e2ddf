//! Rendering module
//!
//! The simulation is drawn into a back-to-front triangle list, which is then
//! presented either through WebGPU or the software rasteriser.

pub mod pipeline;
pub mod raster;
pub mod shapes;
pub mod vertex;

pub use pipeline::RenderState;
pub use raster::Raster;
pub use shapes::{DrawList, draw};
pub use vertex::Vertex;
