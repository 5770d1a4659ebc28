pub mod buffers;
pub mod camera;
pub mod gpu;
pub mod post;

pub use buffers::TerrainUniform;
pub use camera::Camera;
pub use gpu::GpuState;
