pub mod engine;
pub mod frame;
pub mod mesh;
pub mod presets;
pub mod shading;

pub use engine::TerrainEngine;
pub use frame::{FrameClock, ShadedVertex};
pub use mesh::{PlaneGeometry, terrain_model_matrix};
pub use presets::TERRAIN_PRESETS;
pub use shading::{MixMode, Rgb, ShaderParameters};
