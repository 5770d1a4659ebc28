pub mod lighting;
pub mod orb;
pub mod sparkles;

pub use lighting::Lighting;
pub use orb::Orb;
pub use sparkles::SparkleField;
