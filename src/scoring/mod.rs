pub mod config;
pub mod engine;
pub mod validation;

pub use config::*;
pub use engine::PointsTable;
pub use validation::validate_scoring;
