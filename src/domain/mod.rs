// Domain layer: pure, synchronous types and ports
pub mod config;
pub mod error;
pub mod model;
pub mod traits;
