pub mod area;
pub mod config;
pub mod error;
pub mod seeds;
pub mod settlement;
pub mod snapshot;
pub mod structure;
pub mod validate;
pub mod weighted;
pub mod world;

pub use area::{Area, generate_area};
pub use config::{Bounds, GenerationConstants};
pub use error::{ConfigError, GenerationError, WorldValidationError};
pub use settlement::{Settlement, generate_settlement};
pub use structure::{Room, Structure};
pub use validate::{validate_snapshot, validate_world};
pub use world::{World, generate_world};
