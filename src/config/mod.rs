//! Configuration models for plants and their threads.

pub mod plant;

pub use plant::PlantConfig;
