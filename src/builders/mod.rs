//! Builders to construct plants from configuration.

pub mod plant_builder;

pub use plant_builder::{build_plant, build_plant_with_clock};
