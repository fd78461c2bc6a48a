//! Plugins shipped with the crate.

pub mod weighted;

pub use weighted::{Signal, WeightedNamingPlugin};
