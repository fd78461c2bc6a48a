//! archrole library: fact graph, role classification and dependency-cycle detection.

pub mod adapters;
pub mod app;
pub mod classification;
pub mod cli;
pub mod config;
pub mod domain;
pub mod plugin;
