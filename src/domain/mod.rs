pub mod id;
pub mod node;
pub mod edge;
pub mod error;
pub mod builder;
pub mod graph;
pub mod query;
pub mod cycle;
pub mod audit;
