//! Cirrus Core
//!
//! This crate provides the resource model and dependency graph for
//! Cirrus, enabling declarative description of cloud resources and
//! deterministic ordering of provisioning and teardown.
//!
//! A provisioning session starts from a set of [`ResourceSpec`]s.
//! [`DependencyGraph::build`] validates the set and arranges it into
//! topological layers: resources within a layer have no dependencies
//! on each other and may be provisioned concurrently, while layers
//! themselves are strictly ordered.

pub mod error;
pub mod graph;
pub mod model;

// Re-exports
pub use error::{GraphError, Result};
pub use graph::DependencyGraph;
pub use model::{ResourceKind, ResourceSpec, SpecSet};
