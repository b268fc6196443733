//! Core error types

use thiserror::Error;

/// Errors raised while validating and ordering a resource spec set
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Duplicate resource id: {0}")]
    DuplicateId(String),

    #[error("Resource '{id}' depends on unknown resource '{dependency}'")]
    UnknownDependency { id: String, dependency: String },

    #[error("Dependency cycle detected involving: {}", ids.join(", "))]
    CycleDetected { ids: Vec<String> },
}

pub type Result<T> = std::result::Result<T, GraphError>;
