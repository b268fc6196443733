//! Engine error types

use cirrus_cloud::{CloudError, ResourceStatus};
use thiserror::Error;

/// Errors from lifecycle operations against a provisioned resource
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Resource '{id}' is not ready (status: {status})")]
    NotReady { id: String, status: ResourceStatus },

    #[error("Provider error: {0}")]
    Provider(#[from] CloudError),
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
