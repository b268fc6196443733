//! Cloud provider trait definition

use crate::error::Result;
use async_trait::async_trait;
use cirrus_core::ResourceSpec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider-assigned identifier for a created resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle(pub String);

impl Handle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cloud provider abstraction trait
///
/// Every call blocks until the provider reports a terminal state for
/// the long-running operation (created, updated, deleted, or failed).
/// `create_or_update` must be idempotent: repeating it with the same
/// spec converges on the same resource.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "sim", "azure")
    fn name(&self) -> &str;

    /// Create the resource, or update it to match the spec
    async fn create_or_update(&self, spec: &ResourceSpec) -> Result<Handle>;

    /// Delete the resource behind the handle
    async fn delete(&self, handle: &Handle) -> Result<()>;

    /// Power a resource off
    async fn power_off(&self, handle: &Handle) -> Result<()>;

    /// Start a stopped resource
    async fn start(&self, handle: &Handle) -> Result<()>;

    /// Restart a running resource
    async fn restart(&self, handle: &Handle) -> Result<()>;

    /// Change the instance count of an elastic resource
    async fn resize(&self, handle: &Handle, capacity: u32) -> Result<()>;
}

/// Retry configuration for provider operations
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (first try included)
    pub max_attempts: u32,

    /// Initial delay between retries
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based), capped at `max_delay`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let millis =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}
