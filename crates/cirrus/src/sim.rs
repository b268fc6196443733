//! Local simulation provider
//!
//! The concrete cloud SDK stays outside this repository; the CLI
//! ships with a simulation provider so the full provision / operate /
//! teardown flow can be exercised locally. Handles are synthesized
//! and the persisted ledger is the source of truth.

use async_trait::async_trait;
use cirrus_cloud::{CloudProvider, Handle, Result};
use cirrus_core::ResourceSpec;

pub struct SimProvider;

impl SimProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CloudProvider for SimProvider {
    fn name(&self) -> &str {
        "sim"
    }

    async fn create_or_update(&self, spec: &ResourceSpec) -> Result<Handle> {
        tracing::info!(resource = %spec.id, kind = %spec.kind, region = %spec.region, "sim: create-or-update");
        Ok(Handle::new(format!(
            "sim/{}/{}/{}",
            spec.region, spec.kind, spec.id
        )))
    }

    async fn delete(&self, handle: &Handle) -> Result<()> {
        tracing::info!(%handle, "sim: delete");
        Ok(())
    }

    async fn power_off(&self, handle: &Handle) -> Result<()> {
        tracing::info!(%handle, "sim: power off");
        Ok(())
    }

    async fn start(&self, handle: &Handle) -> Result<()> {
        tracing::info!(%handle, "sim: start");
        Ok(())
    }

    async fn restart(&self, handle: &Handle) -> Result<()> {
        tracing::info!(%handle, "sim: restart");
        Ok(())
    }

    async fn resize(&self, handle: &Handle, capacity: u32) -> Result<()> {
        tracing::info!(%handle, capacity, "sim: resize");
        Ok(())
    }
}
