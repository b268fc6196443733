//! Lifecycle operations against provisioned resources
//!
//! Operations target one resource at a time and require the entry to
//! be `Ready` in the ledger. The controller does not serialize across
//! unrelated resources; callers may operate on independent resources
//! concurrently.

use crate::SharedLedger;
use crate::error::{LifecycleError, Result};
use cirrus_cloud::{CloudProvider, Handle, ResourceStatus};

/// Post-provisioning operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    /// Power the resource off
    Stop,
    /// Start a stopped resource
    Start,
    /// Restart a running resource
    Restart,
    /// Change the instance count of an elastic resource
    Resize(u32),
}

impl std::fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleOp::Stop => write!(f, "stop"),
            LifecycleOp::Start => write!(f, "start"),
            LifecycleOp::Restart => write!(f, "restart"),
            LifecycleOp::Resize(capacity) => write!(f, "resize:{capacity}"),
        }
    }
}

/// Issue one lifecycle operation against a `Ready` resource.
///
/// `Resize` writes the new capacity into the ledger entry before the
/// provider update goes out, so a crashed session still round-trips
/// the intended state.
pub async fn operate(
    provider: &dyn CloudProvider,
    ledger: &SharedLedger,
    id: &str,
    op: LifecycleOp,
) -> Result<()> {
    let handle = ready_handle(ledger, id).await?;

    tracing::info!(resource = %id, op = %op, handle = %handle, "Lifecycle operation");

    match op {
        LifecycleOp::Stop => provider.power_off(&handle).await?,
        LifecycleOp::Start => provider.start(&handle).await?,
        LifecycleOp::Restart => provider.restart(&handle).await?,
        LifecycleOp::Resize(capacity) => {
            {
                let mut guard = ledger.lock().await;
                guard.set_property(id, "capacity", serde_json::json!(capacity));
            }
            provider.resize(&handle, capacity).await?;
        }
    }

    Ok(())
}

/// Resolve the provider handle for a `Ready` entry
async fn ready_handle(ledger: &SharedLedger, id: &str) -> Result<Handle> {
    let guard = ledger.lock().await;
    let entry = guard
        .get(id)
        .ok_or_else(|| LifecycleError::UnknownResource(id.to_string()))?;

    if entry.status != ResourceStatus::Ready {
        return Err(LifecycleError::NotReady {
            id: id.to_string(),
            status: entry.status,
        });
    }

    // Ready entries always carry a handle.
    entry
        .handle
        .clone()
        .ok_or_else(|| LifecycleError::UnknownResource(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;
    use cirrus_cloud::ProvisioningLedger;
    use cirrus_core::{ResourceKind, ResourceSpec};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    async fn ready_ledger() -> SharedLedger {
        let mut ledger = ProvisioningLedger::new();
        let spec = ResourceSpec::new("scaleset", ResourceKind::ScaleSet, "eastus")
            .with_property("capacity", serde_json::json!(3));
        ledger.register([&spec]);
        ledger.mark_ready("scaleset", Handle::new("mock/scale-set/scaleset"));
        Arc::new(Mutex::new(ledger))
    }

    #[tokio::test]
    async fn test_stop_start_resize_restart_sequence() {
        let provider = MockProvider::new();
        let ledger = ready_ledger().await;

        // Same run order as the classic scale-set walkthrough.
        operate(&provider, &ledger, "scaleset", LifecycleOp::Stop)
            .await
            .unwrap();
        operate(&provider, &ledger, "scaleset", LifecycleOp::Start)
            .await
            .unwrap();
        operate(&provider, &ledger, "scaleset", LifecycleOp::Resize(6))
            .await
            .unwrap();
        operate(&provider, &ledger, "scaleset", LifecycleOp::Restart)
            .await
            .unwrap();

        let ops: Vec<String> = provider.calls().await.into_iter().map(|c| c.op).collect();
        assert_eq!(ops, ["power_off", "start", "resize", "restart"]);
    }

    #[tokio::test]
    async fn test_resize_updates_ledger_capacity() {
        let provider = MockProvider::new();
        let ledger = ready_ledger().await;

        operate(&provider, &ledger, "scaleset", LifecycleOp::Resize(6))
            .await
            .unwrap();

        let guard = ledger.lock().await;
        assert_eq!(
            guard.get("scaleset").unwrap().properties.get("capacity"),
            Some(&serde_json::json!(6))
        );
    }

    #[tokio::test]
    async fn test_unknown_resource() {
        let provider = MockProvider::new();
        let ledger = ready_ledger().await;

        let result = operate(&provider, &ledger, "nope", LifecycleOp::Stop).await;
        assert!(matches!(result, Err(LifecycleError::UnknownResource(_))));
        assert!(provider.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_not_ready_rejected() {
        let provider = MockProvider::new();
        let mut ledger = ProvisioningLedger::new();
        let spec = ResourceSpec::new("vm", ResourceKind::Vm, "eastus");
        ledger.register([&spec]);
        let ledger: SharedLedger = Arc::new(Mutex::new(ledger));

        let result = operate(&provider, &ledger, "vm", LifecycleOp::Start).await;
        assert!(matches!(
            result,
            Err(LifecycleError::NotReady { status: ResourceStatus::Pending, .. })
        ));
    }
}
