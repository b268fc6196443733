//! `cirrus operate` — lifecycle operations against the ledger

use crate::sim::SimProvider;
use cirrus_cloud::{CloudProvider, LedgerStore};
use cirrus_engine::{lifecycle, LifecycleOp};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub async fn handle(id: &str, op: &str) -> anyhow::Result<i32> {
    let op = parse_op(op)?;
    run(&SimProvider::new(), Path::new("."), id, op).await
}

async fn run(
    provider: &dyn CloudProvider,
    root: &Path,
    id: &str,
    op: LifecycleOp,
) -> anyhow::Result<i32> {
    let store = LedgerStore::new(root);
    let ledger = Arc::new(Mutex::new(store.load().await?));

    let result = lifecycle::operate(provider, &ledger, id, op).await;

    // Resize writes the new capacity into the ledger before the
    // provider call goes out; persist it even when that call fails.
    store.save(&*ledger.lock().await).await?;

    match result {
        Ok(()) => {
            println!("{} {} on {}", "✓".green(), op, id.cyan());
            Ok(0)
        }
        Err(err) => {
            println!("{} {}", "✗".red(), err);
            Ok(1)
        }
    }
}

/// Parse `stop`, `start`, `restart`, or `resize:<capacity>`
fn parse_op(op: &str) -> anyhow::Result<LifecycleOp> {
    match op {
        "stop" => Ok(LifecycleOp::Stop),
        "start" => Ok(LifecycleOp::Start),
        "restart" => Ok(LifecycleOp::Restart),
        other => {
            if let Some(capacity) = other.strip_prefix("resize:") {
                let capacity: u32 = capacity
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid resize capacity: {capacity}"))?;
                Ok(LifecycleOp::Resize(capacity))
            } else {
                anyhow::bail!("Unknown operation: {other} (expected stop|start|restart|resize:<n>)")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_cloud::{Handle, ProvisioningLedger};
    use cirrus_core::{ResourceKind, ResourceSpec};
    use cirrus_engine::testing::MockProvider;

    #[test]
    fn test_parse_op() {
        assert_eq!(parse_op("stop").unwrap(), LifecycleOp::Stop);
        assert_eq!(parse_op("start").unwrap(), LifecycleOp::Start);
        assert_eq!(parse_op("restart").unwrap(), LifecycleOp::Restart);
        assert_eq!(parse_op("resize:6").unwrap(), LifecycleOp::Resize(6));
        assert!(parse_op("resize:banana").is_err());
        assert!(parse_op("reboot").is_err());
    }

    #[tokio::test]
    async fn test_resize_capacity_persisted_when_provider_fails() {
        let temp = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(temp.path());

        let spec = ResourceSpec::new("scaleset", ResourceKind::ScaleSet, "eastus")
            .with_property("capacity", serde_json::json!(3));
        let mut ledger = ProvisioningLedger::new();
        ledger.register([&spec]);
        ledger.mark_ready("scaleset", Handle::new("mock/scale-set/scaleset"));
        store.save(&ledger).await.unwrap();

        let provider = MockProvider::new();
        provider.fail_permanent("mock/scale-set/scaleset").await;

        let code = run(&provider, temp.path(), "scaleset", LifecycleOp::Resize(6))
            .await
            .unwrap();
        assert_eq!(code, 1);

        // The intended capacity reached disk despite the failure.
        let reloaded = store.load().await.unwrap();
        assert_eq!(
            reloaded.get("scaleset").unwrap().properties.get("capacity"),
            Some(&serde_json::json!(6))
        );
    }
}
