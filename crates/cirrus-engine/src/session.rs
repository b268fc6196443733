//! Provisioning session
//!
//! A [`Session`] owns everything one provisioning run needs: the
//! provider, the spec set and its graph, the shared ledger and a
//! cancellation token. `run` executes provisioning (plus optional
//! lifecycle steps) and then tears down unconditionally — the
//! coordinator runs whether the earlier phases succeeded, failed or
//! were cancelled. `keep_resources` skips teardown and leaves the
//! ledger for a later `teardown` invocation.

use crate::error::LifecycleError;
use crate::lifecycle::{self, LifecycleOp};
use crate::provision::{ProvisionOutcome, ProvisioningEngine};
use crate::teardown::{self, TeardownOutcome};
use crate::SharedLedger;
use cirrus_cloud::{CloudProvider, ProvisioningLedger, RetryConfig};
use cirrus_core::{DependencyGraph, GraphError, SpecSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Aggregate result of a full session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionReport {
    /// Ids that reached `Ready` during provisioning
    pub succeeded: BTreeSet<String>,

    /// Ids that ended `Failed`
    pub failed: BTreeSet<String>,

    /// Ids removed during teardown
    pub deleted: BTreeSet<String>,

    /// Ids that could not be removed and may still exist in the provider
    pub residual: BTreeSet<String>,

    /// Lifecycle step failures, if any
    pub step_errors: Vec<String>,
}

impl SessionReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.residual.is_empty() && self.step_errors.is_empty()
    }
}

/// One provisioning session over a validated spec set
pub struct Session {
    provider: Arc<dyn CloudProvider>,
    specs: SpecSet,
    graph: DependencyGraph,
    ledger: SharedLedger,
    cancel: CancellationToken,
    retry: RetryConfig,
    keep_resources: bool,
}

impl Session {
    /// Validate the spec set and prepare a session. Fails before any
    /// provider call when the graph is malformed.
    pub fn new(
        provider: Arc<dyn CloudProvider>,
        specs: SpecSet,
    ) -> Result<Self, GraphError> {
        let graph = DependencyGraph::build(&specs)?;
        let mut ledger = ProvisioningLedger::new();
        ledger.register(specs.iter());
        Ok(Self {
            provider,
            specs,
            graph,
            ledger: Arc::new(Mutex::new(ledger)),
            cancel: CancellationToken::new(),
            retry: RetryConfig::default(),
            keep_resources: false,
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Keep provisioned resources at session end instead of deleting
    /// them; the ledger is left for a later teardown.
    pub fn keep_resources(mut self, keep: bool) -> Self {
        self.keep_resources = keep;
        self
    }

    /// Token that aborts in-flight provisioning when cancelled.
    /// Teardown still runs with whatever ledger state exists.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn ledger(&self) -> SharedLedger {
        Arc::clone(&self.ledger)
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Provision everything, then tear down. Equivalent to
    /// [`Session::run_with`] with no lifecycle steps.
    pub async fn run(self) -> SessionReport {
        self.run_with(Vec::new()).await
    }

    /// Provision everything, apply the lifecycle steps to the fully
    /// provisioned set, then tear down. Teardown runs on every path:
    /// provisioning failure, step failure or cancellation only change
    /// what there is to delete.
    pub async fn run_with(self, steps: Vec<(String, LifecycleOp)>) -> SessionReport {
        let engine = ProvisioningEngine::new(self.retry.clone());
        let outcome = engine
            .provision(
                self.provider.as_ref(),
                &self.graph,
                &self.specs,
                &self.ledger,
                &self.cancel,
            )
            .await;

        let mut step_errors = Vec::new();
        if outcome.is_success() {
            for (id, op) in steps {
                if let Err(err) = self.apply_step(&id, op).await {
                    step_errors.push(format!("{id}: {err}"));
                }
            }
        } else if !steps.is_empty() {
            tracing::warn!("Skipping lifecycle steps, provisioning did not fully succeed");
        }

        let teardown = if self.keep_resources {
            tracing::info!("Keeping provisioned resources, teardown skipped");
            TeardownOutcome::default()
        } else {
            teardown::teardown(self.provider.as_ref(), &self.graph, &self.ledger).await
        };

        report(outcome, teardown, step_errors)
    }

    async fn apply_step(&self, id: &str, op: LifecycleOp) -> Result<(), LifecycleError> {
        lifecycle::operate(self.provider.as_ref(), &self.ledger, id, op).await
    }
}

fn report(
    outcome: ProvisionOutcome,
    teardown: TeardownOutcome,
    step_errors: Vec<String>,
) -> SessionReport {
    SessionReport {
        succeeded: outcome.succeeded,
        failed: outcome.failed,
        deleted: teardown.deleted,
        residual: teardown.residual,
        step_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;
    use cirrus_core::{ResourceKind, ResourceSpec};

    fn vmss_specs() -> SpecSet {
        SpecSet::new([
            ResourceSpec::new("network", ResourceKind::Network, "eastus"),
            ResourceSpec::new("ip", ResourceKind::PublicIp, "eastus"),
            ResourceSpec::new("lb", ResourceKind::LoadBalancer, "eastus")
                .with_dependency("network")
                .with_dependency("ip"),
            ResourceSpec::new("scaleset", ResourceKind::ScaleSet, "eastus")
                .with_dependency("network")
                .with_dependency("lb")
                .with_property("capacity", serde_json::json!(3)),
        ])
        .unwrap()
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(4),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_full_session_provisions_and_tears_down() {
        let provider = Arc::new(MockProvider::new());
        let session = Session::new(provider.clone(), vmss_specs())
            .unwrap()
            .with_retry(fast_retry());

        let report = session
            .run_with(vec![
                ("scaleset".to_string(), LifecycleOp::Stop),
                ("scaleset".to_string(), LifecycleOp::Start),
                ("scaleset".to_string(), LifecycleOp::Resize(6)),
                ("scaleset".to_string(), LifecycleOp::Restart),
            ])
            .await;

        assert!(report.is_success(), "report: {report:?}");
        assert_eq!(report.succeeded.len(), 4);
        assert_eq!(report.deleted.len(), 4);
        assert!(report.residual.is_empty());

        let ops: Vec<String> = provider
            .calls()
            .await
            .into_iter()
            .filter(|c| c.op != "create" && c.op != "delete")
            .map(|c| c.op)
            .collect();
        assert_eq!(ops, ["power_off", "start", "resize", "restart"]);
    }

    #[tokio::test]
    async fn test_teardown_runs_after_provisioning_failure() {
        let provider = Arc::new(MockProvider::new());
        provider.fail_permanent("lb").await;
        let session = Session::new(provider.clone(), vmss_specs())
            .unwrap()
            .with_retry(fast_retry());

        let report = session
            .run_with(vec![("scaleset".to_string(), LifecycleOp::Stop)])
            .await;

        assert!(!report.is_success());
        assert_eq!(
            report.failed,
            BTreeSet::from(["lb".to_string(), "scaleset".to_string()])
        );
        // The resources that did come up were still torn down.
        assert_eq!(
            report.deleted,
            BTreeSet::from(["ip".to_string(), "network".to_string()])
        );
        assert!(report.residual.is_empty());
        // Lifecycle steps were skipped; no stray power_off call.
        assert!(provider.calls().await.iter().all(|c| c.op != "power_off"));
    }

    #[tokio::test]
    async fn test_permanent_root_failure_leaves_nothing_behind() {
        let provider = Arc::new(MockProvider::new());
        provider.fail_permanent("network").await;
        provider.fail_permanent("ip").await;
        let session = Session::new(provider.clone(), vmss_specs())
            .unwrap()
            .with_retry(fast_retry());

        let report = session.run().await;

        assert_eq!(report.failed.len(), 4);
        assert!(report.deleted.is_empty());
        assert!(report.residual.is_empty());
        assert_eq!(provider.delete_calls().await, 0);
    }

    #[tokio::test]
    async fn test_keep_resources_skips_teardown() {
        let provider = Arc::new(MockProvider::new());
        let session = Session::new(provider.clone(), vmss_specs())
            .unwrap()
            .with_retry(fast_retry())
            .keep_resources(true);

        let report = session.run().await;

        assert_eq!(report.succeeded.len(), 4);
        assert!(report.deleted.is_empty());
        assert_eq!(provider.delete_calls().await, 0);
    }

    #[tokio::test]
    async fn test_cycle_rejected_before_any_provider_call() {
        let provider = Arc::new(MockProvider::new());
        let specs = SpecSet::new([
            ResourceSpec::new("a", ResourceKind::Network, "eastus").with_dependency("b"),
            ResourceSpec::new("b", ResourceKind::PublicIp, "eastus").with_dependency("a"),
        ])
        .unwrap();

        let result = Session::new(provider.clone(), specs);
        assert!(matches!(result, Err(GraphError::CycleDetected { .. })));
        assert!(provider.calls().await.is_empty());
    }
}
