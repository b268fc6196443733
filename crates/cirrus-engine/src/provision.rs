//! Layered provisioning engine
//!
//! Walks the dependency graph layer by layer. Members of a layer are
//! submitted to the provider concurrently; a layer must fully resolve
//! (success or failure per member) before the next layer starts, so a
//! resource never observes a half-created dependency.

use crate::SharedLedger;
use cirrus_cloud::{
    CloudProvider, FailureReason, ProvisioningLedger, ResourceStatus, RetryConfig,
};
use cirrus_core::{DependencyGraph, ResourceSpec, SpecSet};
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;

/// Aggregate result of one provisioning run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionOutcome {
    /// Ids that reached `Ready`
    pub succeeded: BTreeSet<String>,

    /// Ids that ended `Failed` (including skipped dependents)
    pub failed: BTreeSet<String>,
}

impl ProvisionOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// How a single member of a layer resolved
enum MemberResolution {
    Ready,
    Failed,
    /// Already failed before the layer ran (upstream propagation)
    AlreadyFailed,
}

/// Provisioning engine with bounded retry on transient failures
pub struct ProvisioningEngine {
    retry: RetryConfig,
}

impl Default for ProvisioningEngine {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl ProvisioningEngine {
    pub fn new(retry: RetryConfig) -> Self {
        Self { retry }
    }

    /// Create or update every resource in dependency order. The ledger
    /// must already hold a `Pending` entry per spec.
    pub async fn provision(
        &self,
        provider: &dyn CloudProvider,
        graph: &DependencyGraph,
        specs: &SpecSet,
        ledger: &SharedLedger,
        cancel: &CancellationToken,
    ) -> ProvisionOutcome {
        for (layer_index, layer) in graph.layers().iter().enumerate() {
            tracing::info!(
                layer = layer_index,
                members = layer.len(),
                "Provisioning layer"
            );

            let mut members: FuturesUnordered<_> = layer
                .iter()
                .filter_map(|id| specs.get(id))
                .map(|spec| async move {
                    let resolution = self.provision_one(provider, spec, ledger, cancel).await;
                    (spec.id.clone(), resolution)
                })
                .collect();

            let mut layer_failures = Vec::new();
            while let Some((id, resolution)) = members.next().await {
                if matches!(resolution, MemberResolution::Failed) {
                    layer_failures.push(id);
                }
            }

            // Propagate failures to everything downstream before the
            // next layer runs, so no create call is ever issued for a
            // dependent of a failed resource.
            if !layer_failures.is_empty() {
                let mut guard = ledger.lock().await;
                for failed_id in &layer_failures {
                    for dependent in graph.dependents_of(failed_id) {
                        if guard.get(&dependent).map(|e| e.status) == Some(ResourceStatus::Pending)
                        {
                            tracing::warn!(
                                resource = %dependent,
                                upstream = %failed_id,
                                "Skipping resource, upstream dependency failed"
                            );
                            guard.mark_failed(
                                &dependent,
                                FailureReason::UpstreamDependencyFailed {
                                    via: failed_id.clone(),
                                },
                            );
                        }
                    }
                }
            }
        }

        let guard = ledger.lock().await;
        outcome_from_ledger(&guard, specs)
    }

    async fn provision_one(
        &self,
        provider: &dyn CloudProvider,
        spec: &ResourceSpec,
        ledger: &SharedLedger,
        cancel: &CancellationToken,
    ) -> MemberResolution {
        {
            let mut guard = ledger.lock().await;
            match guard.get(&spec.id).map(|e| e.status) {
                // Upstream failure already propagated to this entry.
                Some(ResourceStatus::Failed) => return MemberResolution::AlreadyFailed,
                Some(ResourceStatus::Pending) => {}
                other => {
                    tracing::debug!(resource = %spec.id, status = ?other, "Unexpected entry state");
                    return MemberResolution::AlreadyFailed;
                }
            }

            if cancel.is_cancelled() {
                guard.mark_failed(&spec.id, FailureReason::Cancelled);
                return MemberResolution::Failed;
            }

            // A dependency can be left non-Ready without this entry
            // having been marked, e.g. when the session is cancelled
            // mid-layer.
            for dep in &spec.depends_on {
                if guard.get(dep).map(|e| e.status) != Some(ResourceStatus::Ready) {
                    guard.mark_failed(
                        &spec.id,
                        FailureReason::UpstreamDependencyFailed { via: dep.clone() },
                    );
                    return MemberResolution::Failed;
                }
            }

            guard.set_status(&spec.id, ResourceStatus::InProgress);
        }

        for attempt in 0..self.retry.max_attempts {
            tracing::debug!(
                resource = %spec.id,
                kind = %spec.kind,
                attempt = attempt + 1,
                "Issuing create-or-update"
            );

            let result = tokio::select! {
                result = provider.create_or_update(spec) => result,
                _ = cancel.cancelled() => {
                    let mut guard = ledger.lock().await;
                    guard.mark_failed(&spec.id, FailureReason::Cancelled);
                    return MemberResolution::Failed;
                }
            };

            match result {
                Ok(handle) => {
                    tracing::info!(resource = %spec.id, %handle, "Resource ready");
                    let mut guard = ledger.lock().await;
                    guard.mark_ready(&spec.id, handle);
                    return MemberResolution::Ready;
                }
                Err(err) if err.is_transient() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        resource = %spec.id,
                        error = %err,
                        retry_in_ms = delay.as_millis() as u64,
                        "Transient provider failure, retrying"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => {
                            let mut guard = ledger.lock().await;
                            guard.mark_failed(&spec.id, FailureReason::Cancelled);
                            return MemberResolution::Failed;
                        }
                    }
                }
                Err(err) => {
                    tracing::error!(resource = %spec.id, error = %err, "Provisioning failed");
                    let mut guard = ledger.lock().await;
                    guard.mark_failed(
                        &spec.id,
                        FailureReason::ProvisioningFailed {
                            message: err.to_string(),
                        },
                    );
                    return MemberResolution::Failed;
                }
            }
        }

        // Unreachable: the loop always returns within max_attempts.
        MemberResolution::Failed
    }
}

fn outcome_from_ledger(ledger: &ProvisioningLedger, specs: &SpecSet) -> ProvisionOutcome {
    let mut outcome = ProvisionOutcome::default();
    for id in specs.ids() {
        match ledger.get(id).map(|e| e.status) {
            Some(ResourceStatus::Ready) => {
                outcome.succeeded.insert(id.clone());
            }
            _ => {
                outcome.failed.insert(id.clone());
            }
        }
    }
    outcome
}
