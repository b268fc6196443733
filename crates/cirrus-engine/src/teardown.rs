//! Teardown coordinator
//!
//! Deletes tracked resources in reverse dependency order. A node is
//! deleted only once all of its dependents are gone or were never
//! created; a failed delete parks the node (and everything it still
//! supports) in the residual set instead of aborting the walk.

use crate::SharedLedger;
use cirrus_cloud::{CloudProvider, Handle, ResourceStatus};
use cirrus_core::DependencyGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Aggregate result of one teardown pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeardownOutcome {
    /// Ids deleted during this pass
    pub deleted: BTreeSet<String>,

    /// Ids that could not be removed and may still exist in the provider
    pub residual: BTreeSet<String>,
}

impl TeardownOutcome {
    pub fn is_clean(&self) -> bool {
        self.residual.is_empty()
    }
}

/// Delete every created resource, newest layer first. Entries without
/// a handle were never created and are skipped. Idempotent: a second
/// pass finds nothing to delete.
pub async fn teardown(
    provider: &dyn CloudProvider,
    graph: &DependencyGraph,
    ledger: &SharedLedger,
) -> TeardownOutcome {
    let mut outcome = TeardownOutcome::default();

    {
        let guard = ledger.lock().await;
        if guard.is_empty() {
            tracing::debug!("Ledger empty, nothing to tear down");
            return outcome;
        }
    }

    for layer in graph.reverse_layers() {
        for id in layer {
            let handle = {
                let guard = ledger.lock().await;
                match guard.get(id) {
                    Some(entry) if entry.status != ResourceStatus::Deleted => {
                        entry.handle.clone()
                    }
                    _ => None,
                }
            };

            let Some(handle) = handle else {
                // Never created, or already deleted.
                continue;
            };

            if dependents_still_exist(id, graph, ledger).await {
                tracing::warn!(resource = %id, "Dependents remain, leaving resource in place");
                outcome.residual.insert(id.clone());
                continue;
            }

            delete_one(provider, ledger, id, &handle, &mut outcome).await;
        }
    }

    // The graph may come from a spec file that has drifted since the
    // ledger was written. Any created entry the layer walk never
    // visited is still live in the provider and must surface as
    // residual rather than vanish from the report.
    {
        let guard = ledger.lock().await;
        for (id, entry) in &guard.entries {
            if entry.handle.is_some()
                && entry.status != ResourceStatus::Deleted
                && !outcome.deleted.contains(id)
            {
                if outcome.residual.insert(id.clone()) {
                    tracing::error!(resource = %id, "Resource tracked by ledger but absent from graph, left in place");
                }
            }
        }
    }

    if outcome.residual.is_empty() {
        tracing::info!(deleted = outcome.deleted.len(), "Teardown complete");
    } else {
        tracing::error!(
            deleted = outcome.deleted.len(),
            residual = ?outcome.residual,
            "Teardown left residual resources"
        );
    }
    outcome
}

async fn delete_one(
    provider: &dyn CloudProvider,
    ledger: &SharedLedger,
    id: &str,
    handle: &Handle,
    outcome: &mut TeardownOutcome,
) {
    tracing::info!(resource = %id, %handle, "Deleting resource");
    match provider.delete(handle).await {
        Ok(()) => {
            let mut guard = ledger.lock().await;
            guard.mark_deleted(id);
            outcome.deleted.insert(id.to_string());
        }
        Err(err) => {
            tracing::error!(resource = %id, error = %err, "Delete failed");
            outcome.residual.insert(id.to_string());
        }
    }
}

/// A resource with live dependents cannot be deleted safely.
async fn dependents_still_exist(
    id: &str,
    graph: &DependencyGraph,
    ledger: &SharedLedger,
) -> bool {
    let guard = ledger.lock().await;
    graph.dependents_of(id).iter().any(|dependent| {
        guard
            .get(dependent)
            .is_some_and(|e| e.handle.is_some() && e.status != ResourceStatus::Deleted)
    })
}
