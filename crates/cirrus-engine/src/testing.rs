//! Test doubles for engine and session tests
//!
//! [`MockProvider`] stands in for a real cloud provider: it records
//! every call and can be scripted to fail specific resources, either
//! transiently (throttle-style, retried by the engine) or permanently.

use async_trait::async_trait;
use cirrus_cloud::{CloudError, CloudProvider, Handle};
use cirrus_core::ResourceSpec;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

/// One recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Operation name: create, delete, power_off, start, restart, resize
    pub op: String,
    /// Resource id (create) or handle string (everything else)
    pub target: String,
}

#[derive(Debug, Clone, Copy)]
enum ScriptedFailure {
    Transient,
    Permanent,
}

/// In-memory provider for tests
#[derive(Default)]
pub struct MockProvider {
    calls: Mutex<Vec<MockCall>>,
    scripts: Mutex<HashMap<String, VecDeque<ScriptedFailure>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` operations against `target` with a
    /// throttle error, then succeed.
    pub async fn fail_transient(&self, target: &str, count: usize) {
        let mut scripts = self.scripts.lock().await;
        let queue = scripts.entry(target.to_string()).or_default();
        for _ in 0..count {
            queue.push_back(ScriptedFailure::Transient);
        }
    }

    /// Fail every operation against `target` permanently.
    pub async fn fail_permanent(&self, target: &str) {
        let mut scripts = self.scripts.lock().await;
        let queue = scripts.entry(target.to_string()).or_default();
        // A long queue of permanent failures; the engine gives up on
        // the first one anyway.
        for _ in 0..64 {
            queue.push_back(ScriptedFailure::Permanent);
        }
    }

    pub async fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().await.clone()
    }

    pub async fn create_calls_for(&self, id: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.op == "create" && c.target == id)
            .count()
    }

    pub async fn delete_calls(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.op == "delete")
            .count()
    }

    async fn record(&self, op: &str, target: &str) {
        self.calls.lock().await.push(MockCall {
            op: op.to_string(),
            target: target.to_string(),
        });
    }

    async fn scripted_failure(&self, target: &str) -> Option<ScriptedFailure> {
        self.scripts.lock().await.get_mut(target)?.pop_front()
    }

    async fn check(&self, op: &str, target: &str) -> cirrus_cloud::Result<()> {
        self.record(op, target).await;
        match self.scripted_failure(target).await {
            Some(ScriptedFailure::Transient) => Err(CloudError::Throttled {
                resource: target.to_string(),
                message: "too many requests".to_string(),
            }),
            Some(ScriptedFailure::Permanent) => Err(CloudError::ApiError {
                resource: target.to_string(),
                message: "quota exceeded".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CloudProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_or_update(&self, spec: &ResourceSpec) -> cirrus_cloud::Result<Handle> {
        self.check("create", &spec.id).await?;
        Ok(Handle::new(format!("mock/{}/{}", spec.kind, spec.id)))
    }

    async fn delete(&self, handle: &Handle) -> cirrus_cloud::Result<()> {
        self.check("delete", handle.as_str()).await
    }

    async fn power_off(&self, handle: &Handle) -> cirrus_cloud::Result<()> {
        self.check("power_off", handle.as_str()).await
    }

    async fn start(&self, handle: &Handle) -> cirrus_cloud::Result<()> {
        self.check("start", handle.as_str()).await
    }

    async fn restart(&self, handle: &Handle) -> cirrus_cloud::Result<()> {
        self.check("restart", handle.as_str()).await
    }

    async fn resize(&self, handle: &Handle, _capacity: u32) -> cirrus_cloud::Result<()> {
        self.check("resize", handle.as_str()).await
    }
}
