//! Provisioning ledger
//!
//! The ledger is the authoritative record of per-resource provisioning
//! status and provider handles for one session. It is persisted as
//! `.cirrus/ledger.json` so a crashed session can resume teardown.

use crate::error::{CloudError, Result};
use crate::provider::Handle;
use chrono::{DateTime, Utc};
use cirrus_core::{ResourceKind, ResourceSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const LEDGER_VERSION: u32 = 1;
const LEDGER_DIR: &str = ".cirrus";
const LEDGER_FILE: &str = "ledger.json";
const LEDGER_BACKUP: &str = "ledger.json.backup";

/// Status of a tracked resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Submitted but not yet attempted
    Pending,
    /// Provider call in flight
    InProgress,
    /// Provider reported terminal success
    Ready,
    /// Provider reported terminal failure, or skipped upstream
    Failed,
    /// Removed during teardown
    Deleted,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Pending => write!(f, "pending"),
            ResourceStatus::InProgress => write!(f, "in-progress"),
            ResourceStatus::Ready => write!(f, "ready"),
            ResourceStatus::Failed => write!(f, "failed"),
            ResourceStatus::Deleted => write!(f, "deleted"),
        }
    }
}

/// Why a resource ended up `Failed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// The provider reported a terminal failure (retries exhausted or
    /// permanent error)
    ProvisioningFailed { message: String },
    /// A resource this one depends on failed; no provider call was made
    UpstreamDependencyFailed { via: String },
    /// The session was cancelled before or during the attempt
    Cancelled,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::ProvisioningFailed { message } => {
                write!(f, "provisioning failed: {message}")
            }
            FailureReason::UpstreamDependencyFailed { via } => {
                write!(f, "upstream dependency failed: {via}")
            }
            FailureReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Ledger entry for a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Resource kind, echoed from the spec
    pub kind: ResourceKind,

    /// Provider region, echoed from the spec
    pub region: String,

    /// Current status
    pub status: ResourceStatus,

    /// Provider-assigned handle, set once creation succeeds
    pub handle: Option<Handle>,

    /// Last failure, if any
    pub last_error: Option<FailureReason>,

    /// Properties as last submitted to the provider (resize updates these)
    pub properties: BTreeMap<String, serde_json::Value>,

    /// When the entry was created
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(spec: &ResourceSpec) -> Self {
        let now = Utc::now();
        Self {
            kind: spec.kind,
            region: spec.region.clone(),
            status: ResourceStatus::Pending,
            handle: None,
            last_error: None,
            properties: spec.properties.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-session record of every tracked resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningLedger {
    /// Ledger file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Entries indexed by resource id
    pub entries: BTreeMap<String, LedgerEntry>,
}

impl Default for ProvisioningLedger {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION,
            updated_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }
}

impl ProvisioningLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every spec as `Pending` before the first provider call
    pub fn register<'a>(&mut self, specs: impl IntoIterator<Item = &'a ResourceSpec>) {
        for spec in specs {
            self.entries
                .insert(spec.id.clone(), LedgerEntry::new(spec));
        }
        self.updated_at = Utc::now();
    }

    pub fn get(&self, id: &str) -> Option<&LedgerEntry> {
        self.entries.get(id)
    }

    pub fn set_status(&mut self, id: &str, status: ResourceStatus) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.status = status;
            entry.updated_at = Utc::now();
        }
        self.updated_at = Utc::now();
    }

    pub fn mark_ready(&mut self, id: &str, handle: Handle) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.status = ResourceStatus::Ready;
            entry.handle = Some(handle);
            entry.last_error = None;
            entry.updated_at = Utc::now();
        }
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, id: &str, reason: FailureReason) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.status = ResourceStatus::Failed;
            entry.last_error = Some(reason);
            entry.updated_at = Utc::now();
        }
        self.updated_at = Utc::now();
    }

    pub fn mark_deleted(&mut self, id: &str) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.status = ResourceStatus::Deleted;
            entry.updated_at = Utc::now();
        }
        self.updated_at = Utc::now();
    }

    /// Update the stored properties for a resource (used by resize)
    pub fn set_property(&mut self, id: &str, key: impl Into<String>, value: serde_json::Value) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.properties.insert(key.into(), value);
            entry.updated_at = Utc::now();
        }
        self.updated_at = Utc::now();
    }

    /// Ids currently in the given status
    pub fn ids_with_status(&self, status: ResourceStatus) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| e.status == status)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads and writes the persisted ledger file
pub struct LedgerStore {
    project_root: PathBuf,
}

impl LedgerStore {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn ledger_dir(&self) -> PathBuf {
        self.project_root.join(LEDGER_DIR)
    }

    fn ledger_path(&self) -> PathBuf {
        self.ledger_dir().join(LEDGER_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.ledger_dir().join(LEDGER_BACKUP)
    }

    async fn ensure_ledger_dir(&self) -> Result<()> {
        let dir = self.ledger_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created ledger directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the persisted ledger, or an empty one when none exists
    pub async fn load(&self) -> Result<ProvisioningLedger> {
        let path = self.ledger_path();
        if !path.exists() {
            tracing::debug!("Ledger file not found, returning empty ledger");
            return Ok(ProvisioningLedger::new());
        }

        let content = fs::read_to_string(&path).await?;
        let ledger: ProvisioningLedger = serde_json::from_str(&content)?;

        if ledger.version > LEDGER_VERSION {
            return Err(CloudError::LedgerError(format!(
                "Ledger file version {} is newer than supported version {}",
                ledger.version, LEDGER_VERSION
            )));
        }

        tracing::debug!("Loaded ledger with {} entries", ledger.entries.len());
        Ok(ledger)
    }

    /// Save the ledger, keeping the previous file as a backup
    pub async fn save(&self, ledger: &ProvisioningLedger) -> Result<()> {
        self.ensure_ledger_dir().await?;

        let path = self.ledger_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
        }

        let content = serde_json::to_string_pretty(ledger)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved ledger with {} entries", ledger.entries.len());
        Ok(())
    }

    /// Remove the persisted ledger after a fully clean teardown
    pub async fn clear(&self) -> Result<()> {
        let path = self.ledger_path();
        if path.exists() {
            fs::remove_file(&path).await?;
        }
        let backup = self.backup_path();
        if backup.exists() {
            fs::remove_file(&backup).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_ledger() -> ProvisioningLedger {
        let mut ledger = ProvisioningLedger::new();
        let spec = ResourceSpec::new("network", ResourceKind::Network, "eastus")
            .with_property("address_space", serde_json::json!("10.10.0.0/16"));
        ledger.register([&spec]);
        ledger.mark_ready("network", Handle::new("sim/network/1"));
        ledger
    }

    #[tokio::test]
    async fn test_ledger_save_load_round_trip() {
        let temp_dir = tempdir().unwrap();
        let store = LedgerStore::new(temp_dir.path());

        let ledger = sample_ledger();
        store.save(&ledger).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.entries.len(), 1);
        let entry = loaded.get("network").unwrap();
        assert_eq!(entry.status, ResourceStatus::Ready);
        assert_eq!(entry.handle, Some(Handle::new("sim/network/1")));
        assert_eq!(
            entry.properties.get("address_space"),
            Some(&serde_json::json!("10.10.0.0/16"))
        );
    }

    #[tokio::test]
    async fn test_empty_ledger_when_missing() {
        let temp_dir = tempdir().unwrap();
        let store = LedgerStore::new(temp_dir.path());

        let ledger = store.load().await.unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_newer_version_rejected() {
        let temp_dir = tempdir().unwrap();
        let store = LedgerStore::new(temp_dir.path());

        let mut ledger = sample_ledger();
        ledger.version = LEDGER_VERSION + 1;
        store.save(&ledger).await.unwrap();

        assert!(matches!(
            store.load().await,
            Err(CloudError::LedgerError(_))
        ));
    }

    #[test]
    fn test_failure_reason_recorded() {
        let mut ledger = ProvisioningLedger::new();
        let spec = ResourceSpec::new("lb", ResourceKind::LoadBalancer, "eastus");
        ledger.register([&spec]);
        ledger.mark_failed(
            "lb",
            FailureReason::UpstreamDependencyFailed { via: "network".into() },
        );

        let entry = ledger.get("lb").unwrap();
        assert_eq!(entry.status, ResourceStatus::Failed);
        assert!(matches!(
            entry.last_error,
            Some(FailureReason::UpstreamDependencyFailed { .. })
        ));
    }
}
