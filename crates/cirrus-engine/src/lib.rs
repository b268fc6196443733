//! Cirrus Engine
//!
//! This crate walks the dependency graph produced by `cirrus-core`
//! and drives a `cirrus-cloud` provider through a full session:
//!
//! - [`ProvisioningEngine`] creates resources layer by layer, fanning
//!   out within a layer and retrying transient provider failures.
//! - [`lifecycle::operate`] issues stop/start/restart/resize against
//!   already-provisioned resources.
//! - [`teardown::teardown`] deletes tracked resources in reverse
//!   dependency order and reports anything it could not remove.
//! - [`Session`] ties the three together and guarantees teardown runs
//!   on every exit path.

pub mod error;
pub mod lifecycle;
pub mod provision;
pub mod session;
pub mod teardown;
pub mod testing;

use cirrus_cloud::ProvisioningLedger;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Ledger shared between layer workers; single-writer per entry is
/// enforced by the mutex.
pub type SharedLedger = Arc<Mutex<ProvisioningLedger>>;

// Re-exports
pub use error::LifecycleError;
pub use lifecycle::LifecycleOp;
pub use provision::{ProvisionOutcome, ProvisioningEngine};
pub use session::{Session, SessionReport};
pub use teardown::TeardownOutcome;
