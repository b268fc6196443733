//! Cirrus Cloud Infrastructure
//!
//! This crate provides the cloud provider abstraction and the
//! provisioning ledger for Cirrus.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   Cirrus CLI                     │
//! │         (cirrus provision/teardown)              │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                cirrus-engine                     │
//! │   provisioning / lifecycle / teardown / session  │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                cirrus-cloud                      │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Provider Abstraction             │   │
//! │  │  trait CloudProvider { ... }              │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────────┐  ┌──────────────────┐    │
//! │  │  Retry / Backoff │  │  Ledger + Store  │    │
//! │  └──────────────────┘  └──────────────────┘    │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod ledger;
pub mod provider;

// Re-exports
pub use error::{CloudError, Result};
pub use ledger::{
    FailureReason, LedgerEntry, LedgerStore, ProvisioningLedger, ResourceStatus,
};
pub use provider::{CloudProvider, Handle, RetryConfig};
