//! Services - refresh coordination and snapshot state
//!
//! This module contains the core business logic services:
//! - `coordinator` - periodic refresh loop, single-flight de-duplication,
//!   and publication of the current snapshot to readers

pub mod coordinator;

// Re-export commonly used types
pub use coordinator::{RefreshCoordinator, SnapshotState, DEFAULT_REFRESH_INTERVAL};
