//! Domain models - venues, opening hours, and occupancy snapshots
//!
//! This module contains the canonical data types used throughout the system:
//! - `Location` - venue identity, capacity, and weekly opening hours
//! - `OpeningHour` / `CloseTime` - one day's opening window
//! - `OccupancySnapshot` - immutable result of one fetch-and-parse cycle

pub mod location;
pub mod snapshot;

// Re-export commonly used types
pub use location::{CloseTime, Location, OpeningHour};
pub use snapshot::OccupancySnapshot;
