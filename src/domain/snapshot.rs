//! Immutable result of one fetch-and-parse cycle

use crate::domain::location::Location;
use std::collections::HashMap;

/// Everything one successful fetch of the populartimes page yields.
///
/// Built whole by the parser and never mutated afterwards; the refresh
/// coordinator replaces the current snapshot wholesale on each
/// successful cycle. A location missing from `live_validations` simply
/// has no visitors right now.
#[derive(Debug, Clone, Default)]
pub struct OccupancySnapshot {
    /// location id -> venue record
    pub locations: HashMap<u32, Location>,
    /// location id -> current visitor count
    pub live_validations: HashMap<u32, u32>,
}

impl OccupancySnapshot {
    pub fn location(&self, location_id: u32) -> Option<&Location> {
        self.locations.get(&location_id)
    }

    /// Current visitor count; absent id means zero.
    pub fn visitor_count(&self, location_id: u32) -> u32 {
        self.live_validations.get(&location_id).copied().unwrap_or(0)
    }
}
