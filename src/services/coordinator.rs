//! Periodic refresh coordination and snapshot publication
//!
//! The coordinator owns the single current snapshot. A background loop
//! refreshes it on a fixed interval; consumers can also request a
//! refresh on demand. Key behaviors:
//! - At most one fetch is outstanding at any time: a refresh request
//!   arriving while one is in flight waits for it and adopts its
//!   outcome instead of issuing a second network call.
//! - A failed refresh leaves the last-good snapshot in place, marked
//!   stale, rather than clearing previously known data.
//! - There is no retry or backoff; a transient failure waits for the
//!   next scheduled tick.

use crate::domain::location::Location;
use crate::domain::snapshot::OccupancySnapshot;
use crate::io::client::{ErrorKind, SnapshotSource};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Published view of the latest successful fetch.
#[derive(Debug, Clone)]
pub struct SnapshotState {
    pub snapshot: Arc<OccupancySnapshot>,
    /// True when a later refresh attempt failed; the data is the best
    /// known value but not current.
    pub stale: bool,
}

#[derive(Default)]
struct State {
    snapshot: Option<Arc<OccupancySnapshot>>,
    stale: bool,
    last_error: Option<ErrorKind>,
    /// Bumped on every completed refresh, success or failure. Lets a
    /// waiting caller detect that someone else finished a refresh while
    /// it was queued.
    generation: u64,
}

pub struct RefreshCoordinator {
    source: Arc<dyn SnapshotSource>,
    interval: Duration,
    state: RwLock<State>,
    /// Serializes fetches so concurrent refresh requests coalesce
    refresh_lock: Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(source: Arc<dyn SnapshotSource>, interval: Duration) -> Self {
        Self {
            source,
            interval,
            state: RwLock::new(State::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Fetch a new snapshot and publish the outcome.
    ///
    /// Single-flight: callers queued behind an in-flight refresh adopt
    /// its published outcome; exactly one network call is made no
    /// matter how many requests arrive together.
    pub async fn refresh(&self) -> Result<(), ErrorKind> {
        let entered_at = self.state.read().generation;
        let _guard = self.refresh_lock.lock().await;
        {
            let state = self.state.read();
            if state.generation != entered_at {
                return match state.last_error {
                    None => Ok(()),
                    Some(kind) => Err(kind),
                };
            }
        }

        let result = self.source.fetch_snapshot().await;

        let mut state = self.state.write();
        state.generation += 1;
        match result {
            Ok(snapshot) => {
                info!(
                    locations = snapshot.locations.len(),
                    live_validations = snapshot.live_validations.len(),
                    "snapshot_refreshed"
                );
                state.snapshot = Some(Arc::new(snapshot));
                state.stale = false;
                state.last_error = None;
                Ok(())
            }
            Err(e) => {
                let kind = e.kind();
                if kind == ErrorKind::Authentication {
                    // Surfaced distinctly so a host can prompt for
                    // reconfiguration
                    error!(error = %e, "refresh_authentication_failed");
                } else {
                    warn!(error = %e, kind = kind.as_str(), "refresh_failed");
                }
                state.stale = state.snapshot.is_some();
                state.last_error = Some(kind);
                Err(kind)
            }
        }
    }

    /// Run the fixed-interval refresh loop until shutdown.
    ///
    /// The caller is expected to have awaited the startup refresh
    /// already; the interval's immediate first tick is consumed so the
    /// loop does not refresh again right away.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = self.refresh().await;
                }
                _ = shutdown.changed() => {
                    info!("refresh_loop_shutdown");
                    return;
                }
            }
        }
    }

    /// Latest snapshot with its staleness flag, if any fetch has ever
    /// succeeded.
    pub fn current_snapshot(&self) -> Option<SnapshotState> {
        let state = self.state.read();
        state
            .snapshot
            .as_ref()
            .map(|snapshot| SnapshotState { snapshot: snapshot.clone(), stale: state.stale })
    }

    /// Kind of the most recent refresh failure, cleared on success.
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.state.read().last_error
    }

    pub fn location_by_id(&self, location_id: u32) -> Option<Location> {
        self.state
            .read()
            .snapshot
            .as_ref()?
            .locations
            .get(&location_id)
            .cloned()
    }
}
