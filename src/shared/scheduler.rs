use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::domain::PlantSnapshot;
use crate::error::FetchError;
use crate::telemetry::TelemetrySource;
use crate::time::Clock;
use crate::view::{DashboardView, ViewContext};

/// Default period between automatic refreshes
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// What asked for a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// The first fetch after start
    Startup,
    /// A periodic tick
    Automatic,
    /// An explicit user request
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch is still outstanding
    InFlight,
    /// Automatic tick while the display is hidden
    Hidden,
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Applied { plants: usize },
    Skipped(SkipReason),
    /// The fetch failed; previous state was kept
    Failed(FetchError),
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RefreshOutcome::Applied { .. })
    }
}

struct SchedulerState {
    plants: Vec<PlantSnapshot>,
    query: String,
    view: Arc<DashboardView>,
    last_refreshed: Option<DateTime<Utc>>,
}

/// Clears the in-flight flag when a fetch ends, including by cancellation
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps the dashboard view in sync with the telemetry source
///
/// At most one fetch is outstanding at any time. Successful fetches replace the
/// stored snapshot list; failures are logged and leave state untouched.
pub struct RefreshScheduler {
    source: Arc<dyn TelemetrySource>,
    clock: Arc<dyn Clock>,
    display_offset: FixedOffset,
    state: RwLock<SchedulerState>,
    in_flight: AtomicBool,
    visible: AtomicBool,
    updates: watch::Sender<Arc<DashboardView>>,
}

impl RefreshScheduler {
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        clock: Arc<dyn Clock>,
        display_offset: FixedOffset,
        query: impl Into<String>,
    ) -> Self {
        let initial = Arc::new(DashboardView {
            query: query.into(),
            ..Default::default()
        });
        let (updates, _) = watch::channel(Arc::clone(&initial));

        Self {
            source,
            clock,
            display_offset,
            state: RwLock::new(SchedulerState {
                plants: Vec::new(),
                query: initial.query.clone(),
                view: initial,
                last_refreshed: None,
            }),
            in_flight: AtomicBool::new(false),
            visible: AtomicBool::new(true),
            updates,
        }
    }

    /// Fetch and apply the latest snapshots
    pub async fn refresh(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        if trigger == RefreshTrigger::Automatic && !self.is_visible() {
            debug!(trigger = ?trigger, "Display hidden, skipping tick");
            return RefreshOutcome::Skipped(SkipReason::Hidden);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(trigger = ?trigger, "Fetch already in flight, skipping");
            return RefreshOutcome::Skipped(SkipReason::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        match self.source.fetch_overview().await {
            Ok(plants) => {
                let count = plants.len();
                let view = self.apply(plants).await;
                info!(
                    trigger = ?trigger,
                    plants = count,
                    with_sensors = view.plants.len(),
                    others = view.others.len(),
                    refreshed_at = %self.clock.now_rfc3339(),
                    "Telemetry refreshed"
                );
                RefreshOutcome::Applied { plants: count }
            }
            Err(e) => {
                warn!(
                    trigger = ?trigger,
                    code = e.code(),
                    error = %e,
                    "Telemetry refresh failed, keeping previous data"
                );
                RefreshOutcome::Failed(e)
            }
        }
    }

    async fn apply(&self, plants: Vec<PlantSnapshot>) -> Arc<DashboardView> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        state.plants = plants;
        state.last_refreshed = Some(now);
        self.rebuild(&mut state, now)
    }

    /// Change the search query and recompute the view without fetching
    pub async fn set_query(&self, query: impl Into<String>) -> Arc<DashboardView> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        state.query = query.into();
        debug!(query = %state.query, "Search query changed");
        self.rebuild(&mut state, now)
    }

    fn rebuild(&self, state: &mut SchedulerState, now: DateTime<Utc>) -> Arc<DashboardView> {
        let ctx = ViewContext {
            now,
            display_offset: self.display_offset,
        };
        let view = Arc::new(DashboardView::build(&state.plants, &state.query, &ctx));
        state.view = Arc::clone(&view);
        self.updates.send_replace(Arc::clone(&view));
        view
    }

    /// Record whether the display is currently visible
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Release);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn view(&self) -> Arc<DashboardView> {
        Arc::clone(&self.state.read().await.view)
    }

    pub async fn plants(&self) -> Vec<PlantSnapshot> {
        self.state.read().await.plants.clone()
    }

    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_refreshed
    }

    /// Receiver notified with every recomputed view
    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardView>> {
        self.updates.subscribe()
    }

    /// Fetch immediately, then every `period` until the handle is stopped or dropped
    pub fn start(self: &Arc<Self>, period: Duration) -> SchedulerHandle {
        let scheduler = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // The first tick completes immediately
            ticker.tick().await;
            scheduler.refresh(RefreshTrigger::Startup).await;

            loop {
                ticker.tick().await;
                scheduler.refresh(RefreshTrigger::Automatic).await;
            }
        });

        info!(period_secs = period.as_secs(), "Refresh scheduler started");
        SchedulerHandle { task }
    }
}

/// Owns the periodic refresh task; stopping or dropping it ends the timer
pub struct SchedulerHandle {
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            self.task.abort();
            info!("Refresh scheduler stopped");
        }
    }
}
