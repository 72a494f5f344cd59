//! Periodic statistics refresh with an operator-facing countdown
//!
//! Two timers run while the poller is active:
//!
//! * the refresh timer fetches `GET /stats` every `refresh_interval` and
//!   resets the countdown to its full value each time it fires;
//! * the countdown timer decrements the visible counter once per second and
//!   wraps back to the full value after reaching zero.
//!
//! The countdown is display-only and never decides when a fetch happens, so
//! the two may drift apart. Fetches run as their own tasks: stopping the
//! poller cancels the timers but leaves requests in flight, and their
//! completions are dropped by comparing the generation they were issued
//! under with the current one.

use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::core::api_client::CacheApi;
use crate::core::config::ConsoleConfig;
use crate::core::types::StatsSnapshot;

pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Point-in-time copy of everything the dashboard displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub snapshot: Option<StatsSnapshot>,
    pub loading: bool,
    pub countdown: u64,
    /// The most recent poll failed and `snapshot` is from an earlier one.
    pub last_refresh_failed: bool,
}

#[derive(Debug, Clone, Default)]
struct SnapshotState {
    snapshot: Option<Arc<StatsSnapshot>>,
    loading: bool,
    last_refresh_failed: bool,
    generation: u64,
}

struct Shared {
    snapshot: watch::Sender<SnapshotState>,
    countdown: watch::Sender<u64>,
}

struct Timers {
    refresh: JoinHandle<()>,
    countdown: JoinHandle<()>,
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.refresh.abort();
        self.countdown.abort();
    }
}

pub struct StatsPoller<A: CacheApi> {
    api: A,
    refresh_interval: Duration,
    countdown_start: u64,
    shared: Arc<Shared>,
    timers: Mutex<Option<Timers>>,
}

impl<A: CacheApi> StatsPoller<A> {
    pub fn new(api: A, config: &ConsoleConfig) -> Self {
        let countdown_start = config.countdown_start();
        let (snapshot, _) = watch::channel(SnapshotState::default());
        let (countdown, _) = watch::channel(countdown_start);

        Self {
            api,
            refresh_interval: config.refresh_interval,
            countdown_start,
            shared: Arc::new(Shared {
                snapshot,
                countdown,
            }),
            timers: Mutex::new(None),
        }
    }

    /// Activate the poller. Issues the first fetch immediately. Calling this
    /// while already running does nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        if timers.is_some() {
            return;
        }

        let mut generation = 0;
        self.shared.snapshot.send_modify(|state| {
            state.generation += 1;
            state.loading = true;
            generation = state.generation;
        });
        self.shared.countdown.send_replace(self.countdown_start);

        let refresh = tokio::spawn(refresh_loop(
            self.api.clone(),
            Arc::clone(&self.shared),
            generation,
            self.refresh_interval,
            self.countdown_start,
        ));
        let countdown = tokio::spawn(countdown_loop(
            Arc::clone(&self.shared),
            self.countdown_start,
        ));

        *timers = Some(Timers { refresh, countdown });
        info!(
            interval_secs = self.refresh_interval.as_secs(),
            "statistics poller started"
        );
    }

    /// Cancel both timers. Responses still in flight are ignored when they land.
    pub fn stop(&self) {
        let Some(timers) = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return;
        };
        drop(timers);

        self.shared.snapshot.send_if_modified(|state| {
            state.generation += 1;
            false
        });
        info!("statistics poller stopped");
    }

    pub fn is_running(&self) -> bool {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn view(&self) -> DashboardView {
        let state = self.shared.snapshot.borrow().clone();
        DashboardView {
            snapshot: state.snapshot.as_deref().cloned(),
            loading: state.loading,
            countdown: *self.shared.countdown.borrow(),
            last_refresh_failed: state.last_refresh_failed,
        }
    }

    pub fn subscribe(&self) -> DashboardUpdates {
        DashboardUpdates {
            snapshot: self.shared.snapshot.subscribe(),
            countdown: self.shared.countdown.subscribe(),
        }
    }
}

impl<A: CacheApi> Drop for StatsPoller<A> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Change notifications for a poller's snapshot and countdown.
pub struct DashboardUpdates {
    snapshot: watch::Receiver<SnapshotState>,
    countdown: watch::Receiver<u64>,
}

impl DashboardUpdates {
    /// Wait until either the snapshot or the countdown changes. Returns
    /// `false` once the poller has been dropped.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            changed = self.snapshot.changed() => changed.is_ok(),
            changed = self.countdown.changed() => changed.is_ok(),
        }
    }
}

async fn refresh_loop<A: CacheApi>(
    api: A,
    shared: Arc<Shared>,
    generation: u64,
    period: Duration,
    countdown_start: u64,
) {
    // The first tick completes immediately, which is the activation fetch.
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        shared.countdown.send_replace(countdown_start);
        tokio::spawn(fetch_snapshot(api.clone(), Arc::clone(&shared), generation));
    }
}

async fn countdown_loop(shared: Arc<Shared>, countdown_start: u64) {
    let mut ticker = time::interval_at(Instant::now() + COUNTDOWN_TICK, COUNTDOWN_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        shared
            .countdown
            .send_modify(|remaining| *remaining = next_countdown(*remaining, countdown_start));
    }
}

fn next_countdown(remaining: u64, countdown_start: u64) -> u64 {
    match remaining {
        0 => countdown_start,
        n => n.min(countdown_start) - 1,
    }
}

async fn fetch_snapshot<A: CacheApi>(api: A, shared: Arc<Shared>, generation: u64) {
    let outcome = api.fetch_stats().await;

    shared.snapshot.send_if_modified(|state| {
        if state.generation != generation {
            debug!("discarding statistics response from a stopped poller");
            return false;
        }

        match outcome {
            Ok(snapshot) => {
                debug!(
                    total_queries = snapshot.total_queries,
                    total_hits = snapshot.total_hits,
                    "statistics refreshed"
                );
                state.snapshot = Some(Arc::new(snapshot));
                state.last_refresh_failed = false;
            }
            Err(e) => {
                warn!(error = %e, "statistics refresh failed, keeping previous snapshot");
                state.last_refresh_failed = true;
            }
        }
        state.loading = false;
        true
    });
}
