//! Countdown controller and state machine

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::sched::{ScheduleHandle, TickFlow, TickScheduler};

use super::CountdownSnapshot;

/// Floor for the configured duration, in seconds
pub const MIN_SECONDS: u64 = 5;
/// Step applied by the increase/decrease controls, in seconds
pub const CONTROL_STEP: u64 = 5;
/// Configured duration of a freshly created controller, in seconds
pub const DEFAULT_SECONDS: u64 = 30;
/// Interval between countdown ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// User intents accepted by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Increase,
    Decrease,
    Start,
    Cancel,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Intent::Increase => "increase",
            Intent::Decrease => "decrease",
            Intent::Start => "start",
            Intent::Cancel => "cancel",
        })
    }
}

/// Construction-time settings for a controller
#[derive(Debug, Clone)]
pub struct CountdownConfig {
    /// Configured duration the controller starts out with, in seconds
    pub initial_seconds: u64,
    /// Interval between ticks of an active run
    pub tick_interval: Duration,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            initial_seconds: DEFAULT_SECONDS,
            tick_interval: TICK_INTERVAL,
        }
    }
}

/// Fields guarded by the controller's mutex
struct Inner {
    configured_seconds: u64,
    remaining_seconds: Option<u64>,
    running: bool,
    /// Claim on the active repeating tick, present exactly while a run is
    /// scheduled
    handle: Option<ScheduleHandle>,
}

impl Inner {
    fn snapshot(&self) -> CountdownSnapshot {
        CountdownSnapshot {
            configured_seconds: self.configured_seconds,
            remaining_seconds: self.remaining_seconds,
            running: self.running,
        }
    }

    /// Back to idle; safe to call when already idle
    fn reset(&mut self) {
        self.remaining_seconds = None;
        self.running = false;
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }
}

/// Owner of the countdown state and of the scheduling of its ticks
///
/// All mutations serialize on one internal mutex: the intent methods, the
/// tick callback, and teardown. The rendering layer observes through
/// [`subscribe`] or the getters and never mutates.
///
/// [`subscribe`]: CountdownController::subscribe
pub struct CountdownController {
    inner: Arc<Mutex<Inner>>,
    tick_interval: Duration,
    scheduler: Arc<dyn TickScheduler>,
    update_tx: watch::Sender<CountdownSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _update_rx: watch::Receiver<CountdownSnapshot>,
    last_intent: Mutex<Option<(Intent, DateTime<Utc>)>>,
}

impl CountdownController {
    /// Create an idle controller
    ///
    /// An `initial_seconds` below [`MIN_SECONDS`] clamps to the floor, the
    /// same way [`decrease`] does.
    ///
    /// [`decrease`]: CountdownController::decrease
    pub fn new(config: CountdownConfig, scheduler: Arc<dyn TickScheduler>) -> Self {
        let configured_seconds = config.initial_seconds.max(MIN_SECONDS);
        let (update_tx, update_rx) = watch::channel(CountdownSnapshot::idle(configured_seconds));

        Self {
            inner: Arc::new(Mutex::new(Inner {
                configured_seconds,
                remaining_seconds: None,
                running: false,
                handle: None,
            })),
            tick_interval: config.tick_interval,
            scheduler,
            update_tx,
            _update_rx: update_rx,
            last_intent: Mutex::new(None),
        }
    }

    /// Raise the configured duration for future runs
    pub fn increase(&self, delta: u64) {
        let mut inner = self.lock_inner();
        inner.configured_seconds = inner.configured_seconds.saturating_add(delta);
        let snapshot = inner.snapshot();
        drop(inner);

        debug!("Configured duration raised to {}s", snapshot.configured_seconds);
        self.note_intent(Intent::Increase);
        self.publish(snapshot);
    }

    /// Lower the configured duration for future runs, clamped at
    /// [`MIN_SECONDS`]
    pub fn decrease(&self, delta: u64) {
        let mut inner = self.lock_inner();
        inner.configured_seconds = inner
            .configured_seconds
            .saturating_sub(delta)
            .max(MIN_SECONDS);
        let snapshot = inner.snapshot();
        drop(inner);

        debug!("Configured duration lowered to {}s", snapshot.configured_seconds);
        self.note_intent(Intent::Decrease);
        self.publish(snapshot);
    }

    /// Begin a run from the configured duration
    ///
    /// A present schedule handle means a run is already in progress; the
    /// call is then a silent no-op so the run cannot be double-scheduled.
    pub fn start(&self) {
        let mut inner = self.lock_inner();
        if inner.handle.is_some() {
            debug!("Start ignored, a run is already in progress");
            return;
        }

        inner.remaining_seconds = Some(inner.configured_seconds);
        inner.running = true;
        let snapshot = inner.snapshot();

        let shared = Arc::clone(&self.inner);
        let updates = self.update_tx.clone();
        let handle = self.scheduler.schedule_repeating(
            self.tick_interval,
            Box::new(move || run_tick(&shared, &updates)),
        );
        inner.handle = Some(handle);
        drop(inner);

        info!("Countdown started from {}s", snapshot.configured_seconds);
        self.note_intent(Intent::Start);
        self.publish(snapshot);
    }

    /// Abandon the active run, if any
    pub fn cancel(&self) {
        let mut inner = self.lock_inner();
        if !inner.running && inner.handle.is_none() {
            debug!("Cancel ignored while idle");
            return;
        }

        inner.reset();
        let snapshot = inner.snapshot();
        drop(inner);

        info!("Countdown cancelled");
        self.note_intent(Intent::Cancel);
        self.publish(snapshot);
    }

    /// Get the configured duration in seconds
    pub fn configured_seconds(&self) -> u64 {
        self.lock_inner().configured_seconds
    }

    /// Get remaining seconds if a run is in progress
    pub fn remaining_seconds(&self) -> Option<u64> {
        let inner = self.lock_inner();
        if inner.running {
            inner.remaining_seconds
        } else {
            None
        }
    }

    /// Check if a run is in progress
    pub fn is_running(&self) -> bool {
        self.lock_inner().running
    }

    /// Get the current state as a snapshot
    pub fn snapshot(&self) -> CountdownSnapshot {
        self.lock_inner().snapshot()
    }

    /// Subscribe to state updates
    pub fn subscribe(&self) -> watch::Receiver<CountdownSnapshot> {
        self.update_tx.subscribe()
    }

    /// Get the last accepted intent and when it arrived
    pub fn last_intent(&self) -> Option<(Intent, DateTime<Utc>)> {
        *self
            .last_intent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn note_intent(&self, intent: Intent) {
        let mut last = self
            .last_intent
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *last = Some((intent, Utc::now()));
    }

    fn publish(&self, snapshot: CountdownSnapshot) {
        publish(&self.update_tx, snapshot);
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        // countdown state stays consistent at every step, so a poisoned
        // guard still holds a valid state
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CountdownController {
    fn drop(&mut self) {
        // a tick must never fire once the controller is gone
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
    }
}

/// One firing of the repeating tick
fn run_tick(inner: &Mutex<Inner>, updates: &watch::Sender<CountdownSnapshot>) -> TickFlow {
    let mut state = inner.lock().unwrap_or_else(PoisonError::into_inner);
    match state.remaining_seconds {
        Some(0) => {
            // zero has been on display for a full interval, the run is over
            state.reset();
            let snapshot = state.snapshot();
            drop(state);

            info!("Countdown finished");
            publish(updates, snapshot);
            TickFlow::Stop
        }
        Some(remaining) => {
            state.remaining_seconds = Some(remaining - 1);
            let snapshot = state.snapshot();
            drop(state);

            debug!("Tick, {}s remaining", remaining - 1);
            publish(updates, snapshot);
            TickFlow::Continue
        }
        // a reset won the race with an in-flight tick, nothing left to do
        None => TickFlow::Stop,
    }
}

fn publish(updates: &watch::Sender<CountdownSnapshot>, snapshot: CountdownSnapshot) {
    if let Err(e) = updates.send(snapshot) {
        warn!("Failed to send countdown update: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::manual::ManualScheduler;

    fn controller_with(initial_seconds: u64) -> (CountdownController, Arc<ManualScheduler>) {
        let scheduler = Arc::new(ManualScheduler::new());
        let controller = CountdownController::new(
            CountdownConfig {
                initial_seconds,
                tick_interval: TICK_INTERVAL,
            },
            Arc::clone(&scheduler) as Arc<dyn TickScheduler>,
        );
        (controller, scheduler)
    }

    #[test]
    fn decrease_clamps_at_the_minimum() {
        let (controller, _scheduler) = controller_with(30);
        for _ in 0..10 {
            controller.decrease(CONTROL_STEP);
        }
        assert_eq!(controller.configured_seconds(), MIN_SECONDS);
    }

    #[test]
    fn increase_then_decrease_round_trips() {
        let (controller, _scheduler) = controller_with(30);
        controller.increase(CONTROL_STEP);
        controller.decrease(CONTROL_STEP);
        assert_eq!(controller.configured_seconds(), 30);
    }

    #[test]
    fn initial_seconds_clamp_at_the_minimum() {
        let (controller, _scheduler) = controller_with(2);
        assert_eq!(controller.configured_seconds(), MIN_SECONDS);
    }

    #[test]
    fn full_run_counts_down_then_resets() {
        let (controller, scheduler) = controller_with(30);
        controller.start();
        assert!(controller.is_running());
        assert_eq!(controller.remaining_seconds(), Some(30));

        for expected in (0..30).rev() {
            scheduler.fire();
            assert!(controller.is_running());
            assert_eq!(controller.remaining_seconds(), Some(expected));
        }

        // zero has been displayed for a full interval, the next tick resets
        scheduler.fire();
        assert!(!controller.is_running());
        assert_eq!(controller.remaining_seconds(), None);
        assert_eq!(controller.configured_seconds(), 30);
        assert_eq!(scheduler.active(), 0);
    }

    #[test]
    fn start_twice_schedules_once() {
        let (controller, scheduler) = controller_with(30);
        controller.start();
        scheduler.fire_many(2);

        controller.start();
        assert_eq!(scheduler.active(), 1);
        assert_eq!(controller.remaining_seconds(), Some(28));
    }

    #[test]
    fn cancel_while_idle_is_a_silent_no_op() {
        let (controller, scheduler) = controller_with(30);
        let before = controller.snapshot();

        controller.cancel();
        assert_eq!(controller.snapshot(), before);
        assert_eq!(scheduler.active(), 0);
        assert_eq!(controller.last_intent(), None);
    }

    #[test]
    fn cancel_mid_run_stops_further_ticks() {
        let (controller, scheduler) = controller_with(30);
        controller.start();
        scheduler.fire_many(3);
        assert_eq!(controller.remaining_seconds(), Some(27));

        controller.cancel();
        assert!(!controller.is_running());
        assert_eq!(controller.remaining_seconds(), None);

        scheduler.fire_many(5);
        assert!(!controller.is_running());
        assert_eq!(controller.remaining_seconds(), None);
        assert_eq!(controller.configured_seconds(), 30);
    }

    #[test]
    fn adjustments_mid_run_only_touch_the_next_run() {
        let (controller, scheduler) = controller_with(30);
        controller.start();
        scheduler.fire_many(2);

        controller.increase(CONTROL_STEP);
        assert_eq!(controller.remaining_seconds(), Some(28));
        assert_eq!(controller.configured_seconds(), 35);

        scheduler.fire();
        assert_eq!(controller.remaining_seconds(), Some(27));
    }

    #[test]
    fn restart_after_completion_uses_the_configured_duration() {
        let (controller, scheduler) = controller_with(5);
        controller.start();
        scheduler.fire_many(6);
        assert!(!controller.is_running());

        controller.increase(CONTROL_STEP);
        controller.start();
        assert_eq!(controller.remaining_seconds(), Some(10));
        assert_eq!(scheduler.active(), 1);
    }

    #[test]
    fn drop_releases_the_schedule() {
        let (controller, scheduler) = controller_with(30);
        controller.start();
        assert_eq!(scheduler.active(), 1);

        drop(controller);
        assert_eq!(scheduler.active(), 0);
    }

    #[test]
    fn published_snapshots_match_the_getters() {
        let (controller, scheduler) = controller_with(30);
        let updates = controller.subscribe();
        assert_eq!(*updates.borrow(), CountdownSnapshot::idle(30));

        controller.start();
        scheduler.fire();
        assert_eq!(*updates.borrow(), CountdownSnapshot::active(30, 29));
        assert_eq!(*updates.borrow(), controller.snapshot());
    }

    #[test]
    fn intents_are_recorded_with_timestamps() {
        let (controller, _scheduler) = controller_with(30);
        assert!(controller.last_intent().is_none());

        controller.start();
        let (intent, _at) = controller.last_intent().unwrap();
        assert_eq!(intent, Intent::Start);

        controller.cancel();
        let (intent, _at) = controller.last_intent().unwrap();
        assert_eq!(intent, Intent::Cancel);
    }
}
