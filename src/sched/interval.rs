//! tokio-backed tick scheduler

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::debug;

use super::{ScheduleHandle, TickFlow, TickFn, TickScheduler};

/// Scheduler that drives ticks from a spawned tokio task
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalScheduler;

impl IntervalScheduler {
    /// Create a new scheduler
    pub fn new() -> Self {
        Self
    }
}

impl TickScheduler for IntervalScheduler {
    fn schedule_repeating(&self, every: Duration, mut tick: TickFn) -> ScheduleHandle {
        let task = tokio::spawn(async move {
            // interval_at delays the first fire by one full interval
            let mut interval = time::interval_at(Instant::now() + every, every);
            loop {
                interval.tick().await;
                if tick() == TickFlow::Stop {
                    break;
                }
            }
            debug!("Repeating tick finished");
        });

        let abort = task.abort_handle();
        ScheduleHandle::new(move || abort.abort())
    }
}
