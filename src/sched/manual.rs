//! Hand-driven scheduler for deterministic tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{ScheduleHandle, TickFlow, TickFn, TickScheduler};

/// Test scheduler whose ticks fire only when the test calls [`fire`]
///
/// [`fire`]: ManualScheduler::fire
#[derive(Default)]
pub struct ManualScheduler {
    slots: Mutex<Vec<Slot>>,
}

struct Slot {
    tick: TickFn,
    cancelled: Arc<AtomicBool>,
    done: bool,
}

impl Slot {
    fn live(&self) -> bool {
        !self.done && !self.cancelled.load(Ordering::SeqCst)
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire one tick on every live schedule
    pub fn fire(&self) {
        // ticks run outside the slot lock so a callback may schedule or
        // cancel without deadlocking
        let mut slots = std::mem::take(&mut *self.lock());
        for slot in &mut slots {
            if slot.live() && (slot.tick)() == TickFlow::Stop {
                slot.done = true;
            }
        }
        let mut guard = self.lock();
        slots.append(&mut guard);
        *guard = slots;
    }

    /// Fire `count` ticks in a row
    pub fn fire_many(&self, count: usize) {
        for _ in 0..count {
            self.fire();
        }
    }

    /// Number of schedules still eligible to tick
    pub fn active(&self) -> usize {
        self.lock().iter().filter(|slot| slot.live()).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule_repeating(&self, _every: Duration, tick: TickFn) -> ScheduleHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.lock().push(Slot {
            tick,
            cancelled: Arc::clone(&cancelled),
            done: false,
        });
        ScheduleHandle::new(move || cancelled.store(true, Ordering::SeqCst))
    }
}
