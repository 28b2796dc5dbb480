//! Countdown snapshot shared with the rendering layer

use serde::{Deserialize, Serialize};

/// Point-in-time view of the countdown, published to observers on every
/// effective state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    /// User-chosen duration for the next run, in seconds
    pub configured_seconds: u64,
    /// Seconds left in the active run, absent while idle
    pub remaining_seconds: Option<u64>,
    /// True exactly while a run is in progress
    pub running: bool,
}

impl CountdownSnapshot {
    /// Snapshot of an idle countdown
    pub fn idle(configured_seconds: u64) -> Self {
        Self {
            configured_seconds,
            remaining_seconds: None,
            running: false,
        }
    }

    /// Snapshot of an active run
    pub fn active(configured_seconds: u64, remaining_seconds: u64) -> Self {
        Self {
            configured_seconds,
            remaining_seconds: Some(remaining_seconds),
            running: true,
        }
    }

    /// Check if a run is in progress
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Get remaining seconds if a run is in progress
    pub fn remaining_seconds(&self) -> Option<u64> {
        if self.running {
            self.remaining_seconds
        } else {
            None
        }
    }
}
