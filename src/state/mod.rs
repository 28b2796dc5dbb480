//! State management module
//!
//! This module contains the countdown state structures and the controller
//! that owns every mutation of them.

pub mod controller;
pub mod snapshot;

// Re-export main types
pub use controller::{
    CountdownConfig, CountdownController, Intent, CONTROL_STEP, DEFAULT_SECONDS, MIN_SECONDS,
    TICK_INTERVAL,
};
pub use snapshot::CountdownSnapshot;
