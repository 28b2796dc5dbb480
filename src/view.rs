//! Derived view values for the rendering layer
//!
//! Pure functions over a [`CountdownSnapshot`]; the controller never sees
//! any of this.

use crate::state::{CountdownSnapshot, MIN_SECONDS};

/// Fraction of the screen fill, `remaining / configured` while a run is in
/// progress and zero otherwise
pub fn fill_fraction(snapshot: &CountdownSnapshot) -> f64 {
    match snapshot.remaining_seconds {
        Some(remaining) if snapshot.running && snapshot.configured_seconds > 0 => {
            remaining as f64 / snapshot.configured_seconds as f64
        }
        _ => 0.0,
    }
}

/// The large numeral: remaining seconds during a run, the configured
/// duration otherwise
pub fn displayed_value(snapshot: &CountdownSnapshot) -> u64 {
    if snapshot.running {
        snapshot.remaining_seconds.unwrap_or(0)
    } else {
        snapshot.configured_seconds
    }
}

/// The increase control shows only while idle
pub fn increase_visible(snapshot: &CountdownSnapshot) -> bool {
    !snapshot.running
}

/// The decrease control shows only while idle and above the floor
pub fn decrease_visible(snapshot: &CountdownSnapshot) -> bool {
    !snapshot.running && snapshot.configured_seconds > MIN_SECONDS
}

/// True through the last three seconds of a run, when the numeral gets its
/// extra emphasis
pub fn final_stretch(snapshot: &CountdownSnapshot) -> bool {
    matches!(snapshot.remaining_seconds, Some(remaining) if snapshot.running && remaining <= 3)
}
