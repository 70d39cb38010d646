//! Stationary classification over a short window of fixes.
//!
//! Only the first and last sample of the window are compared; intermediate
//! fixes count toward the minimum evidence of three samples.
//!
//! A retained order history usually starts while the vehicle was still
//! driving. [`stationary_tail`] cuts it down to the fixes the vehicle has
//! been parked for, so the same first/last rule applies to it.

use crate::config::StationaryConfig;
use crate::types::PositionSample;

/// Fewer samples than this never classify as stationary.
pub const MIN_STATIONARY_SAMPLES: usize = 3;

/// `true` when the vehicle moved less than `max_displacement` across at
/// least `min_elapsed_secs`. Insufficient history yields `false`.
pub fn is_stationary(cfg: &StationaryConfig, window: &[PositionSample]) -> bool {
    if window.len() < MIN_STATIONARY_SAMPLES {
        return false;
    }
    let (first, last) = match (window.first(), window.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return false,
    };

    let moved = first.coordinates.distance_to(&last.coordinates);
    let elapsed = (last.timestamp - first.timestamp).num_seconds();

    moved < cfg.max_displacement && elapsed >= cfg.min_elapsed_secs
}

/// The trailing run of `window` whose fixes all lie strictly within
/// `max_displacement` of the latest fix. Empty input gives an empty slice.
pub fn stationary_tail<'a>(
    cfg: &StationaryConfig,
    window: &'a [PositionSample],
) -> &'a [PositionSample] {
    let Some(last) = window.last() else {
        return window;
    };
    let start = window
        .iter()
        .rposition(|s| s.coordinates.distance_to(&last.coordinates) >= cfg.max_displacement)
        .map_or(0, |i| i + 1);
    &window[start..]
}

/// Minutes between the first and last sample of the window (0 for fewer
/// than two samples).
pub fn stationary_duration_minutes(window: &[PositionSample]) -> f64 {
    match (window.first(), window.last()) {
        (Some(first), Some(last)) if window.len() >= 2 => {
            (last.timestamp - first.timestamp).num_milliseconds() as f64 / 60_000.0
        }
        _ => 0.0,
    }
}
