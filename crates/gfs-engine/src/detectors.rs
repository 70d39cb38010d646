//! History-based detectors: loading/unloading and unexpected stops.
//!
//! Both read an order's [`GeofenceState`] and never mutate it.

use gfs_geo::Coordinates;

use crate::config::{GeofenceZones, StationaryConfig};
use crate::stationary::{is_stationary, stationary_duration_minutes, MIN_STATIONARY_SAMPLES};
use crate::types::{
    GeofenceState, LoadingReport, OrderGeoContext, PositionSample, StopSeverity,
    UnexpectedStopReport,
};

/// Stops at or above this many minutes are at least `Medium`.
pub const MEDIUM_STOP_MINUTES: f64 = 15.0;
/// Stops above this many minutes are `High`.
pub const HIGH_STOP_MINUTES: f64 = 30.0;

impl StopSeverity {
    pub fn from_minutes(minutes: f64) -> Self {
        if minutes > HIGH_STOP_MINUTES {
            StopSeverity::High
        } else if minutes >= MEDIUM_STOP_MINUTES {
            StopSeverity::Medium
        } else {
            StopSeverity::Low
        }
    }
}

/// Loading: stationary inside the pickup ring while the state machine has
/// the vehicle at pickup. Unloading: the same at delivery.
///
/// The current position is the last sample of `window`.
pub fn detect_loading_unloading(
    zones: &GeofenceZones,
    cfg: &StationaryConfig,
    ctx: &OrderGeoContext,
    st: &GeofenceState,
    window: &[PositionSample],
) -> LoadingReport {
    if window.len() < MIN_STATIONARY_SAMPLES {
        return LoadingReport::default();
    }
    let Some(current) = window.last() else {
        return LoadingReport::default();
    };

    let stationary = is_stationary(cfg, window);
    let at = &current.coordinates;
    let in_pickup = ctx.distance_to_pickup(at).within(zones.arrived);
    let in_delivery = ctx.distance_to_delivery(at).within(zones.arrived);

    LoadingReport {
        loading: stationary && in_pickup && st.is_at_pickup,
        unloading: stationary && in_delivery && st.is_at_delivery,
        stationary,
        stationary_duration_minutes: if stationary {
            stationary_duration_minutes(window)
        } else {
            0.0
        },
    }
}

/// A stop while en route, outside both the pickup and delivery rings.
pub fn detect_unexpected_stop(
    zones: &GeofenceZones,
    cfg: &StationaryConfig,
    ctx: &OrderGeoContext,
    st: &GeofenceState,
    current: &Coordinates,
    window: &[PositionSample],
) -> UnexpectedStopReport {
    if !st.is_en_route() || !is_stationary(cfg, window) {
        return UnexpectedStopReport::none();
    }

    let in_pickup = ctx.distance_to_pickup(current).within(zones.arrived);
    let in_delivery = ctx.distance_to_delivery(current).within(zones.arrived);
    if in_pickup || in_delivery {
        return UnexpectedStopReport::none();
    }

    let minutes = stationary_duration_minutes(window);
    UnexpectedStopReport {
        unexpected_stop: true,
        duration_minutes: Some(minutes),
        severity: Some(StopSeverity::from_minutes(minutes)),
        location: Some(*current),
        message: Some(format!(
            "Vehicle stopped for {} minutes at unexpected location",
            minutes.round() as i64
        )),
    }
}
