//! Engine policy configuration.
//!
//! All radii are [`Meters`]. Every struct deserializes with defaults for
//! missing keys and rejects unknown keys, so a layered YAML document only
//! needs to name what it changes.

use gfs_geo::Meters;
use serde::{Deserialize, Serialize};

use crate::stationary::MIN_STATIONARY_SAMPLES;
use crate::types::{DetectionStatus, SubscriptionTier};

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

/// Geofence radii.
///
/// `arrived < departed` is the hysteresis band: a vehicle detected at the
/// pickup stays there until it is farther than `departed`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeofenceZones {
    pub arrived: Meters,
    pub departed: Meters,
    pub nearby: Meters,
    /// Carried for callers that display an en-route ring; no rule reads it.
    pub en_route: Meters,
}

impl Default for GeofenceZones {
    fn default() -> Self {
        Self {
            arrived: Meters(500.0),
            departed: Meters(1000.0),
            nearby: Meters(2000.0),
            en_route: Meters(5000.0),
        }
    }
}

impl GeofenceZones {
    /// Returns a human-readable reason when the radii cannot drive the state
    /// machine.
    pub fn check(&self) -> Result<(), String> {
        for (name, r) in [
            ("arrived", self.arrived),
            ("departed", self.departed),
            ("nearby", self.nearby),
            ("en_route", self.en_route),
        ] {
            if !r.is_finite_positive() {
                return Err(format!(
                    "{name} radius must be a positive number of meters (got {})",
                    r.get()
                ));
            }
        }
        if self.arrived >= self.departed {
            return Err(format!(
                "arrived radius ({}) must be smaller than departed radius ({})",
                self.arrived, self.departed
            ));
        }
        if self.arrived >= self.nearby {
            return Err(format!(
                "arrived radius ({}) must be smaller than nearby radius ({})",
                self.arrived, self.nearby
            ));
        }
        Ok(())
    }
}

/// Per-order radius overrides. Unset fields fall back to the engine zones.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeofenceOverrides {
    pub arrived: Option<Meters>,
    pub departed: Option<Meters>,
    pub nearby: Option<Meters>,
    pub en_route: Option<Meters>,
}

impl GeofenceOverrides {
    pub fn is_empty(&self) -> bool {
        self.arrived.is_none()
            && self.departed.is_none()
            && self.nearby.is_none()
            && self.en_route.is_none()
    }

    pub fn apply(&self, base: GeofenceZones) -> GeofenceZones {
        GeofenceZones {
            arrived: self.arrived.unwrap_or(base.arrived),
            departed: self.departed.unwrap_or(base.departed),
            nearby: self.nearby.unwrap_or(base.nearby),
            en_route: self.en_route.unwrap_or(base.en_route),
        }
    }
}

// ---------------------------------------------------------------------------
// Stationary
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationaryConfig {
    /// Displacement first -> last must stay strictly below this.
    pub max_displacement: Meters,
    /// Elapsed time first -> last must be at least this.
    pub min_elapsed_secs: i64,
}

impl Default for StationaryConfig {
    fn default() -> Self {
        Self {
            max_displacement: Meters(50.0),
            min_elapsed_secs: 5 * 60,
        }
    }
}

// ---------------------------------------------------------------------------
// History retention
// ---------------------------------------------------------------------------

/// Per-order sample retention.
///
/// Retention is by time, not count: the window reaches back `max_span_secs`
/// from the latest fix whatever the sample cadence, keeping one fix at or
/// beyond that horizon. At least three fixes are always kept and never more
/// than `max_samples`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    pub max_span_secs: i64,
    pub max_samples: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            // Longer than the high-severity stop threshold.
            max_span_secs: 60 * 60,
            // One hour at a 5 s cadence.
            max_samples: 720,
        }
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationPolicy {
    /// Tier whose medium-confidence detections may notify.
    pub medium_confidence_tier: SubscriptionTier,
    /// Statuses eligible for medium-confidence notification.
    pub medium_confidence_statuses: Vec<DetectionStatus>,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            medium_confidence_tier: SubscriptionTier::Premium,
            medium_confidence_statuses: vec![
                DetectionStatus::ArrivedPickup,
                DetectionStatus::EnRouteDelivery,
                DetectionStatus::NearbyDelivery,
                DetectionStatus::ArrivedDelivery,
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub zones: GeofenceZones,
    pub stationary: StationaryConfig,
    pub history: HistoryConfig,
    pub notification: NotificationPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            zones: GeofenceZones::default(),
            stationary: StationaryConfig::default(),
            history: HistoryConfig::default(),
            notification: NotificationPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn check(&self) -> Result<(), String> {
        self.zones.check()?;
        if !self.stationary.max_displacement.is_finite_positive() {
            return Err("stationary.max_displacement must be a positive number of meters".into());
        }
        if self.stationary.min_elapsed_secs < 0 {
            return Err("stationary.min_elapsed_secs must not be negative".into());
        }
        if self.history.max_samples < MIN_STATIONARY_SAMPLES {
            return Err(format!(
                "history.max_samples must be at least {MIN_STATIONARY_SAMPLES} (got {})",
                self.history.max_samples
            ));
        }
        if self.history.max_span_secs < self.stationary.min_elapsed_secs {
            return Err(format!(
                "history.max_span_secs ({}) must cover stationary.min_elapsed_secs ({})",
                self.history.max_span_secs, self.stationary.min_elapsed_secs
            ));
        }
        Ok(())
    }
}
