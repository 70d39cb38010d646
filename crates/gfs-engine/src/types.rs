use std::fmt;

use chrono::{DateTime, Utc};
use gfs_geo::{Coordinates, Meters};
use serde::{Deserialize, Serialize};

use crate::config::GeofenceOverrides;

/// Identifies a transport order (deterministic ordering for tests/logs).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tracking subscription of the order's customer. Drives notification policy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionTier {
    #[default]
    Basic,
    Intermediate,
    Premium,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The slice of an order the engine needs. Owned by the caller.
///
/// Pickup and delivery are plain [`Coordinates`]: an order whose geodata is
/// missing cannot be expressed here and so never reaches the state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderGeoContext {
    pub order_id: OrderId,
    pub pickup: Coordinates,
    pub delivery: Coordinates,
    #[serde(default)]
    pub overrides: GeofenceOverrides,
    #[serde(default)]
    pub tier: SubscriptionTier,
}

impl OrderGeoContext {
    pub fn new(order_id: OrderId, pickup: Coordinates, delivery: Coordinates) -> Self {
        Self {
            order_id,
            pickup,
            delivery,
            overrides: GeofenceOverrides::default(),
            tier: SubscriptionTier::Basic,
        }
    }

    /// Build a context from an order record whose addresses may not be
    /// geocoded yet. Returns `None` when either end is missing.
    pub fn from_optional(
        order_id: OrderId,
        pickup: Option<Coordinates>,
        delivery: Option<Coordinates>,
    ) -> Option<Self> {
        Some(Self::new(order_id, pickup?, delivery?))
    }

    pub fn with_tier(mut self, tier: SubscriptionTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_overrides(mut self, overrides: GeofenceOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn distance_to_pickup(&self, at: &Coordinates) -> Meters {
        at.distance_to(&self.pickup)
    }

    pub fn distance_to_delivery(&self, at: &Coordinates) -> Meters {
        at.distance_to(&self.delivery)
    }
}

/// One vehicle fix.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub coordinates: Coordinates,
    pub timestamp: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinates: Coordinates::new(latitude, longitude),
            timestamp,
        }
    }

    pub fn at(coordinates: Coordinates, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinates,
            timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-order state
// ---------------------------------------------------------------------------

/// Hysteresis state for one order. Owned by the engine's store.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GeofenceState {
    pub is_at_pickup: bool,
    pub is_at_delivery: bool,
    pub has_left_pickup: bool,
    pub last_pickup_distance: Option<Meters>,
    pub last_delivery_distance: Option<Meters>,
    /// Timestamp of the last applied sample.
    pub last_update: Option<DateTime<Utc>>,
}

impl GeofenceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Between pickup departure and delivery arrival.
    pub fn is_en_route(&self) -> bool {
        self.has_left_pickup && !self.is_at_delivery
    }

    pub fn flags(&self) -> StateFlags {
        StateFlags {
            is_at_pickup: self.is_at_pickup,
            is_at_delivery: self.is_at_delivery,
            has_left_pickup: self.has_left_pickup,
        }
    }
}

// ---------------------------------------------------------------------------
// Detections
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionStatus {
    ArrivedPickup,
    EnRouteDelivery,
    NearbyDelivery,
    ArrivedDelivery,
    Loading,
    Unloading,
    UnexpectedStop,
}

impl DetectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionStatus::ArrivedPickup => "ARRIVED_PICKUP",
            DetectionStatus::EnRouteDelivery => "EN_ROUTE_DELIVERY",
            DetectionStatus::NearbyDelivery => "NEARBY_DELIVERY",
            DetectionStatus::ArrivedDelivery => "ARRIVED_DELIVERY",
            DetectionStatus::Loading => "LOADING",
            DetectionStatus::Unloading => "UNLOADING",
            DetectionStatus::UnexpectedStop => "UNEXPECTED_STOP",
        }
    }

    /// Event name published downstream.
    pub fn event(&self) -> &'static str {
        match self {
            DetectionStatus::ArrivedPickup => "order.arrived.pickup",
            DetectionStatus::EnRouteDelivery => "order.departed.pickup",
            DetectionStatus::NearbyDelivery => "tracking.nearby.delivery",
            DetectionStatus::ArrivedDelivery => "order.arrived.delivery",
            DetectionStatus::Loading => "tracking.loading",
            DetectionStatus::Unloading => "tracking.unloading",
            DetectionStatus::UnexpectedStop => "tracking.unexpected.stop",
        }
    }

    /// Dispatch priority of a notification carrying this status.
    pub fn priority(&self) -> NotificationPriority {
        match self {
            DetectionStatus::ArrivedPickup | DetectionStatus::ArrivedDelivery => {
                NotificationPriority::High
            }
            DetectionStatus::EnRouteDelivery | DetectionStatus::NearbyDelivery => {
                NotificationPriority::Medium
            }
            DetectionStatus::Loading
            | DetectionStatus::Unloading
            | DetectionStatus::UnexpectedStop => NotificationPriority::Low,
        }
    }
}

impl fmt::Display for DetectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

/// A discrete event produced for one sample. Not persisted by the engine.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    pub status: DetectionStatus,
    pub event: &'static str,
    pub confidence: Confidence,
    /// Distance to the location the detection refers to (0 for stops away
    /// from both ends).
    pub distance: Meters,
    pub message: String,
    pub notify: bool,
}

impl Detection {
    pub fn new(status: DetectionStatus, confidence: Confidence, distance: Meters) -> Self {
        Self {
            status,
            event: status.event(),
            confidence,
            distance,
            message: String::new(),
            notify: false,
        }
    }

    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = message.into();
        self
    }

    pub fn flagged(mut self) -> Self {
        self.notify = true;
        self
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StateFlags {
    pub is_at_pickup: bool,
    pub is_at_delivery: bool,
    pub has_left_pickup: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Distances {
    pub to_pickup: Meters,
    pub to_delivery: Meters,
}

/// Result of applying one sample to an order's state machine.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusReport {
    pub detections: Vec<Detection>,
    pub distances: Distances,
    pub state: StateFlags,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct LoadingReport {
    pub loading: bool,
    pub unloading: bool,
    pub stationary: bool,
    /// Elapsed minutes across the window; 0 when not stationary.
    pub stationary_duration_minutes: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopSeverity {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UnexpectedStopReport {
    pub unexpected_stop: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<StopSeverity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UnexpectedStopReport {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Monitoring view of one tracked order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActiveState {
    pub order_id: OrderId,
    #[serde(flatten)]
    pub state: GeofenceState,
}

/// Full pipeline output for one sample.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SampleEvaluation {
    pub order_id: OrderId,
    pub timestamp: DateTime<Utc>,
    pub status: StatusReport,
    pub loading: LoadingReport,
    pub unexpected_stop: UnexpectedStopReport,
    /// Geofence and history detections after the notification decision.
    pub detections: Vec<Detection>,
}

impl SampleEvaluation {
    /// Detections flagged for the notification dispatcher.
    pub fn notifications(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter().filter(|d| d.notify)
    }
}
