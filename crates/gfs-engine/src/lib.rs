//! gfs-engine
//!
//! Geofence status detection for transport orders.
//!
//! Infers an order's physical lifecycle (arrived at pickup, departed, nearby
//! delivery, arrived at delivery, loading/unloading, unexpected stop) from a
//! stream of vehicle fixes:
//! - Hysteresis between the arrived and departed radii (no flapping on GPS jitter)
//! - Delivery detection gated on pickup completion
//! - Stationary analysis over a time-bounded history per order
//! - Notification decision by confidence and subscription tier
//!
//! Pure deterministic logic. No IO, no wall-clock: every timestamp comes from
//! the samples. State lives until the caller clears it.

mod config;
mod detectors;
mod engine;
mod error;
mod notify;
mod state_machine;
mod stationary;
mod store;
mod types;

pub use config::*;
pub use detectors::{
    detect_loading_unloading, detect_unexpected_stop, HIGH_STOP_MINUTES, MEDIUM_STOP_MINUTES,
};
pub use engine::GeofenceEngine;
pub use error::EngineError;
pub use notify::NotificationDecisionEngine;
pub use state_machine::{apply_distances, Rule, RuleInput, RULES};
pub use stationary::{
    is_stationary, stationary_duration_minutes, stationary_tail, MIN_STATIONARY_SAMPLES,
};
pub use store::{GeofenceStore, OrderSlot};
pub use types::*;

pub use gfs_geo::{Coordinates, Meters};
