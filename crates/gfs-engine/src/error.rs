use std::fmt;

use chrono::{DateTime, Utc};

use crate::types::OrderId;

/// Caller-side contract violations surfaced by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// A sample older than the last applied one for the same order.
    OutOfOrderSample {
        order_id: OrderId,
        last: DateTime<Utc>,
        got: DateTime<Utc>,
    },
    /// The order's effective radii cannot drive the state machine.
    InvalidZones { order_id: OrderId, reason: String },
    /// The engine-wide config failed validation.
    InvalidConfig { reason: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::OutOfOrderSample { order_id, last, got } => write!(
                f,
                "order {order_id}: sample at {got} is older than last applied sample at {last}"
            ),
            EngineError::InvalidZones { order_id, reason } => {
                write!(f, "order {order_id}: invalid geofence zones: {reason}")
            }
            EngineError::InvalidConfig { reason } => {
                write!(f, "invalid engine config: {reason}")
            }
        }
    }
}

impl std::error::Error for EngineError {}
