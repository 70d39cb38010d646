use tracing::{debug, info, warn};

use crate::config::{EngineConfig, GeofenceZones};
use crate::detectors;
use crate::error::EngineError;
use crate::notify::NotificationDecisionEngine;
use crate::state_machine::{apply_distances, RuleInput};
use crate::stationary::stationary_tail;
use crate::store::{GeofenceStore, OrderSlot};
use crate::types::{
    ActiveState, Confidence, Detection, DetectionStatus, Distances, GeofenceState, LoadingReport,
    OrderGeoContext, OrderId, PositionSample, SampleEvaluation, StatusReport,
    UnexpectedStopReport,
};
use gfs_geo::Meters;

/// Status-detection engine shared by every caller.
///
/// `&self` everywhere: wrap in an `Arc` and call from any thread. Per-order
/// serialization is provided by the store.
#[derive(Debug)]
pub struct GeofenceEngine {
    config: EngineConfig,
    store: GeofenceStore,
    notifier: NotificationDecisionEngine,
}

impl Default for GeofenceEngine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

impl GeofenceEngine {
    /// Engine over a validated config. Radii or retention that cannot drive
    /// the state machine are rejected here rather than per sample.
    pub fn try_new(config: EngineConfig) -> Result<Self, EngineError> {
        config
            .check()
            .map_err(|reason| EngineError::InvalidConfig { reason })?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        let store = GeofenceStore::new(config.history);
        let notifier = NotificationDecisionEngine::new(config.notification.clone());
        Self {
            config,
            store,
            notifier,
        }
    }

    /// The policy `evaluate` applies; callers of `detect_status` apply it themselves.
    pub fn notifier(&self) -> &NotificationDecisionEngine {
        &self.notifier
    }

    /// Engine zones with the order's overrides applied.
    pub fn zones_for(&self, ctx: &OrderGeoContext) -> Result<GeofenceZones, EngineError> {
        if ctx.overrides.is_empty() {
            return Ok(self.config.zones);
        }
        let zones = ctx.overrides.apply(self.config.zones);
        zones.check().map_err(|reason| EngineError::InvalidZones {
            order_id: ctx.order_id.clone(),
            reason,
        })?;
        Ok(zones)
    }

    // -----------------------------------------------------------------------
    // Per-sample
    // -----------------------------------------------------------------------

    /// Apply one sample to the order's state machine.
    ///
    /// Creates state on the order's first sample. The sample is also appended
    /// to the order's retained history.
    pub fn detect_status(
        &self,
        ctx: &OrderGeoContext,
        sample: &PositionSample,
    ) -> Result<StatusReport, EngineError> {
        let zones = self.zones_for(ctx)?;
        let mut slot = self.store.get_or_create(&ctx.order_id);
        self.apply_locked(&mut slot, ctx, &zones, sample)
    }

    /// Full pipeline for one sample: state machine, both history detectors
    /// over the parked tail of the retained history, then the notification
    /// decision.
    pub fn evaluate(
        &self,
        ctx: &OrderGeoContext,
        sample: &PositionSample,
    ) -> Result<SampleEvaluation, EngineError> {
        let zones = self.zones_for(ctx)?;

        let (status, state, history) = {
            let mut slot = self.store.get_or_create(&ctx.order_id);
            let status = self.apply_locked(&mut slot, ctx, &zones, sample)?;
            (status, slot.state.clone(), slot.history())
        };

        let stationary = &self.config.stationary;
        let window = stationary_tail(stationary, &history);
        let loading =
            detectors::detect_loading_unloading(&zones, stationary, ctx, &state, window);
        let unexpected_stop = detectors::detect_unexpected_stop(
            &zones,
            stationary,
            ctx,
            &state,
            &sample.coordinates,
            window,
        );

        let mut detections = status.detections.clone();
        detections.extend(history_detections(ctx, sample, &loading, &unexpected_stop));
        let detections = self.notifier.decide(ctx.tier, detections);

        for d in detections.iter().filter(|d| d.notify) {
            info!(
                order_id = %ctx.order_id,
                status = d.status.as_str(),
                priority = ?d.status.priority(),
                "notification-worthy detection"
            );
        }

        Ok(SampleEvaluation {
            order_id: ctx.order_id.clone(),
            timestamp: sample.timestamp,
            status,
            loading,
            unexpected_stop,
            detections,
        })
    }

    fn apply_locked(
        &self,
        slot: &mut OrderSlot,
        ctx: &OrderGeoContext,
        zones: &GeofenceZones,
        sample: &PositionSample,
    ) -> Result<StatusReport, EngineError> {
        if let Some(last) = slot.state.last_update {
            if sample.timestamp < last {
                warn!(
                    order_id = %ctx.order_id,
                    %last,
                    got = %sample.timestamp,
                    "rejecting out-of-order sample"
                );
                return Err(EngineError::OutOfOrderSample {
                    order_id: ctx.order_id.clone(),
                    last,
                    got: sample.timestamp,
                });
            }
        }

        let input = RuleInput {
            zones,
            to_pickup: ctx.distance_to_pickup(&sample.coordinates),
            to_delivery: ctx.distance_to_delivery(&sample.coordinates),
        };
        let detections = apply_distances(&mut slot.state, &input, sample.timestamp);
        slot.record(*sample, self.store.retention());

        debug!(
            order_id = %ctx.order_id,
            to_pickup_m = input.to_pickup.rounded(),
            to_delivery_m = input.to_delivery.rounded(),
            fired = detections.len(),
            "sample applied"
        );

        Ok(StatusReport {
            detections,
            distances: Distances {
                to_pickup: input.to_pickup,
                to_delivery: input.to_delivery,
            },
            state: slot.state.flags(),
        })
    }

    // -----------------------------------------------------------------------
    // History queries (read-only; never create state)
    // -----------------------------------------------------------------------

    /// Loading/unloading over a caller-supplied window. The order's current
    /// state is read, not modified; an untracked order reads as default.
    pub fn detect_loading_unloading(
        &self,
        ctx: &OrderGeoContext,
        recent_samples: &[PositionSample],
    ) -> Result<LoadingReport, EngineError> {
        let zones = self.zones_for(ctx)?;
        let state = self.store.state(&ctx.order_id).unwrap_or_default();
        Ok(detectors::detect_loading_unloading(
            &zones,
            &self.config.stationary,
            ctx,
            &state,
            recent_samples,
        ))
    }

    pub fn detect_unexpected_stop(
        &self,
        ctx: &OrderGeoContext,
        current: &PositionSample,
        recent_samples: &[PositionSample],
    ) -> Result<UnexpectedStopReport, EngineError> {
        let zones = self.zones_for(ctx)?;
        let state = self.store.state(&ctx.order_id).unwrap_or_default();
        Ok(detectors::detect_unexpected_stop(
            &zones,
            &self.config.stationary,
            ctx,
            &state,
            &current.coordinates,
            recent_samples,
        ))
    }

    // -----------------------------------------------------------------------
    // Lifecycle / monitoring
    // -----------------------------------------------------------------------

    /// Drop all state for an order (delivered/cancelled). Returns `true` if
    /// the order was tracked.
    pub fn clear_state(&self, order_id: &OrderId) -> bool {
        let removed = self.store.clear(order_id);
        if removed {
            info!(order_id = %order_id, "geofence state cleared");
        }
        removed
    }

    pub fn list_active_states(&self) -> Vec<ActiveState> {
        self.store.list()
    }

    pub fn state(&self, order_id: &OrderId) -> Option<GeofenceState> {
        self.store.state(order_id)
    }

    pub fn recent_samples(&self, order_id: &OrderId) -> Vec<PositionSample> {
        self.store.recent_samples(order_id)
    }

    pub fn active_order_count(&self) -> usize {
        self.store.len()
    }
}

/// Turn positive history-detector results into detections.
fn history_detections(
    ctx: &OrderGeoContext,
    sample: &PositionSample,
    loading: &LoadingReport,
    stop: &UnexpectedStopReport,
) -> Vec<Detection> {
    let mut out = Vec::new();
    let minutes = loading.stationary_duration_minutes.round() as i64;

    if loading.loading {
        let d = ctx.distance_to_pickup(&sample.coordinates);
        out.push(
            Detection::new(DetectionStatus::Loading, Confidence::Medium, d)
                .with_message(format!("Vehicle loading at pickup for {minutes} minutes")),
        );
    }
    if loading.unloading {
        let d = ctx.distance_to_delivery(&sample.coordinates);
        out.push(
            Detection::new(DetectionStatus::Unloading, Confidence::Medium, d)
                .with_message(format!("Vehicle unloading at delivery for {minutes} minutes")),
        );
    }
    if stop.unexpected_stop {
        let mut d = Detection::new(
            DetectionStatus::UnexpectedStop,
            Confidence::Medium,
            Meters::ZERO,
        );
        if let Some(msg) = &stop.message {
            d = d.with_message(msg.clone());
        }
        out.push(d);
    }
    out
}
