//! Per-order geofence hysteresis.
//!
//! Transitions are an ordered rule table evaluated top to bottom on every
//! sample. Each rule sees the state as left by the rules above it:
//!
//! | # | Rule             | Guard                                          | Effect                      |
//! |---|------------------|------------------------------------------------|-----------------------------|
//! | 1 | arrived pickup   | `!at_pickup && !left_pickup && d_p <= arrived` | `at_pickup = true`          |
//! | 2 | departed pickup  | `at_pickup && !left_pickup && d_p > departed`  | `left_pickup`, `!at_pickup` |
//! | 3 | nearby delivery  | `en_route && arrived < d_d <= nearby`          | none (repeatable)           |
//! | 4 | arrived delivery | `en_route && d_d <= arrived`                   | `at_delivery = true`        |
//!
//! `en_route` is `left_pickup && !at_delivery`. Rule 1 and rule 2 cannot fire
//! on the same sample (`arrived < departed`), and rules 3 and 4 partition the
//! delivery distance. Once departed, the pickup ring is inert: driving back
//! past the pickup neither re-arrives nor pins `at_pickup`.

use chrono::{DateTime, Utc};
use gfs_geo::Meters;
use tracing::info;

use crate::config::GeofenceZones;
use crate::types::{Confidence, Detection, DetectionStatus, GeofenceState};

/// Distances computed for one sample, plus the zones they are judged against.
#[derive(Copy, Clone, Debug)]
pub struct RuleInput<'a> {
    pub zones: &'a GeofenceZones,
    pub to_pickup: Meters,
    pub to_delivery: Meters,
}

/// One guarded transition.
pub struct Rule {
    pub name: &'static str,
    pub guard: fn(&RuleInput<'_>, &GeofenceState) -> bool,
    pub apply: fn(&RuleInput<'_>, &mut GeofenceState) -> Detection,
}

/// Precedence order is the slice order.
pub static RULES: [Rule; 4] = [
    Rule {
        name: "arrived_pickup",
        guard: arrived_pickup_guard,
        apply: arrived_pickup_apply,
    },
    Rule {
        name: "departed_pickup",
        guard: departed_pickup_guard,
        apply: departed_pickup_apply,
    },
    Rule {
        name: "nearby_delivery",
        guard: nearby_delivery_guard,
        apply: nearby_delivery_apply,
    },
    Rule {
        name: "arrived_delivery",
        guard: arrived_delivery_guard,
        apply: arrived_delivery_apply,
    },
];

fn arrived_pickup_guard(i: &RuleInput<'_>, st: &GeofenceState) -> bool {
    !st.is_at_pickup && !st.has_left_pickup && i.to_pickup.within(i.zones.arrived)
}

fn arrived_pickup_apply(i: &RuleInput<'_>, st: &mut GeofenceState) -> Detection {
    st.is_at_pickup = true;
    Detection::new(DetectionStatus::ArrivedPickup, Confidence::High, i.to_pickup)
        .with_message(format!("Vehicle arrived at pickup location ({})", i.to_pickup))
}

// Outside `departed`, not merely outside `arrived`.
fn departed_pickup_guard(i: &RuleInput<'_>, st: &GeofenceState) -> bool {
    st.is_at_pickup && !st.has_left_pickup && !i.to_pickup.within(i.zones.departed)
}

fn departed_pickup_apply(i: &RuleInput<'_>, st: &mut GeofenceState) -> Detection {
    st.has_left_pickup = true;
    st.is_at_pickup = false;
    Detection::new(DetectionStatus::EnRouteDelivery, Confidence::High, i.to_pickup)
        .with_message("Vehicle departed from pickup location")
}

fn nearby_delivery_guard(i: &RuleInput<'_>, st: &GeofenceState) -> bool {
    st.is_en_route()
        && i.to_delivery.within(i.zones.nearby)
        && !i.to_delivery.within(i.zones.arrived)
}

fn nearby_delivery_apply(i: &RuleInput<'_>, _st: &mut GeofenceState) -> Detection {
    Detection::new(DetectionStatus::NearbyDelivery, Confidence::Medium, i.to_delivery)
        .with_message(format!(
            "Vehicle nearby delivery location ({:.1}km)",
            i.to_delivery.as_km()
        ))
        .flagged()
}

fn arrived_delivery_guard(i: &RuleInput<'_>, st: &GeofenceState) -> bool {
    st.is_en_route() && i.to_delivery.within(i.zones.arrived)
}

fn arrived_delivery_apply(i: &RuleInput<'_>, st: &mut GeofenceState) -> Detection {
    st.is_at_delivery = true;
    Detection::new(DetectionStatus::ArrivedDelivery, Confidence::High, i.to_delivery)
        .with_message(format!("Vehicle arrived at delivery location ({})", i.to_delivery))
}

/// Apply one sample's distances to `st`.
///
/// Distances and `last_update` are refreshed whether or not a rule fires.
/// Ordering of samples is the caller's concern (see `GeofenceEngine`).
pub fn apply_distances(
    st: &mut GeofenceState,
    input: &RuleInput<'_>,
    at: DateTime<Utc>,
) -> Vec<Detection> {
    st.last_pickup_distance = Some(input.to_pickup);
    st.last_delivery_distance = Some(input.to_delivery);
    st.last_update = Some(at);

    let mut detections = Vec::new();
    for rule in RULES.iter() {
        if (rule.guard)(input, st) {
            let d = (rule.apply)(input, st);
            info!(
                rule = rule.name,
                status = d.status.as_str(),
                distance_m = d.distance.rounded(),
                "geofence rule fired"
            );
            detections.push(d);
        }
    }
    detections
}
