use chrono::{DateTime, Duration, TimeZone, Utc};
use gfs_engine::*;

fn t(sec: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 14, 8, 0, 0).unwrap() + Duration::seconds(sec)
}

#[test]
fn scenario_jitter_inside_departed_radius_never_flaps() {
    let pickup = Coordinates::new(45.7640, 4.8357);
    let ctx = OrderGeoContext::new(
        OrderId::new("TO-jitter"),
        pickup,
        pickup.offset(Meters(120_000.0), 90.0),
    );
    let engine = GeofenceEngine::default();

    // Arrive, then wander across the 500 m line and back, never past 1000 m.
    let track = [450.0, 510.0, 490.0, 650.0, 999.0, 520.0, 480.0, 1000.0, 700.0];
    let mut fired = Vec::new();
    for (i, d) in track.iter().enumerate() {
        let s = PositionSample::at(pickup.offset(Meters(*d), 270.0), t(30 * i as i64));
        let r = engine.detect_status(&ctx, &s).unwrap();
        fired.extend(r.detections.into_iter().map(|d| d.status));
        assert!(r.state.is_at_pickup, "left pickup at {d} m");
        assert!(!r.state.has_left_pickup);
    }
    assert_eq!(fired, vec![DetectionStatus::ArrivedPickup]);

    // Only crossing the departed radius flips it.
    let s = PositionSample::at(pickup.offset(Meters(1050.0), 270.0), t(600));
    let r = engine.detect_status(&ctx, &s).unwrap();
    assert_eq!(r.detections[0].status, DetectionStatus::EnRouteDelivery);
    assert!(!r.state.is_at_pickup);

    // Coming back into the arrived ring after departure does not re-arm pickup
    // departure: has_left_pickup is sticky.
    let s = PositionSample::at(pickup.offset(Meters(100.0), 270.0), t(700));
    let r = engine.detect_status(&ctx, &s).unwrap();
    assert!(r.state.has_left_pickup);
    let s = PositionSample::at(pickup.offset(Meters(1500.0), 270.0), t(800));
    let r = engine.detect_status(&ctx, &s).unwrap();
    assert!(r
        .detections
        .iter()
        .all(|d| d.status != DetectionStatus::EnRouteDelivery));
}
