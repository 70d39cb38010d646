use chrono::{DateTime, Duration, TimeZone, Utc};
use gfs_engine::*;

fn t(min: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 21, 10, 0, 0).unwrap() + Duration::minutes(min)
}

#[test]
fn scenario_out_of_order_sample_rejected() {
    let pickup = Coordinates::new(44.8378, -0.5792);
    let ctx = OrderGeoContext::new(
        OrderId::new("TO-late"),
        pickup,
        pickup.offset(Meters(30_000.0), 0.0),
    );
    let engine = GeofenceEngine::default();

    engine
        .detect_status(&ctx, &PositionSample::at(pickup, t(10)))
        .unwrap();
    let before = engine.state(&ctx.order_id).unwrap();

    // A delayed fix from before the arrival, far from pickup: applying it would
    // fire a departure.
    let late = PositionSample::at(pickup.offset(Meters(4000.0), 180.0), t(5));
    let err = engine.detect_status(&ctx, &late).unwrap_err();
    assert_eq!(
        err,
        EngineError::OutOfOrderSample {
            order_id: ctx.order_id.clone(),
            last: t(10),
            got: t(5),
        }
    );
    assert!(err.to_string().contains("TO-late"));

    assert_eq!(engine.state(&ctx.order_id).unwrap(), before);
    assert_eq!(engine.recent_samples(&ctx.order_id).len(), 1);
    assert!(engine.evaluate(&ctx, &late).is_err());
}
