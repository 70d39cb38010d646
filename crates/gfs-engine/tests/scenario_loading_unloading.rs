use chrono::{DateTime, Duration, TimeZone, Utc};
use gfs_engine::*;

fn t(min: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 20, 5, 0, 0).unwrap() + Duration::minutes(min)
}

fn order() -> OrderGeoContext {
    let pickup = Coordinates::new(47.2184, -1.5536);
    let delivery = pickup.offset(Meters(80_000.0), 270.0);
    OrderGeoContext::new(OrderId::new("TO-dock"), pickup, delivery)
}

/// Fixes every 30 s while the truck sits at the dock.
#[test]
fn scenario_parked_at_dock_reports_loading() {
    let engine = GeofenceEngine::default();
    let ctx = order();
    let dock = ctx.pickup.offset(Meters(120.0), 45.0);

    let evals: Vec<_> = (0..16)
        .map(|i| {
            let at = dock.offset(Meters(3.0 * (i % 2) as f64), 0.0);
            let s = PositionSample::at(at, t(0) + Duration::seconds(30 * i));
            engine.evaluate(&ctx, &s).unwrap()
        })
        .collect();

    assert_eq!(evals[0].status.detections[0].status, DetectionStatus::ArrivedPickup);
    assert!(!evals[9].loading.loading, "only 4.5 minutes of evidence");
    assert!(evals[10].loading.loading);

    let last = &evals[15];
    assert!(last.loading.loading);
    assert!(!last.loading.unloading);
    assert_eq!(last.loading.stationary_duration_minutes, 7.5);
    let loading = last
        .detections
        .iter()
        .find(|d| d.status == DetectionStatus::Loading)
        .expect("loading detection");
    assert_eq!(loading.event, "tracking.loading");
    assert_eq!(loading.message, "Vehicle loading at pickup for 8 minutes");
    assert!(!loading.notify);
}

/// The approach drive stays in history but does not dilute the dwell.
#[test]
fn scenario_dwell_measured_from_when_truck_parked() {
    let engine = GeofenceEngine::default();
    let ctx = order();
    let dock = ctx.pickup.offset(Meters(80.0), 180.0);

    // Approach from 3 km out, one fix a minute.
    for (i, d) in [3000.0, 1500.0, 400.0].iter().enumerate() {
        let s = PositionSample::at(ctx.pickup.offset(Meters(*d), 180.0), t(i as i64));
        engine.evaluate(&ctx, &s).unwrap();
    }
    let mut last = None;
    for i in 0..13 {
        let s = PositionSample::at(dock, t(3) + Duration::seconds(30 * i));
        last = Some(engine.evaluate(&ctx, &s).unwrap());
    }
    let eval = last.unwrap();
    assert_eq!(engine.recent_samples(&ctx.order_id).len(), 16);
    assert!(eval.loading.loading);
    assert_eq!(eval.loading.stationary_duration_minutes, 6.0);
}

#[test]
fn scenario_caller_window_reports_unloading() {
    let engine = GeofenceEngine::default();
    let ctx = order();

    // Drive the state machine to delivery.
    for (i, at) in [
        ctx.pickup,
        ctx.pickup.offset(Meters(5000.0), 270.0),
        ctx.delivery.offset(Meters(200.0), 90.0),
    ]
    .iter()
    .enumerate()
    {
        engine
            .detect_status(&ctx, &PositionSample::at(*at, t(60 * i as i64)))
            .unwrap();
    }
    assert!(engine.state(&ctx.order_id).unwrap().is_at_delivery);

    let bay = ctx.delivery.offset(Meters(150.0), 90.0);
    let window = vec![
        PositionSample::at(bay, t(130)),
        PositionSample::at(bay, t(136)),
        PositionSample::at(bay.offset(Meters(8.0), 0.0), t(142)),
    ];
    let r = engine.detect_loading_unloading(&ctx, &window).unwrap();
    assert!(r.unloading);
    assert!(!r.loading);
    assert!(r.stationary);
    assert_eq!(r.stationary_duration_minutes, 12.0);
}

#[test]
fn scenario_short_history_is_negative_not_error() {
    let engine = GeofenceEngine::default();
    let ctx = order();
    let s = PositionSample::at(ctx.pickup, t(0));
    engine.detect_status(&ctx, &s).unwrap();

    let r = engine.detect_loading_unloading(&ctx, &[s, s]).unwrap();
    assert_eq!(r, LoadingReport::default());
}
