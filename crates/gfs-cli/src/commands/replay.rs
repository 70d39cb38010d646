//! `gfs replay`: feed a recorded track through the engine, one JSON line per fix.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gfs_engine::{EngineError, GeofenceEngine, PositionSample};
use serde::Deserialize;
use std::io::Write;
use tracing::{info, warn};

use super::{load_engine_config, load_order};

pub struct ReplayArgs {
    pub order_path: String,
    pub samples_path: String,
    pub config_paths: Vec<String>,
    pub final_state: bool,
}

#[derive(Debug, Deserialize)]
struct SampleRow {
    latitude: f64,
    longitude: f64,
    timestamp: DateTime<Utc>,
}

/// Read `latitude,longitude,timestamp` rows in file order. Ordering is not
/// checked here; the engine rejects fixes older than the last applied one.
pub fn load_samples_csv(path: &str) -> Result<Vec<PositionSample>> {
    let mut rdr =
        csv::Reader::from_path(path).with_context(|| format!("open samples csv: {path}"))?;
    let mut out = Vec::new();
    for (i, rec) in rdr.deserialize::<SampleRow>().enumerate() {
        // +2: header is line 1
        let row = rec.with_context(|| format!("samples csv line {}", i + 2))?;
        out.push(PositionSample::new(row.latitude, row.longitude, row.timestamp));
    }
    Ok(out)
}

pub fn run<W: Write>(args: &ReplayArgs, out: &mut W) -> Result<()> {
    let config = load_engine_config(&args.config_paths)?;
    let ctx = load_order(&args.order_path)?;
    let samples = load_samples_csv(&args.samples_path)?;
    let engine = GeofenceEngine::try_new(config)?;

    let mut applied = 0usize;
    let mut rejected = 0usize;
    for sample in &samples {
        match engine.evaluate(&ctx, sample) {
            Ok(eval) => {
                applied += 1;
                let line = serde_json::to_string(&eval).context("serialize evaluation")?;
                writeln!(out, "{line}")?;
            }
            Err(e @ EngineError::OutOfOrderSample { .. }) => {
                rejected += 1;
                warn!(error = %e, "sample skipped");
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(
        order_id = %ctx.order_id,
        applied,
        rejected,
        "replay finished"
    );

    if args.final_state {
        for active in engine.list_active_states() {
            let line = serde_json::to_string(&active).context("serialize final state")?;
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn csv_rows_parse_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("s.csv");
        fs::write(
            &p,
            "latitude,longitude,timestamp\n48.85,2.35,2026-03-05T07:30:00Z\n48.86,2.36,2026-03-05T07:31:00Z\n",
        )
        .unwrap();
        let rows = load_samples_csv(p.to_str().unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].timestamp < rows[1].timestamp);
        assert_eq!(rows[1].coordinates.latitude, 48.86);
    }

    #[test]
    fn bad_timestamp_names_the_line() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("s.csv");
        fs::write(
            &p,
            "latitude,longitude,timestamp\n48.85,2.35,2026-03-05T07:30:00Z\n48.86,2.36,yesterday\n",
        )
        .unwrap();
        let err = load_samples_csv(p.to_str().unwrap()).unwrap_err();
        assert!(format!("{err:#}").contains("line 3"), "{err:#}");
    }
}
