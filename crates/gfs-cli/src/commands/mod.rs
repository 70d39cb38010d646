//! Command handler modules for gfs-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod replay;

use anyhow::{Context, Result};
use gfs_engine::{EngineConfig, OrderGeoContext};
use std::fs;
use tracing::info;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Resolve the engine config: explicit `--config` paths win, then
/// `$GFS_CONFIG`, then engine defaults.
pub fn load_engine_config(explicit: &[String]) -> Result<EngineConfig> {
    let paths = if explicit.is_empty() {
        gfs_config::paths_from_env()
    } else {
        explicit.to_vec()
    };

    if paths.is_empty() {
        info!("no config layers given; using engine defaults");
        return Ok(EngineConfig::default());
    }

    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = gfs_config::load_layered_yaml(&path_refs)?;
    info!(
        config_hash = %loaded.config_hash,
        layers = paths.len(),
        "engine config loaded"
    );
    Ok(loaded.engine)
}

/// Load an order context from a YAML file.
pub fn load_order(path: &str) -> Result<OrderGeoContext> {
    let raw = fs::read_to_string(path).with_context(|| format!("read order file failed: {path}"))?;
    let ctx: OrderGeoContext = serde_yaml::from_str(&raw)
        .with_context(|| format!("order file must hold order_id, pickup and delivery: {path}"))?;
    Ok(ctx)
}
