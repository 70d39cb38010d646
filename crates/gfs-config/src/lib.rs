//! gfs-config
//!
//! Layered YAML configuration for the geofence engine.
//!
//! Documents are merged in order (earlier docs are base, later docs
//! override), converted to JSON, hashed, then decoded into a typed
//! [`EngineConfig`]. Missing keys take engine defaults; unknown keys are an
//! error so a typo cannot silently fall back to a default radius.
//!
//! All radii are meters.

use anyhow::{anyhow, Context, Result};
use gfs_engine::EngineConfig;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

/// Environment variable holding a `:`-separated list of config paths.
pub const CONFIG_PATHS_ENV: &str = "GFS_CONFIG";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
    pub engine: EngineConfig,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        // An empty document parses as null; treat it as "no overrides".
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    let engine: EngineConfig = serde_json::from_value(merged.clone())
        .context("CONFIG_INVALID: cannot decode engine config")?;
    engine
        .check()
        .map_err(|reason| anyhow!("CONFIG_INVALID: {reason}"))?;

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
        engine,
    })
}

/// Paths named by [`CONFIG_PATHS_ENV`], in merge order. Empty when unset.
pub fn paths_from_env() -> Vec<String> {
    std::env::var(CONFIG_PATHS_ENV)
        .map(|v| split_path_list(&v))
        .unwrap_or_default()
}

fn split_path_list(v: &str) -> Vec<String> {
    v.split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json::Map is key-sorted (no preserve_order feature), so equal
    // configs serialize identically regardless of document key order.
    let s = serde_json::to_string(v).context("canonical json serialize failed")?;
    Ok(s)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    hex::encode(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfs_engine::{DetectionStatus, Meters, SubscriptionTier};

    #[test]
    fn empty_config_is_engine_defaults() {
        let loaded = load_layered_yaml_from_strings(&[""]).unwrap();
        assert_eq!(loaded.engine, EngineConfig::default());
        assert_eq!(loaded.canonical_json, "{}");
    }

    #[test]
    fn later_layer_overrides_earlier() {
        let base = "zones:\n  arrived: 400\n  departed: 900\nhistory:\n  max_samples: 240\n";
        let site = "zones:\n  arrived: 250\n";
        let loaded = load_layered_yaml_from_strings(&[base, site]).unwrap();
        assert_eq!(loaded.engine.zones.arrived, Meters(250.0));
        assert_eq!(loaded.engine.zones.departed, Meters(900.0));
        assert_eq!(loaded.engine.zones.nearby, Meters(2000.0));
        assert_eq!(loaded.engine.history.max_samples, 240);
        assert_eq!(loaded.engine.history.max_span_secs, 3600);
    }

    #[test]
    fn hash_ignores_key_order() {
        let a = "zones:\n  arrived: 300\n  nearby: 1500\n";
        let b = "zones:\n  nearby: 1500\n  arrived: 300\n";
        let ha = load_layered_yaml_from_strings(&[a]).unwrap().config_hash;
        let hb = load_layered_yaml_from_strings(&[b]).unwrap().config_hash;
        assert_eq!(ha, hb);
        assert_eq!(ha.len(), 64);
    }

    #[test]
    fn notification_policy_from_yaml() {
        let doc = "notification:\n  medium_confidence_tier: INTERMEDIATE\n  medium_confidence_statuses: [NEARBY_DELIVERY]\n";
        let loaded = load_layered_yaml_from_strings(&[doc]).unwrap();
        let p = &loaded.engine.notification;
        assert_eq!(p.medium_confidence_tier, SubscriptionTier::Intermediate);
        assert_eq!(p.medium_confidence_statuses, vec![DetectionStatus::NearbyDelivery]);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = load_layered_yaml_from_strings(&["zones:\n  arrived_km: 0.5\n"]).unwrap_err();
        assert!(format!("{err:#}").contains("CONFIG_INVALID"), "{err:#}");
    }

    #[test]
    fn inverted_radii_are_rejected() {
        let err = load_layered_yaml_from_strings(&["zones:\n  arrived: 1500\n"]).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("departed"), "{msg}");
    }

    #[test]
    fn history_shorter_than_stationary_span_is_rejected() {
        let doc = "history:\n  max_span_secs: 240\n";
        let err = load_layered_yaml_from_strings(&[doc]).unwrap_err();
        assert!(format!("{err:#}").contains("min_elapsed_secs"), "{err:#}");
    }

    #[test]
    fn path_list_splits_and_trims() {
        assert_eq!(
            split_path_list(" base.yaml: site.yaml ::"),
            vec!["base.yaml".to_string(), "site.yaml".to_string()]
        );
    }

    #[test]
    fn reads_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.yaml");
        let over = dir.path().join("over.yaml");
        fs::write(&base, "stationary:\n  max_displacement: 40\n").unwrap();
        fs::write(&over, "stationary:\n  min_elapsed_secs: 600\n").unwrap();

        let loaded =
            load_layered_yaml(&[base.to_str().unwrap(), over.to_str().unwrap()]).unwrap();
        assert_eq!(loaded.engine.stationary.max_displacement, Meters(40.0));
        assert_eq!(loaded.engine.stationary.min_elapsed_secs, 600);
    }

    #[test]
    fn missing_file_names_path() {
        let err = load_layered_yaml(&["/nonexistent/gfs.yaml"]).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/gfs.yaml"));
    }
}
