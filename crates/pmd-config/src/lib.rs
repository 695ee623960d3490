//! pmd-config
//!
//! Desk configuration: a YAML file, `PMD_*` env overrides on top, and a
//! canonical-JSON sha256 hash of the effective config. The daemon reports
//! the hash in `/v1/status` so an operator can tell at a glance which
//! config a running desk was booted with.
//!
//! Env overrides (applied after the file, highest precedence):
//! - `PMD_ADDR`     → `bind_addr`
//! - `PMD_LOG`      → `log_filter`
//! - `PMD_SEED_CSV` → `seed_csv`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

pub const ENV_ADDR: &str = "PMD_ADDR";
pub const ENV_LOG: &str = "PMD_LOG";
pub const ENV_SEED_CSV: &str = "PMD_SEED_CSV";

fn default_bind_addr() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeskConfig {
    /// Daemon listen address.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// tracing-subscriber EnvFilter directive.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Optional inventory manifest CSV loaded into a fresh store at boot
    /// (dev / demo convenience; requires `seed_group`).
    #[serde(default)]
    pub seed_csv: Option<String>,
    /// Group name created at boot when seeding.
    #[serde(default)]
    pub seed_group: Option<String>,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            log_filter: default_log_filter(),
            seed_csv: None,
            seed_group: None,
        }
    }
}

impl DeskConfig {
    /// Load from a YAML file, then apply env overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        let mut cfg: DeskConfig =
            serde_yaml::from_str(&raw).with_context(|| format!("parse config: {}", path.display()))?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Defaults + env overrides (no file on disk).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var(ENV_ADDR) {
            self.bind_addr = v;
        }
        if let Ok(v) = std::env::var(ENV_LOG) {
            self.log_filter = v;
        }
        if let Ok(v) = std::env::var(ENV_SEED_CSV) {
            self.seed_csv = Some(v);
        }
    }

    /// sha256 over the canonical JSON rendering of the effective config.
    pub fn config_hash(&self) -> Result<String> {
        let value = serde_json::to_value(self).context("config to json")?;
        let canonical = canonical_json(&value)?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Deterministic JSON rendering: object keys sorted, no whitespace. Same
/// input config always hashes the same regardless of field order in the
/// source file.
pub fn canonical_json(v: &Value) -> Result<String> {
    Ok(match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut body = Vec::with_capacity(keys.len());
            for k in keys {
                body.push(format!(
                    "{}:{}",
                    serde_json::to_string(k)?,
                    canonical_json(&map[k])?
                ));
            }
            format!("{{{}}}", body.join(","))
        }
        Value::Array(items) => {
            let mut body = Vec::with_capacity(items.len());
            for item in items {
                body.push(canonical_json(item)?);
            }
            format!("[{}]", body.join(","))
        }
        other => serde_json::to_string(other)?,
    })
}
