//! Engine configuration.
//!
//! Loaded from YAML with every field defaulted, then optionally overridden from
//! the environment (`TA_BLOCK_SIZE`, `TA_MEM_LIMIT_BYTES`, `TA_THREADS`).

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_BLOCK_SIZE: u32 = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Threads per block for the 1-D launch.
    pub block_size: u32,
    /// Device memory budget; `None` means unbounded.
    pub memory_limit_bytes: Option<u64>,
    /// Worker threads for the host runtime; `None` uses the rayon default.
    pub threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            memory_limit_bytes: None,
            threads: None,
        }
    }
}

impl EngineConfig {
    /// Apply `TA_*` overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `TA_*` overrides from an arbitrary lookup. Unparseable values are
    /// ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup("TA_BLOCK_SIZE") {
            match raw.trim().parse::<u32>() {
                Ok(v) => self.block_size = v,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid TA_BLOCK_SIZE"),
            }
        }
        if let Some(raw) = lookup("TA_MEM_LIMIT_BYTES") {
            match raw.trim().parse::<u64>() {
                Ok(v) => self.memory_limit_bytes = Some(v),
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid TA_MEM_LIMIT_BYTES"),
            }
        }
        if let Some(raw) = lookup("TA_THREADS") {
            match raw.trim().parse::<usize>() {
                Ok(v) if v > 0 => self.threads = Some(v),
                _ => tracing::warn!(value = %raw, "ignoring invalid TA_THREADS"),
            }
        }
        self.normalized()
    }

    /// Zero block size falls back to the default.
    pub fn normalized(mut self) -> Self {
        if self.block_size == 0 {
            self.block_size = DEFAULT_BLOCK_SIZE;
        }
        self
    }
}

/// Parse an engine config from YAML text.
pub fn parse_engine_config(raw: &str) -> Result<EngineConfig, ConfigError> {
    let cfg: EngineConfig = serde_yaml::from_str(raw)?;
    Ok(cfg.normalized())
}

/// Load engine config from YAML.
///
/// A missing file or a parse failure logs a warning and returns
/// `EngineConfig::default()`.
pub fn load_engine_config(yaml_path: &str) -> EngineConfig {
    let path = Path::new(yaml_path);
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = yaml_path, "engine config does not exist, using defaults");
            return EngineConfig::default();
        }
        Err(e) => {
            tracing::warn!(
                path = yaml_path,
                error = %e,
                "failed to read engine config, using defaults"
            );
            return EngineConfig::default();
        }
    };
    match parse_engine_config(&raw) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(
                path = yaml_path,
                error = %e,
                "failed to parse engine config, using defaults"
            );
            EngineConfig::default()
        }
    }
}
