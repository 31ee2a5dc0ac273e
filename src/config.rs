use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_HOPS: u8 = 30;
pub const DEFAULT_PROBES_PER_HOP: usize = 3;
pub const DEFAULT_TIMEOUT_MS: u64 = 6000;
pub const DEFAULT_PAYLOAD_SIZE: usize = 52;
pub const DEFAULT_MAX_CONSECUTIVE_TIMEOUTS: usize = 3;

/// Tunables for a probing run.
///
/// Every field falls back to its default when absent from the config file, so a
/// partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub max_hops: u8,
    pub probes_per_hop: usize,
    pub timeout_ms: u64,
    pub payload_size: usize,
    pub max_consecutive_timeouts: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            probes_per_hop: DEFAULT_PROBES_PER_HOP,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            max_consecutive_timeouts: DEFAULT_MAX_CONSECUTIVE_TIMEOUTS,
        }
    }
}

impl TraceConfig {
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("Traceroute").join("config.json"))
    }

    /// Loads the user's config file, or the defaults if there is none.
    pub fn load() -> Self {
        match Self::get_config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| Self::parse(&content))
            .unwrap_or_else(|e| {
                log::warn!("ignoring config file {}: {e}", path.display());
                Self::default()
            })
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let config = serde_json::from_str::<TraceConfig>(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_hops == 0 {
            return Err("max_hops must be at least 1".to_string());
        }
        if self.probes_per_hop == 0 {
            return Err("probes_per_hop must be at least 1".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("timeout_ms must be at least 1".to_string());
        }
        if self.max_consecutive_timeouts == 0 {
            return Err("max_consecutive_timeouts must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
