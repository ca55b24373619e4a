//! Configuration system for Squall.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $SQUALL_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/squall/config.toml
//!   3. ~/.config/squall/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SquallConfig {
    pub dedup: DedupConfig,
    pub load: LoadConfig,
    pub clock: ClockConfig,
    pub relay: RelayConfig,
    pub recording: RecordingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Seconds between bucket rotations.
    pub rotation_secs: u64,
    /// Live bucket count. Horizon = buckets × rotation_secs.
    pub buckets: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Targets below this are not worth ramping and are ignored.
    pub min_eps: u64,
    /// Rate the staged ramp starts from.
    pub ramp_floor: u64,
    /// Rate added per ramp period. Set ramp_floor >= target for an
    /// immediate jump instead of a staged ramp.
    pub ramp_step: u64,
    /// Seconds between ramp steps.
    pub ramp_period_secs: u64,
    /// Emission tick granularity in milliseconds.
    pub tick_millis: u64,
    /// Likelihood of a MissingMsg for every first-seen ACK while
    /// generating. 170003 / 242581 observed.
    pub missing_msg_probability: f64,
    /// Likelihood of a StateRequest at each block boundary.
    /// 314 / 412 observed.
    pub state_request_probability: f64,
    /// Start generating at this EPS on boot. 0 = stay idle until told.
    pub autostart_eps: u64,
    /// Simulated federated participants receiving end-of-minute traffic.
    pub autostart_feds: u32,
    /// Simulated audit participants receiving heartbeats.
    pub autostart_audits: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Simulated minute duration in seconds.
    pub minute_secs: u64,
    /// Minutes per block; minute 0 is the block boundary.
    pub minutes_per_block: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Inbound worker task count.
    pub workers: usize,
    /// Peer ids synthesized for the loopback demo network.
    pub simulated_peers: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Directory for per-second telemetry CSVs. Empty = data dir.
    pub path: PathBuf,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for SquallConfig {
    fn default() -> Self {
        Self {
            dedup: DedupConfig::default(),
            load: LoadConfig::default(),
            clock: ClockConfig::default(),
            relay: RelayConfig::default(),
            recording: RecordingConfig::default(),
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            rotation_secs: 60,
            buckets: 10,
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            min_eps: 500,
            ramp_floor: 500,
            ramp_step: 500,
            ramp_period_secs: 30,
            tick_millis: 10,
            missing_msg_probability: 0.7008092142418409,
            state_request_probability: 0.7621359223300971,
            autostart_eps: 0,
            autostart_feds: 0,
            autostart_audits: 0,
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            minute_secs: 60,
            minutes_per_block: 10,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            simulated_peers: 32,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            path: data_dir(),
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("squall")
}

pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("squall")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl SquallConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            SquallConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("SQUALL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&SquallConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text)
                .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply SQUALL_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SQUALL_RELAY__WORKERS") {
            if let Ok(n) = v.parse() {
                self.relay.workers = n;
            }
        }
        if let Ok(v) = std::env::var("SQUALL_RELAY__SIMULATED_PEERS") {
            if let Ok(n) = v.parse() {
                self.relay.simulated_peers = n;
            }
        }
        if let Ok(v) = std::env::var("SQUALL_CLOCK__MINUTE_SECS") {
            if let Ok(n) = v.parse() {
                self.clock.minute_secs = n;
            }
        }
        if let Ok(v) = std::env::var("SQUALL_LOAD__AUTOSTART_EPS") {
            if let Ok(n) = v.parse() {
                self.load.autostart_eps = n;
            }
        }
        if let Ok(v) = std::env::var("SQUALL_LOAD__MIN_EPS") {
            if let Ok(n) = v.parse() {
                self.load.min_eps = n;
            }
        }
        if let Ok(v) = std::env::var("SQUALL_DEDUP__ROTATION_SECS") {
            if let Ok(n) = v.parse() {
                self.dedup.rotation_secs = n;
            }
        }
    }
}
