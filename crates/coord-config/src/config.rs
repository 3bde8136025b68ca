//! Configuration types and loading for the coordination engine.
//!
//! The entry point is [`CoordinatorConfig`], the set of tunables governing
//! claim lifetimes, heartbeat cadence, dead-agent detection, and Ethos
//! thresholds. Configuration is loaded with [`load_config`] and saved with
//! [`save_config`] as YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Ethos health-assessment thresholds. Each is a `[0, 1]` fraction except
/// `staleness_secs`, a duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EthosThresholds {
    /// Below this coherence, Ethos opens a remediation project.
    #[serde(default = "default_coherence_min")]
    pub coherence_min: f64,

    /// Above this blockage fraction, Ethos opens a remediation project.
    #[serde(default = "default_blockage_max")]
    pub blockage_max: f64,

    /// Above this mean issue age (seconds), Ethos flags staleness.
    #[serde(default = "default_staleness_secs")]
    pub staleness_secs: f64,

    /// Below this claim health, Ethos flags claim starvation.
    #[serde(default = "default_claim_health_min")]
    pub claim_health_min: f64,

    /// Below this agent health, Ethos flags agent attrition.
    #[serde(default = "default_agent_health_min")]
    pub agent_health_min: f64,
}

fn default_coherence_min() -> f64 {
    0.7
}
fn default_blockage_max() -> f64 {
    0.3
}
fn default_staleness_secs() -> f64 {
    604_800.0
}
fn default_claim_health_min() -> f64 {
    0.3
}
fn default_agent_health_min() -> f64 {
    0.5
}

impl Default for EthosThresholds {
    fn default() -> Self {
        Self {
            coherence_min: default_coherence_min(),
            blockage_max: default_blockage_max(),
            staleness_secs: default_staleness_secs(),
            claim_health_min: default_claim_health_min(),
            agent_health_min: default_agent_health_min(),
        }
    }
}

/// The full set of coordination engine tunables.
///
/// All fields carry serde defaults so a partially-specified YAML file
/// deserializes to a complete, sensible configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Default claim lease lifetime in seconds, used when a caller doesn't
    /// specify an explicit TTL on `claim()`.
    #[serde(default = "default_claim_ttl_secs")]
    pub claim_ttl_secs: i64,

    /// Expected interval between agent heartbeats.
    #[serde(default = "default_heartbeat_period_secs")]
    pub heartbeat_period_secs: i64,

    /// An agent with no heartbeat for this long is considered dead.
    #[serde(default = "default_dead_agent_timeout_secs")]
    pub dead_agent_timeout_secs: i64,

    /// Ethos health-assessment thresholds.
    #[serde(default)]
    pub ethos_thresholds: EthosThresholds,

    /// Advisory interval for a caller-driven Ethos `run_cycle` loop. Not
    /// enforced by the engine itself -- embedders decide their own
    /// scheduling.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: i64,
}

fn default_claim_ttl_secs() -> i64 {
    300
}
fn default_heartbeat_period_secs() -> i64 {
    30
}
fn default_dead_agent_timeout_secs() -> i64 {
    120
}
fn default_check_interval_secs() -> i64 {
    300
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            claim_ttl_secs: default_claim_ttl_secs(),
            heartbeat_period_secs: default_heartbeat_period_secs(),
            dead_agent_timeout_secs: default_dead_agent_timeout_secs(),
            ethos_thresholds: EthosThresholds::default(),
            check_interval_secs: default_check_interval_secs(),
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.claim_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "claim_ttl_secs".into(),
                reason: "must be positive".into(),
            });
        }
        if self.heartbeat_period_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "heartbeat_period_secs".into(),
                reason: "must be positive".into(),
            });
        }
        if self.dead_agent_timeout_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "dead_agent_timeout_secs".into(),
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Loads configuration from `path`. If the file does not exist, returns the
/// default configuration.
pub fn load_config(path: &Path) -> Result<CoordinatorConfig> {
    if !path.exists() {
        return Ok(CoordinatorConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(CoordinatorConfig::default());
    }

    let config: CoordinatorConfig = serde_yaml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Saves configuration to `path`, creating parent directories if needed.
pub fn save_config(path: &Path, config: &CoordinatorConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = CoordinatorConfig::default();
        assert_eq!(cfg.claim_ttl_secs, 300);
        assert_eq!(cfg.heartbeat_period_secs, 30);
        assert_eq!(cfg.dead_agent_timeout_secs, 120);
        cfg.validate().unwrap();
    }

    #[test]
    fn load_missing_config_returns_default() {
        let cfg = load_config(Path::new("/nonexistent/coord-config.yaml")).unwrap();
        assert_eq!(cfg, CoordinatorConfig::default());
    }

    #[test]
    fn roundtrip_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coord.yaml");

        let mut cfg = CoordinatorConfig::default();
        cfg.claim_ttl_secs = 600;
        cfg.ethos_thresholds.coherence_min = 0.8;

        save_config(&path, &cfg).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn deserialize_partial_yaml_fills_defaults() {
        let yaml = "claim_ttl_secs: 600\n";
        let cfg: CoordinatorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.claim_ttl_secs, 600);
        assert_eq!(cfg.heartbeat_period_secs, 30);
    }

    #[test]
    fn rejects_non_positive_ttl() {
        let cfg = CoordinatorConfig {
            claim_ttl_secs: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
