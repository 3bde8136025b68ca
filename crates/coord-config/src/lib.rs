//! Configuration management for the agent coordination engine.
//!
//! This crate loads and saves the YAML-encoded [`CoordinatorConfig`]: claim
//! TTLs, heartbeat cadence, dead-agent detection, and Ethos thresholds.

pub mod config;

pub use config::{ConfigError, CoordinatorConfig, EthosThresholds, Result, load_config, save_config};
