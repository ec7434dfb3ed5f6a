// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::StreamConfig;
use crate::errors::ConfigurationError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure for a streaming job.
///
/// This struct mirrors the YAML file a job is launched from. It is converted
/// into a validated [`StreamConfig`] before a context is created.
///
/// # Fields
/// * `batch_interval_seconds` - Batch interval in whole seconds; must be positive
/// * `source` - Where the line source connects to
/// * `parallelism` - Shuffle/parallelism hint (optional, cosmetic at this scale)
/// * `shutdown` - Graceful shutdown options (optional)
///
/// # Example
/// ```yaml
/// batch_interval_seconds: 2
/// parallelism: 2
/// source:
///   host: localhost
///   port: 9999
///   connect_timeout_ms: 5000
/// shutdown:
///   grace_period_ms: 4000
///   final_batch: deliver
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    pub batch_interval_seconds: i64,
    pub source: SourceConfig,
    #[serde(default)]
    pub parallelism: Option<usize>,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

/// Line source connection settings.
#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: Option<u64>,
}

/// Shutdown behaviour.
///
/// # Fields
/// * `grace_period_ms` - How long `stop()` waits for the in-flight batch (defaults to 2x the interval)
/// * `final_batch` - What to do with records buffered since the last boundary
#[derive(Debug, Default, Deserialize)]
pub struct ShutdownConfig {
    pub grace_period_ms: Option<u64>,
    #[serde(default)]
    pub final_batch: FinalBatchPolicy,
}

/// Handling of the partial batch buffered when the stream stops.
///
/// # Variants
/// * `Deliver` - Seal the partial buffer as a final batch and hand it to the handler
/// * `Discard` - Drop the partial buffer; the drop is logged with its record count
#[derive(Debug, Default, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum FinalBatchPolicy {
    #[default]
    Deliver,
    Discard,
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigurationError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigurationError::Load {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_yaml::from_str(&content).map_err(|e| ConfigurationError::Load {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Load a config from a YAML file and validate it into a [`StreamConfig`].
pub fn load_and_validate_config<P: AsRef<Path>>(
    path: P,
) -> Result<StreamConfig, ConfigurationError> {
    let cfg = load_config(path)?;
    StreamConfig::from_config(&cfg)
}
