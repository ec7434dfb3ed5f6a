// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::consts::{
    DEFAULT_CONNECT_TIMEOUT_MS, FALLBACK_PARALLELISM, GRACE_PERIOD_INTERVAL_MULTIPLIER,
};
use crate::config::{Config, FinalBatchPolicy};
use crate::errors::ConfigurationError;

/// Network address of the line source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, ConfigurationError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ConfigurationError::InvalidEndpoint {
                endpoint: format!("{}:{}", host, port),
                reason: "host must not be empty".to_string(),
            });
        }
        if port == 0 {
            return Err(ConfigurationError::InvalidEndpoint {
                endpoint: format!("{}:{}", host, port),
                reason: "port must be between 1 and 65535".to_string(),
            });
        }
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Validated runtime configuration for a streaming context.
///
/// Built either from a YAML [`Config`] via [`StreamConfig::from_config`] or
/// directly in code. The in-code path accepts sub-second intervals, the YAML
/// path only whole seconds.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use the_microbatch::config::{Endpoint, StreamConfig};
///
/// let endpoint = Endpoint::new("localhost", 9999).unwrap();
/// let config = StreamConfig::new(endpoint, Duration::from_secs(2)).unwrap();
///
/// // Grace period defaults to twice the batch interval
/// assert_eq!(config.grace_period(), Duration::from_secs(4));
/// ```
#[derive(Debug, Clone)]
pub struct StreamConfig {
    endpoint: Endpoint,
    batch_interval: Duration,
    connect_timeout: Duration,
    grace_period: Option<Duration>,
    final_batch: FinalBatchPolicy,
    parallelism: usize,
}

impl StreamConfig {
    /// Rejects a zero interval, and one so large that the first boundary or
    /// the default grace period cannot be represented as an instant.
    pub fn new(endpoint: Endpoint, batch_interval: Duration) -> Result<Self, ConfigurationError> {
        let schedulable = batch_interval
            .checked_mul(GRACE_PERIOD_INTERVAL_MULTIPLIER)
            .and_then(|span| Instant::now().checked_add(span))
            .is_some();
        if batch_interval.is_zero() || !schedulable {
            return Err(ConfigurationError::InvalidInterval {
                interval: format!("{:?}", batch_interval),
            });
        }

        Ok(Self {
            endpoint,
            batch_interval,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            grace_period: None,
            final_batch: FinalBatchPolicy::default(),
            parallelism: default_parallelism(),
        })
    }

    /// Convert a deserialized YAML configuration into a runtime configuration.
    pub fn from_config(cfg: &Config) -> Result<Self, ConfigurationError> {
        if cfg.batch_interval_seconds <= 0 {
            return Err(ConfigurationError::InvalidInterval {
                interval: format!("{}s", cfg.batch_interval_seconds),
            });
        }

        let endpoint = Endpoint::new(cfg.source.host.clone(), cfg.source.port)?;
        let interval = Duration::from_secs(cfg.batch_interval_seconds as u64);
        let mut stream_config = Self::new(endpoint, interval)?
            .with_final_batch(cfg.shutdown.final_batch);

        if let Some(timeout_ms) = cfg.source.connect_timeout_ms {
            stream_config = stream_config.with_connect_timeout(Duration::from_millis(timeout_ms));
        }
        if let Some(grace_ms) = cfg.shutdown.grace_period_ms {
            stream_config = stream_config.with_grace_period(Duration::from_millis(grace_ms));
        }
        if let Some(parallelism) = cfg.parallelism {
            stream_config = stream_config.with_parallelism(parallelism);
        }

        Ok(stream_config)
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = Some(grace_period);
        self
    }

    pub fn with_final_batch(mut self, policy: FinalBatchPolicy) -> Self {
        self.final_batch = policy;
        self
    }

    /// Shuffle/parallelism hint. Only reported, a single process never fans out.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn batch_interval(&self) -> Duration {
        self.batch_interval
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Upper bound on how long `stop()` waits for the batch processor to drain.
    pub fn grace_period(&self) -> Duration {
        self.grace_period
            .unwrap_or(self.batch_interval * GRACE_PERIOD_INTERVAL_MULTIPLIER)
    }

    pub fn final_batch(&self) -> FinalBatchPolicy {
        self.final_batch
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_PARALLELISM)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn localhost() -> Endpoint {
        Endpoint::new("localhost", 9999).unwrap()
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = StreamConfig::new(localhost(), Duration::ZERO);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_unschedulable_interval_rejected() {
        let result = StreamConfig::new(localhost(), Duration::MAX);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_explicit_grace_period_overrides_default() {
        let config = StreamConfig::new(localhost(), Duration::from_secs(2))
            .unwrap()
            .with_grace_period(Duration::from_millis(750));
        assert_eq!(config.grace_period(), Duration::from_millis(750));
    }

    #[test]
    fn test_parallelism_is_at_least_one() {
        let config = StreamConfig::new(localhost(), Duration::from_secs(1))
            .unwrap()
            .with_parallelism(0);
        assert_eq!(config.parallelism(), 1);
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(Endpoint::new("", 9999).is_err());
        assert!(Endpoint::new("localhost", 0).is_err());
        assert_eq!(localhost().to_string(), "localhost:9999");
        assert_eq!(Endpoint::new("::1", 80).unwrap().to_string(), "[::1]:80");
    }
}
