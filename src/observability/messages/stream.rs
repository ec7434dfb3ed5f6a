// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for streaming context lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Context start and stop
//! * Terminal stream errors
//! * Shutdown grace period enforcement

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Streaming context entered the running state.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_microbatch::observability::messages::stream::StreamStarted;
/// use std::time::Duration;
///
/// let msg = StreamStarted {
///     endpoint: "localhost:9999",
///     batch_interval: Duration::from_secs(2),
///     parallelism: 2,
///     handler: "fraud_detector",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct StreamStarted<'a> {
    pub endpoint: &'a str,
    pub batch_interval: Duration,
    pub parallelism: usize,
    pub handler: &'a str,
}

impl Display for StreamStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Streaming from {} every {:?} into handler '{}' (parallelism hint {})",
            self.endpoint, self.batch_interval, self.handler, self.parallelism
        )
    }
}

impl StructuredLog for StreamStarted<'_> {
    fn log(&self) {
        tracing::info!(
            endpoint = self.endpoint,
            batch_interval_ms = self.batch_interval.as_millis() as u64,
            parallelism = self.parallelism,
            handler = self.handler,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stream",
            span_name = name,
            endpoint = self.endpoint,
            handler = self.handler,
        )
    }
}

/// Streaming context stopped and all of its tasks have exited.
///
/// # Log Level
/// `info!` - Important operational event
pub struct StreamStopped {
    pub batches_sealed: u64,
    pub uptime: Duration,
    pub forced: bool,
}

impl Display for StreamStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stream stopped after {:?}: {} batches sealed{}",
            self.uptime,
            self.batches_sealed,
            if self.forced { " (forced)" } else { "" }
        )
    }
}

impl StructuredLog for StreamStopped {
    fn log(&self) {
        tracing::info!(
            batches_sealed = self.batches_sealed,
            uptime_ms = self.uptime.as_millis() as u64,
            forced = self.forced,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stream_stopped",
            span_name = name,
            batches_sealed = self.batches_sealed,
        )
    }
}

/// Stream ended on its own because of a terminal error.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct StreamTerminated<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for StreamTerminated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stream terminated: {}", self.error)
    }
}

impl StructuredLog for StreamTerminated<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "stream_terminated",
            span_name = name,
            error = %self.error,
        )
    }
}

/// The batch processor did not drain within the shutdown grace period.
///
/// # Log Level
/// `warn!` - Resources are being force-released
pub struct ShutdownGraceExceeded {
    pub grace_period: Duration,
}

impl Display for ShutdownGraceExceeded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch processor still busy after {:?} grace period; cancelling in-flight handler",
            self.grace_period
        )
    }
}

impl StructuredLog for ShutdownGraceExceeded {
    fn log(&self) {
        tracing::warn!(
            grace_period_ms = self.grace_period.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "shutdown_grace_exceeded",
            span_name = name,
            grace_period = ?self.grace_period,
        )
    }
}
