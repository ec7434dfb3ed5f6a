// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for line source connection events.
//!
//! This module contains message types for logging events related to:
//! * Opening the inbound connection
//! * Connection failures at start
//! * The connection closing, by the peer or by shutdown

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Connection to the source endpoint established.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SourceConnected<'a> {
    pub endpoint: &'a str,
    pub elapsed: Duration,
}

impl Display for SourceConnected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Connected to source {} in {:?}",
            self.endpoint, self.elapsed
        )
    }
}

impl StructuredLog for SourceConnected<'_> {
    fn log(&self) {
        tracing::info!(
            endpoint = self.endpoint,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "source",
            span_name = name,
            endpoint = self.endpoint,
        )
    }
}

/// Connection to the source endpoint could not be opened.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_microbatch::observability::messages::source::SourceConnectFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
/// let msg = SourceConnectFailed {
///     endpoint: "localhost:9999",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct SourceConnectFailed<'a> {
    pub endpoint: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for SourceConnectFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to connect to source {}: {}",
            self.endpoint, self.error
        )
    }
}

impl StructuredLog for SourceConnectFailed<'_> {
    fn log(&self) {
        tracing::error!(
            endpoint = self.endpoint,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "source_connect_failed",
            span_name = name,
            endpoint = self.endpoint,
            error = %self.error,
        )
    }
}

/// The reader loop finished and the connection was released.
///
/// # Log Level
/// `info!` when closed by shutdown, `warn!` when the peer went away
pub struct SourceClosed<'a> {
    pub endpoint: &'a str,
    pub lines_read: u64,
    pub bytes_read: u64,
    pub by_peer: bool,
}

impl Display for SourceClosed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let cause = if self.by_peer { "closed by peer" } else { "closed on shutdown" };
        write!(
            f,
            "Source {} {}: {} lines, {} bytes read",
            self.endpoint, cause, self.lines_read, self.bytes_read
        )
    }
}

impl StructuredLog for SourceClosed<'_> {
    fn log(&self) {
        if self.by_peer {
            tracing::warn!(
                endpoint = self.endpoint,
                lines_read = self.lines_read,
                bytes_read = self.bytes_read,
                "{}", self
            );
        } else {
            tracing::info!(
                endpoint = self.endpoint,
                lines_read = self.lines_read,
                bytes_read = self.bytes_read,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "source_closed",
            span_name = name,
            endpoint = self.endpoint,
            by_peer = self.by_peer,
        )
    }
}
