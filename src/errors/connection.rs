// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for the inbound line source connection.
//!
//! Every variant is terminal: the stream is never reconnected.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// The endpoint refused the connection or could not be resolved.
    #[error("Source endpoint {endpoint} is unreachable: {reason}")]
    Unreachable { endpoint: String, reason: String },

    /// The endpoint did not accept the connection within the connect timeout.
    #[error("Timed out after {timeout:?} connecting to source endpoint {endpoint}")]
    TimedOut { endpoint: String, timeout: Duration },

    /// The peer closed the connection while the stream was running.
    #[error("Source endpoint {endpoint} closed the connection after {bytes_read} bytes")]
    ClosedByPeer { endpoint: String, bytes_read: u64 },

    /// Reading from an established connection failed.
    #[error("Read from source endpoint {endpoint} failed: {reason}")]
    Io { endpoint: String, reason: String },
}
