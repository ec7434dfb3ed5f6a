// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while building or validating a stream configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// The batch interval must be strictly positive.
    #[error("Invalid batch interval: {interval}; the interval must be greater than zero")]
    InvalidInterval {
        /// The rejected interval as written in the configuration
        interval: String,
    },

    /// The session already owns an active streaming context.
    #[error("A streaming context is already active in this session; stop it before creating another")]
    ContextAlreadyActive,

    /// The source endpoint cannot be used to open a connection.
    #[error("Invalid source endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The configuration file could not be read or parsed.
    #[error("Failed to load configuration from '{path}': {reason}")]
    Load { path: String, reason: String },
}
