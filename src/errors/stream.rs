// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::{ConfigurationError, ConnectionError, LifecycleError};

/// Errors surfaced to callers of the streaming context.
///
/// Handler failures are not represented here; they stay inside the batch
/// processor loop as [`crate::errors::CallbackError`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
