// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Invalid lifecycle transitions. A rejected transition leaves the context untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("Streaming context is already running")]
    AlreadyRunning,

    /// The context was started and stopped before; its connection cannot be reused.
    #[error("Streaming context was already consumed; construct a new context to start again")]
    AlreadyConsumed,

    /// Only a started context can be awaited.
    #[error("Streaming context was never started")]
    NotStarted,
}
