// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-batch handler failures.
//!
//! These are caught by the batch processor loop, logged, and recorded against
//! the batch. They never propagate out of the running stream.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallbackError {
    /// The handler returned an error.
    #[error("Handler '{handler}' failed on batch {sequence}: {reason}")]
    Failed {
        handler: String,
        sequence: u64,
        reason: String,
    },

    /// The handler panicked.
    #[error("Handler '{handler}' panicked on batch {sequence}")]
    Panicked { handler: String, sequence: u64 },

    /// The handler was still running when the shutdown grace period ran out.
    #[error("Handler '{handler}' was cancelled on batch {sequence} after the shutdown grace period")]
    Cancelled { handler: String, sequence: u64 },
}

impl CallbackError {
    pub fn sequence(&self) -> u64 {
        match self {
            CallbackError::Failed { sequence, .. }
            | CallbackError::Panicked { sequence, .. }
            | CallbackError::Cancelled { sequence, .. } => *sequence,
        }
    }
}
