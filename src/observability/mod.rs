// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Log text lives in message types under [`messages`] rather than in format
//! strings scattered through the engine. Each message implements `Display`
//! for the human-readable line and [`messages::StructuredLog`] to emit the
//! event with its fields attached.
//!
//! # Usage
//!
//! ```rust
//! use the_microbatch::observability::messages::StructuredLog;
//! use the_microbatch::observability::messages::batch::BatchSealed;
//!
//! let msg = BatchSealed {
//!     sequence: 0,
//!     record_count: 12,
//!     is_final: false,
//! };
//!
//! msg.log();
//! ```

mod logging;
pub mod messages;

pub use logging::{env_filter, init_tracing, LOG_ENV_VAR};
