// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `stream` - Streaming context lifecycle (start, stop, termination)
//! * `source` - Line source connection events
//! * `batch` - Batch sealing and handler invocation
//! * `fraud` - Worked-example fraud handler events
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_microbatch::observability::messages::source::SourceConnected;
//! use std::time::Duration;
//!
//! let msg = SourceConnected {
//!     endpoint: "localhost:9999",
//!     elapsed: Duration::from_millis(3),
//! };
//!
//! tracing::info!("{}", msg);
//! ```

use std::fmt::Display;
use tracing::Span;

pub mod batch;
pub mod fraud;
pub mod source;
pub mod stream;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog: Display {
    /// Emit the message as a tracing event at its designated level.
    fn log(&self);

    /// Build a span carrying the message's fields, for instrumenting work.
    fn span(&self, name: &str) -> Span;
}
