// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for batch sealing and handler invocation.

use crate::errors::CallbackError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A batch boundary was reached and the buffer sealed.
///
/// # Log Level
/// `debug!` - Fires once per interval
pub struct BatchSealed {
    pub sequence: u64,
    pub record_count: usize,
    pub is_final: bool,
}

impl Display for BatchSealed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Sealed {}batch {} with {} records",
            if self.is_final { "final " } else { "" },
            self.sequence,
            self.record_count
        )
    }
}

impl StructuredLog for BatchSealed {
    fn log(&self) {
        tracing::debug!(
            sequence = self.sequence,
            record_count = self.record_count,
            is_final = self.is_final,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "batch",
            span_name = name,
            sequence = self.sequence,
            record_count = self.record_count,
        )
    }
}

/// Records buffered at shutdown were dropped instead of delivered.
///
/// # Log Level
/// `warn!` - Data intentionally not delivered
pub struct FinalBatchDiscarded {
    pub sequence: u64,
    pub record_count: usize,
}

impl Display for FinalBatchDiscarded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Discarded partial batch {} with {} records at shutdown",
            self.sequence, self.record_count
        )
    }
}

impl StructuredLog for FinalBatchDiscarded {
    fn log(&self) {
        tracing::warn!(
            sequence = self.sequence,
            record_count = self.record_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "final_batch_discarded",
            span_name = name,
            sequence = self.sequence,
        )
    }
}

/// Handler returned successfully for a batch.
///
/// # Log Level
/// `debug!` - Fires once per interval
///
/// # Example
/// ```
/// use the_microbatch::observability::messages::batch::BatchDelivered;
/// use std::time::Duration;
///
/// let msg = BatchDelivered {
///     handler: "fraud_detector",
///     sequence: 7,
///     record_count: 40,
///     duration: Duration::from_millis(12),
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct BatchDelivered<'a> {
    pub handler: &'a str,
    pub sequence: u64,
    pub record_count: usize,
    pub duration: Duration,
}

impl Display for BatchDelivered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Handler '{}' processed batch {} ({} records) in {:?}",
            self.handler, self.sequence, self.record_count, self.duration
        )
    }
}

impl StructuredLog for BatchDelivered<'_> {
    fn log(&self) {
        tracing::debug!(
            handler = self.handler,
            sequence = self.sequence,
            record_count = self.record_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "batch_delivered",
            span_name = name,
            handler = self.handler,
            sequence = self.sequence,
        )
    }
}

/// Handler failed, panicked or was cancelled on a batch.
///
/// # Log Level
/// `error!` - The batch is marked failed; the stream continues
pub struct BatchFailed<'a> {
    pub error: &'a CallbackError,
}

impl Display for BatchFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Batch {} failed: {}", self.error.sequence(), self.error)
    }
}

impl StructuredLog for BatchFailed<'_> {
    fn log(&self) {
        tracing::error!(
            sequence = self.error.sequence(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "batch_failed",
            span_name = name,
            sequence = self.error.sequence(),
        )
    }
}

/// Sealed batches that never reached the handler because shutdown was forced.
///
/// # Log Level
/// `warn!` - Data intentionally not delivered
pub struct BatchesAbandoned {
    pub count: usize,
    pub first_sequence: u64,
}

impl Display for BatchesAbandoned {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Abandoned {} sealed batches starting at sequence {} after forced shutdown",
            self.count, self.first_sequence
        )
    }
}

impl StructuredLog for BatchesAbandoned {
    fn log(&self) {
        tracing::warn!(
            count = self.count,
            first_sequence = self.first_sequence,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "batches_abandoned",
            span_name = name,
            count = self.count,
        )
    }
}
