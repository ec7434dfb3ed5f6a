// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::{Duration, Instant};

/// One line read from the source, stamped with the instant it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: String,
    pub arrived_at: Instant,
}

impl Record {
    pub fn new(line: impl Into<String>, arrived_at: Instant) -> Self {
        Self {
            line: line.into(),
            arrived_at,
        }
    }
}

/// A sealed micro-batch: every record that arrived in `[interval_start, interval_end)`.
///
/// Invariants:
/// - `records` is in arrival order
/// - every record satisfies `arrived_at < interval_end`
/// - `sequence` is contiguous from 0 within one run of a context
#[derive(Debug, Clone)]
pub struct Batch {
    pub sequence: u64,
    pub interval_start: Instant,
    pub interval_end: Instant,
    pub records: Vec<Record>,
    /// Set on the partial batch flushed when the stream stops.
    pub is_final: bool,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.line.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchStatus {
    Delivered,
    /// Handler returned an error or panicked.
    Failed(String),
    /// Handler was aborted after the shutdown grace period.
    Cancelled,
}

/// Ledger entry written by the batch processor for every batch it attempted.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub sequence: u64,
    pub record_count: usize,
    pub is_final: bool,
    pub status: BatchStatus,
    pub elapsed: Duration,
}

impl BatchOutcome {
    pub fn is_delivered(&self) -> bool {
        self.status == BatchStatus::Delivered
    }
}
