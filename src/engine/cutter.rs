// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wall-clock batch cutter.
//!
//! The reader task appends records to a shared [`BatchBuffer`]; the cutter
//! wakes at `start + k * interval` for k = 1, 2, ... and seals every record
//! that arrived strictly before that boundary into batch `k - 1`. A batch is
//! emitted on every tick even when no record arrived, so downstream handlers
//! see a steady cadence regardless of traffic.
//!
//! ```text
//!  start          start+I          start+2I
//!    |---- batch 0 ---|---- batch 1 ---|
//!    a (0.5)  b (1.9) | c (2.3)        |
//! ```
//!
//! Append and seal each take the buffer lock exactly once, so a record is
//! attributed to one batch and only one. The buffer is unbounded: a handler
//! that falls behind makes sealed batches queue up in memory rather than
//! having records dropped.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::FinalBatchPolicy;
use crate::observability::messages::batch::{BatchSealed, FinalBatchDiscarded};
use crate::observability::messages::StructuredLog;
use crate::types::{Batch, Record};

/// Append-only record buffer shared by the reader and the cutter.
#[derive(Debug, Clone, Default)]
pub struct BatchBuffer {
    records: Arc<Mutex<Vec<Record>>>,
}

impl BatchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Records must be appended in arrival order.
    pub fn append(&self, record: Record) {
        self.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove and return every record with `arrived_at < boundary`, leaving
    /// later arrivals in place for the next batch.
    fn take_before(&self, boundary: Instant) -> Vec<Record> {
        let mut records = self.lock();
        let split = records.partition_point(|r| r.arrived_at < boundary);
        if split == records.len() {
            return std::mem::take(&mut *records);
        }
        let later = records.split_off(split);
        std::mem::replace(&mut *records, later)
    }

    fn take_all(&self) -> Vec<Record> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        // A panic while holding the lock cannot leave a Vec half-written.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Seals the shared buffer into numbered batches at fixed boundaries.
pub struct BatchCutter {
    buffer: BatchBuffer,
    interval: Duration,
    interval_start: Instant,
    next_boundary: Instant,
    next_sequence: u64,
}

impl BatchCutter {
    pub fn new(buffer: BatchBuffer, start: Instant, interval: Duration) -> Self {
        Self {
            buffer,
            interval,
            interval_start: start,
            next_boundary: start + interval,
            next_sequence: 0,
        }
    }

    pub fn next_boundary(&self) -> Instant {
        self.next_boundary
    }

    pub fn batches_sealed(&self) -> u64 {
        self.next_sequence
    }

    /// Seal the batch ending at the next boundary and advance by one interval.
    pub fn seal_next(&mut self) -> Batch {
        let boundary = self.next_boundary;
        let records = self.buffer.take_before(boundary);
        let batch = self.seal(records, boundary, false);
        self.next_boundary = boundary + self.interval;
        batch
    }

    /// Seal everything still buffered as the final, partial batch ending at `now`.
    pub fn seal_final(&mut self, now: Instant) -> Batch {
        let records = self.buffer.take_all();
        let end = now.max(self.interval_start);
        self.seal(records, end, true)
    }

    fn seal(&mut self, records: Vec<Record>, end: Instant, is_final: bool) -> Batch {
        let batch = Batch {
            sequence: self.next_sequence,
            interval_start: self.interval_start,
            interval_end: end,
            records,
            is_final,
        };

        BatchSealed {
            sequence: batch.sequence,
            record_count: batch.len(),
            is_final,
        }
        .log();

        self.next_sequence += 1;
        self.interval_start = end;
        batch
    }
}

/// Drive the cutter on its timer until `halt` fires.
///
/// Missed ticks are replayed in a burst so no interval is ever skipped. After
/// halting, waits for `reader_finished` so the reader's last append is
/// included, then applies `final_batch` to whatever is left. Dropping the
/// sender on return closes the processor's queue.
///
/// Returns the number of batches sealed, including a final batch.
pub async fn run_cutter(
    mut cutter: BatchCutter,
    batches: mpsc::UnboundedSender<Batch>,
    halt: CancellationToken,
    reader_finished: CancellationToken,
    final_batch: FinalBatchPolicy,
) -> u64 {
    let first_tick = tokio::time::Instant::from_std(cutter.next_boundary());
    let mut ticker = tokio::time::interval_at(first_tick, cutter.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        tokio::select! {
            biased;
            _ = halt.cancelled() => break,
            _ = ticker.tick() => {
                if batches.send(cutter.seal_next()).is_err() {
                    // Processor is gone; nothing left to deliver to.
                    return cutter.batches_sealed();
                }
            }
        }
    }

    reader_finished.cancelled().await;

    if cutter.buffer.is_empty() {
        return cutter.batches_sealed();
    }

    let last = cutter.seal_final(Instant::now());
    match final_batch {
        FinalBatchPolicy::Deliver => {
            let _ = batches.send(last);
        }
        FinalBatchPolicy::Discard => {
            FinalBatchDiscarded {
                sequence: last.sequence,
                record_count: last.len(),
            }
            .log();
        }
    }

    cutter.batches_sealed()
}
