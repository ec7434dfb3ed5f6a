// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sequential batch processor.
//!
//! Sealed batches are handed to the [`BatchHandler`] one at a time in
//! sequence order. Each invocation runs in its own task so that a handler
//! error or panic is contained to its batch, and so a handler still running
//! after the shutdown grace period can be aborted.
//!
//! Every attempted batch is written to an [`OutcomeLedger`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::errors::CallbackError;
use crate::observability::messages::batch::{BatchDelivered, BatchFailed, BatchesAbandoned};
use crate::observability::messages::StructuredLog;
use crate::traits::BatchHandler;
use crate::types::{Batch, BatchOutcome, BatchStatus};

/// Number of batch outcomes retained by a ledger.
pub const MAX_TRACKED_OUTCOMES: usize = 1_024;

/// Bounded record of the most recent batch outcomes.
#[derive(Debug, Clone)]
pub struct OutcomeLedger {
    outcomes: Arc<Mutex<VecDeque<BatchOutcome>>>,
    capacity: usize,
}

impl Default for OutcomeLedger {
    fn default() -> Self {
        Self::with_capacity(MAX_TRACKED_OUTCOMES)
    }
}

impl OutcomeLedger {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, outcome: BatchOutcome) {
        let mut outcomes = self.outcomes.lock().unwrap_or_else(|e| e.into_inner());
        if outcomes.len() == self.capacity {
            outcomes.pop_front();
        }
        outcomes.push_back(outcome);
    }

    /// Oldest first.
    pub fn snapshot(&self) -> Vec<BatchOutcome> {
        let outcomes = self.outcomes.lock().unwrap_or_else(|e| e.into_inner());
        outcomes.iter().cloned().collect()
    }
}

pub struct BatchProcessor {
    handler: Arc<dyn BatchHandler>,
    ledger: OutcomeLedger,
}

impl BatchProcessor {
    pub fn new(handler: Arc<dyn BatchHandler>, ledger: OutcomeLedger) -> Self {
        Self { handler, ledger }
    }

    pub fn ledger(&self) -> &OutcomeLedger {
        &self.ledger
    }

    /// Invoke the handler exactly once on `batch` and record the outcome.
    ///
    /// Never returns an error: handler failures become a `Failed` outcome. If
    /// `force` fires while the handler is running, the handler task is
    /// aborted and the batch recorded as `Cancelled`.
    pub async fn process(&self, batch: Batch, force: &CancellationToken) -> BatchOutcome {
        let sequence = batch.sequence;
        let record_count = batch.len();
        let is_final = batch.is_final;
        let handler_name = self.handler.name();
        let started = Instant::now();

        let batch = Arc::new(batch);
        let handler = Arc::clone(&self.handler);
        let mut task = tokio::spawn({
            let batch = Arc::clone(&batch);
            async move { handler.handle(&batch).await }
        });

        let joined = tokio::select! {
            biased;
            joined = &mut task => Some(joined),
            _ = force.cancelled() => None,
        };

        let failure = match joined {
            Some(Ok(Ok(()))) => None,
            Some(Ok(Err(e))) => Some(CallbackError::Failed {
                handler: handler_name.to_string(),
                sequence,
                reason: format!("{:#}", e),
            }),
            Some(Err(join_error)) if join_error.is_panic() => Some(CallbackError::Panicked {
                handler: handler_name.to_string(),
                sequence,
            }),
            Some(Err(_)) => Some(CallbackError::Cancelled {
                handler: handler_name.to_string(),
                sequence,
            }),
            None => {
                task.abort();
                let _ = task.await;
                Some(CallbackError::Cancelled {
                    handler: handler_name.to_string(),
                    sequence,
                })
            }
        };

        let elapsed = started.elapsed();
        let status = match failure {
            None => {
                BatchDelivered {
                    handler: handler_name,
                    sequence,
                    record_count,
                    duration: elapsed,
                }
                .log();
                BatchStatus::Delivered
            }
            Some(error) => {
                BatchFailed { error: &error }.log();
                match error {
                    CallbackError::Cancelled { .. } => BatchStatus::Cancelled,
                    other => BatchStatus::Failed(other.to_string()),
                }
            }
        };

        let outcome = BatchOutcome {
            sequence,
            record_count,
            is_final,
            status,
            elapsed,
        };
        self.ledger.record(outcome.clone());
        outcome
    }

    /// Process batches until the queue closes or `force` fires.
    ///
    /// Batches still queued when `force` fires are abandoned and logged.
    pub async fn run(self, mut batches: mpsc::UnboundedReceiver<Batch>, force: CancellationToken) {
        loop {
            let batch = tokio::select! {
                biased;
                _ = force.cancelled() => break,
                batch = batches.recv() => match batch {
                    Some(batch) => batch,
                    None => return,
                },
            };
            self.process(batch, &force).await;
        }

        batches.close();
        let mut abandoned = 0usize;
        let mut first_sequence = None;
        while let Ok(batch) = batches.try_recv() {
            first_sequence.get_or_insert(batch.sequence);
            abandoned += 1;
        }
        if let Some(first_sequence) = first_sequence {
            BatchesAbandoned {
                count: abandoned,
                first_sequence,
            }
            .log();
        }
    }
}
