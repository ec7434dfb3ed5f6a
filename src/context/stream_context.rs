// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::StreamConfig;
use crate::context::session::ActiveSlot;
use crate::engine::cutter::{run_cutter, BatchBuffer, BatchCutter};
use crate::engine::processor::{BatchProcessor, OutcomeLedger};
use crate::errors::{LifecycleError, StreamError};
use crate::observability::messages::stream::{
    ShutdownGraceExceeded, StreamStarted, StreamStopped, StreamTerminated,
};
use crate::observability::messages::StructuredLog;
use crate::source::{pump_lines, TcpLineSource};
use crate::traits::BatchHandler;
use crate::types::BatchOutcome;

/// Externally visible lifecycle state.
///
/// A context starts `Stopped`, becomes `Running` on `start()`, and returns to
/// `Stopped` on `stop()`. A context that has been stopped once is consumed
/// and cannot be started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Stopped,
    Running,
}

/// A micro-batch stream from one TCP source into one batch handler.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use the_microbatch::config::{Endpoint, StreamConfig};
/// use the_microbatch::context::Session;
/// use the_microbatch::traits::handler_fn;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = StreamConfig::new(Endpoint::new("localhost", 9999)?, Duration::from_secs(2))?;
/// let handler = Arc::new(handler_fn("printer", |batch| {
///     println!("batch {}: {} records", batch.sequence, batch.len());
///     Ok(())
/// }));
///
/// let session = Session::new();
/// let context = session.streaming_context(config, handler)?;
/// context.start().await?;
/// context.await_termination_timeout(Duration::from_secs(10)).await?;
/// context.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct StreamContext {
    config: StreamConfig,
    handler: Arc<dyn BatchHandler>,
    ledger: OutcomeLedger,
    inner: Mutex<Inner>,
    started: AtomicBool,
    finished: CancellationToken,
    terminal_error: Arc<StdMutex<Option<StreamError>>>,
}

struct Inner {
    state: StreamState,
    consumed: bool,
    slot: ActiveSlot,
    running: Option<RunningStream>,
}

/// Handles to the tasks of a running stream.
struct RunningStream {
    halt: CancellationToken,
    force: CancellationToken,
    reader: JoinHandle<()>,
    cutter: JoinHandle<u64>,
    processor: JoinHandle<()>,
    started_at: Instant,
}

impl StreamContext {
    pub(crate) fn new(
        config: StreamConfig,
        handler: Arc<dyn BatchHandler>,
        slot: ActiveSlot,
    ) -> Self {
        Self {
            config,
            handler,
            ledger: OutcomeLedger::default(),
            inner: Mutex::new(Inner {
                state: StreamState::Stopped,
                consumed: false,
                slot,
                running: None,
            }),
            started: AtomicBool::new(false),
            finished: CancellationToken::new(),
            terminal_error: Arc::new(StdMutex::new(None)),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// `Stopped` once the stream has ended, even if it ended on its own after
    /// a terminal connection error and `stop()` has not been called yet.
    pub async fn state(&self) -> StreamState {
        let inner = self.inner.lock().await;
        self.effective_state(&inner)
    }

    fn effective_state(&self, inner: &Inner) -> StreamState {
        if inner.state == StreamState::Running && self.has_ended() {
            StreamState::Stopped
        } else {
            inner.state
        }
    }

    /// The terminal error is stored before the cutter is halted, so no tick
    /// is missed while the state still reads `Running`.
    fn has_ended(&self) -> bool {
        self.finished.is_cancelled() || self.terminal_error().is_some()
    }

    /// Connect to the source and start cutting batches.
    ///
    /// Fails with a lifecycle error if the context is running or was already
    /// stopped, and with a connection error if the source cannot be reached.
    /// A failed connection leaves the context startable.
    pub async fn start(&self) -> Result<(), StreamError> {
        let mut inner = self.inner.lock().await;
        if self.effective_state(&inner) == StreamState::Running {
            return Err(LifecycleError::AlreadyRunning.into());
        }
        if inner.consumed {
            return Err(LifecycleError::AlreadyConsumed.into());
        }

        let mut source =
            TcpLineSource::connect(self.config.endpoint(), self.config.connect_timeout()).await?;

        let started_at = Instant::now();
        let halt = CancellationToken::new();
        let force = CancellationToken::new();
        let reader_finished = CancellationToken::new();
        let buffer = BatchBuffer::new();
        let (batches_tx, batches_rx) = mpsc::unbounded_channel();

        let endpoint = self.config.endpoint().to_string();
        let started_msg = StreamStarted {
            endpoint: &endpoint,
            batch_interval: self.config.batch_interval(),
            parallelism: self.config.parallelism(),
            handler: self.handler.name(),
        };
        started_msg.log();
        let span = started_msg.span("stream");

        let reader = tokio::spawn(
            {
                let buffer = buffer.clone();
                let halt = halt.clone();
                let reader_finished = reader_finished.clone();
                let terminal_error = Arc::clone(&self.terminal_error);
                async move {
                    let _finished = reader_finished.drop_guard();
                    let result = pump_lines(&mut source, &buffer, &halt).await;
                    drop(source);

                    if let Err(e) = result {
                        let error = StreamError::from(e);
                        StreamTerminated { error: &error }.log();
                        *terminal_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
                        halt.cancel();
                    }
                }
            }
            .instrument(span.clone()),
        );

        let cutter = tokio::spawn(
            run_cutter(
                BatchCutter::new(buffer, started_at, self.config.batch_interval()),
                batches_tx,
                halt.clone(),
                reader_finished,
                self.config.final_batch(),
            )
            .instrument(span.clone()),
        );

        let processor = tokio::spawn(
            {
                let processor = BatchProcessor::new(Arc::clone(&self.handler), self.ledger.clone());
                let force = force.clone();
                let finished = self.finished.clone();
                async move {
                    processor.run(batches_rx, force).await;
                    finished.cancel();
                }
            }
            .instrument(span),
        );

        inner.state = StreamState::Running;
        inner.consumed = true;
        inner.running = Some(RunningStream {
            halt,
            force,
            reader,
            cutter,
            processor,
            started_at,
        });
        self.started.store(true, Ordering::Release);

        Ok(())
    }

    /// Stop the stream. Idempotent once stopped.
    ///
    /// On return the connection is closed, the timer is cancelled and no
    /// handler invocation is running. Already sealed batches get up to the
    /// configured grace period to drain; after that the in-flight handler is
    /// aborted and anything still queued is abandoned.
    pub async fn stop(&self) -> Result<(), StreamError> {
        let mut inner = self.inner.lock().await;
        let Some(running) = inner.running.take() else {
            return Ok(());
        };

        running.halt.cancel();
        let (batches_sealed, forced) = drain_tasks(
            self.config.grace_period(),
            running.reader,
            running.cutter,
            running.processor,
            &running.force,
        )
        .await;

        inner.state = StreamState::Stopped;
        inner.slot.release();
        self.finished.cancel();

        StreamStopped {
            batches_sealed,
            uptime: running.started_at.elapsed(),
            forced,
        }
        .log();

        Ok(())
    }

    /// Wait until the stream ends, by `stop()` or by a terminal connection error.
    pub async fn await_termination(&self) -> Result<(), StreamError> {
        if !self.started.load(Ordering::Acquire) {
            return Err(LifecycleError::NotStarted.into());
        }
        self.finished.cancelled().await;
        match self.terminal_error() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Like [`await_termination`](Self::await_termination), giving up after
    /// `timeout`. Returns whether the stream ended.
    pub async fn await_termination_timeout(&self, timeout: Duration) -> Result<bool, StreamError> {
        match tokio::time::timeout(timeout, self.await_termination()).await {
            Ok(result) => result.map(|()| true),
            Err(_) => Ok(false),
        }
    }

    /// The error that ended the stream, if it ended on its own.
    pub fn terminal_error(&self) -> Option<StreamError> {
        self.terminal_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Outcomes of the most recent batches, oldest first.
    pub fn outcomes(&self) -> Vec<BatchOutcome> {
        self.ledger.snapshot()
    }
}

impl Drop for StreamContext {
    fn drop(&mut self) {
        if let Some(running) = self.inner.get_mut().running.take() {
            running.halt.cancel();
            running.force.cancel();
        }
    }
}

/// Wait for a halted stream's tasks within one shared `grace` budget.
///
/// The reader and cutter are aborted if they overrun it; the processor is
/// forced through `force`. Returns the number of batches sealed and whether
/// the processor had to be forced.
async fn drain_tasks(
    grace: Duration,
    reader: JoinHandle<()>,
    cutter: JoinHandle<u64>,
    mut processor: JoinHandle<()>,
    force: &CancellationToken,
) -> (u64, bool) {
    let deadline = tokio::time::Instant::now().checked_add(grace);
    let remaining = || match deadline {
        Some(deadline) => deadline.saturating_duration_since(tokio::time::Instant::now()),
        None => grace,
    };

    join_or_abort(reader, remaining()).await;
    let batches_sealed = join_or_abort(cutter, remaining()).await.unwrap_or_default();

    let forced = match tokio::time::timeout(remaining(), &mut processor).await {
        Ok(_) => false,
        Err(_) => {
            ShutdownGraceExceeded {
                grace_period: grace,
            }
            .log();
            force.cancel();
            let _ = processor.await;
            true
        }
    };

    (batches_sealed, forced)
}

/// Join a task, aborting it if it has not finished within `limit`.
async fn join_or_abort<T>(mut handle: JoinHandle<T>, limit: Duration) -> Option<T> {
    match tokio::time::timeout(limit, &mut handle).await {
        Ok(joined) => joined.ok(),
        Err(_) => {
            handle.abort();
            let _ = handle.await;
            None
        }
    }
}
