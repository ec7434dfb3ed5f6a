use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::{Endpoint, FinalBatchPolicy, StreamConfig};
use crate::context::{Session, StreamState};
use crate::errors::{ConfigurationError, ConnectionError, LifecycleError, StreamError};
use crate::fraud::{ChannelSink, FraudDetector, FraudVerdict};
use crate::traits::BatchHandler;
use crate::types::{Batch, BatchStatus};

/// End-to-end tests driving a streaming context against a local TCP producer.
#[cfg(test)]
mod tests {
    use super::*;

    /// How the producer ends its side of the connection once all lines are written.
    #[derive(Clone, Copy)]
    enum AfterWrite {
        /// Keep the connection open until the client disconnects.
        HoldOpen,
        /// Close immediately.
        Close,
    }

    struct Producer {
        endpoint: Endpoint,
        written: oneshot::Receiver<()>,
        task: JoinHandle<()>,
    }

    async fn spawn_producer(lines: Vec<String>, spacing: Duration, after: AfterWrite) -> Producer {
        spawn_producer_for(1, lines, spacing, after).await
    }

    /// Serve `connections` clients one at a time; the first one receives `lines`.
    async fn spawn_producer_for(
        connections: usize,
        lines: Vec<String>,
        spacing: Duration,
        after: AfterWrite,
    ) -> Producer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (written_tx, written_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut written_tx = Some(written_tx);
            let mut lines = Some(lines);
            for _ in 0..connections {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                for line in lines.take().unwrap_or_default() {
                    socket.write_all(line.as_bytes()).await.unwrap();
                    socket.write_all(b"\n").await.unwrap();
                    if !spacing.is_zero() {
                        tokio::time::sleep(spacing).await;
                    }
                }
                if let Some(tx) = written_tx.take() {
                    let _ = tx.send(());
                }
                match after {
                    AfterWrite::Close => drop(socket),
                    AfterWrite::HoldOpen => {
                        let mut buf = [0u8; 64];
                        while matches!(socket.read(&mut buf).await, Ok(n) if n > 0) {}
                    }
                }
            }
        });

        Producer {
            endpoint: Endpoint::new("127.0.0.1", port).unwrap(),
            written: written_rx,
            task,
        }
    }

    #[derive(Default)]
    struct Collector {
        batches: Mutex<Vec<(u64, Vec<String>)>>,
    }

    impl Collector {
        fn sequences(&self) -> Vec<u64> {
            self.batches.lock().unwrap().iter().map(|(s, _)| *s).collect()
        }

        fn lines(&self) -> Vec<String> {
            self.batches
                .lock()
                .unwrap()
                .iter()
                .flat_map(|(_, lines)| lines.clone())
                .collect()
        }
    }

    #[async_trait]
    impl BatchHandler for Collector {
        async fn handle(&self, batch: &Batch) -> anyhow::Result<()> {
            let lines = batch.lines().map(str::to_string).collect();
            self.batches.lock().unwrap().push((batch.sequence, lines));
            Ok(())
        }

        fn name(&self) -> &'static str {
            "collector"
        }
    }

    struct FailsOnSequence(u64);

    #[async_trait]
    impl BatchHandler for FailsOnSequence {
        async fn handle(&self, batch: &Batch) -> anyhow::Result<()> {
            if batch.sequence == self.0 {
                anyhow::bail!("rejecting batch {}", batch.sequence);
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "fails_on_sequence"
        }
    }

    struct SlowHandler {
        invocations: Mutex<u64>,
    }

    #[async_trait]
    impl BatchHandler for SlowHandler {
        async fn handle(&self, _batch: &Batch) -> anyhow::Result<()> {
            *self.invocations.lock().unwrap() += 1;
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn config(endpoint: &Endpoint, interval_ms: u64) -> StreamConfig {
        StreamConfig::new(endpoint.clone(), Duration::from_millis(interval_ms))
            .unwrap()
            .with_connect_timeout(Duration::from_secs(1))
    }

    fn assert_contiguous_from_zero(sequences: &[u64]) {
        for (i, sequence) in sequences.iter().enumerate() {
            assert_eq!(*sequence, i as u64, "sequences not contiguous: {:?}", sequences);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_every_line_delivered_once_in_order() {
        let input: Vec<String> = (0..20).map(|i| format!("line-{}", i)).collect();
        let producer =
            spawn_producer(input.clone(), Duration::from_millis(10), AfterWrite::HoldOpen).await;
        let collector = Arc::new(Collector::default());

        let session = Session::new();
        let context = session
            .streaming_context(config(&producer.endpoint, 50), collector.clone())
            .unwrap();
        context.start().await.unwrap();
        assert_eq!(context.state().await, StreamState::Running);

        producer.written.await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        context.stop().await.unwrap();

        assert_eq!(collector.lines(), input);
        assert_contiguous_from_zero(&collector.sequences());
        assert!(collector.sequences().len() >= 4);
        assert!(context.outcomes().iter().all(|o| o.is_delivered()));

        // Stopping closed the connection, so the producer saw EOF and exited.
        tokio::time::timeout(Duration::from_secs(2), producer.task)
            .await
            .expect("producer should observe the closed connection")
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_quiet_source_still_produces_empty_batches() {
        let producer = spawn_producer(vec![], Duration::ZERO, AfterWrite::HoldOpen).await;
        let collector = Arc::new(Collector::default());

        let session = Session::new();
        let context = session
            .streaming_context(config(&producer.endpoint, 30), collector.clone())
            .unwrap();
        context.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        context.stop().await.unwrap();

        let sequences = collector.sequences();
        assert!(sequences.len() >= 4, "expected at least 4 batches, got {:?}", sequences);
        assert_contiguous_from_zero(&sequences);
        assert!(collector.lines().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_batch_is_isolated() {
        let producer = spawn_producer(vec![], Duration::ZERO, AfterWrite::HoldOpen).await;

        let session = Session::new();
        let context = session
            .streaming_context(config(&producer.endpoint, 30), Arc::new(FailsOnSequence(1)))
            .unwrap();
        context.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        context.stop().await.unwrap();

        let outcomes = context.outcomes();
        assert!(outcomes.len() >= 3);
        assert!(outcomes[0].is_delivered());
        assert!(matches!(outcomes[1].status, BatchStatus::Failed(_)));
        assert!(outcomes[2..].iter().all(|o| o.is_delivered()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_lifecycle_transitions() {
        let producer = spawn_producer_for(2, vec![], Duration::ZERO, AfterWrite::HoldOpen).await;
        let session = Session::new();
        let stream_config = config(&producer.endpoint, 50);

        let context = session
            .streaming_context(stream_config.clone(), Arc::new(Collector::default()))
            .unwrap();
        context.start().await.unwrap();
        assert_eq!(
            context.start().await,
            Err(StreamError::Lifecycle(LifecycleError::AlreadyRunning))
        );
        assert_eq!(context.state().await, StreamState::Running);

        context.stop().await.unwrap();
        context.stop().await.unwrap();
        assert_eq!(context.state().await, StreamState::Stopped);
        assert_eq!(
            context.start().await,
            Err(StreamError::Lifecycle(LifecycleError::AlreadyConsumed))
        );

        // A fresh context with the same configuration starts fine.
        let fresh = session
            .streaming_context(stream_config, Arc::new(Collector::default()))
            .unwrap();
        fresh.start().await.unwrap();
        fresh.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_one_active_context_per_session() {
        let producer = spawn_producer(vec![], Duration::ZERO, AfterWrite::HoldOpen).await;
        let session = Session::new();

        let first = session
            .streaming_context(config(&producer.endpoint, 50), Arc::new(Collector::default()))
            .unwrap();
        first.start().await.unwrap();

        let second =
            session.streaming_context(config(&producer.endpoint, 50), Arc::new(Collector::default()));
        assert!(matches!(
            second,
            Err(StreamError::Configuration(ConfigurationError::ContextAlreadyActive))
        ));

        first.stop().await.unwrap();
        assert!(session
            .streaming_context(config(&producer.endpoint, 50), Arc::new(Collector::default()))
            .is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_peer_close_terminates_stream_after_delivering_prior_lines() {
        let input = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let producer = spawn_producer(input.clone(), Duration::ZERO, AfterWrite::Close).await;
        let collector = Arc::new(Collector::default());

        let session = Session::new();
        let context = session
            .streaming_context(config(&producer.endpoint, 50), collector.clone())
            .unwrap();
        context.start().await.unwrap();

        let result = context.await_termination_timeout(Duration::from_secs(2)).await;
        assert!(matches!(
            result,
            Err(StreamError::Connection(ConnectionError::ClosedByPeer { .. }))
        ));
        assert_eq!(collector.lines(), input);
        assert_contiguous_from_zero(&collector.sequences());

        // The stream is over before anyone calls stop().
        assert_eq!(context.state().await, StreamState::Stopped);
        assert_eq!(
            context.start().await,
            Err(StreamError::Lifecycle(LifecycleError::AlreadyConsumed))
        );

        context.stop().await.unwrap();
        assert_eq!(context.state().await, StreamState::Stopped);
        assert!(context.terminal_error().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_discarded_final_batch_is_not_delivered() {
        let producer =
            spawn_producer(vec!["pending".to_string()], Duration::ZERO, AfterWrite::HoldOpen)
                .await;
        let collector = Arc::new(Collector::default());

        let session = Session::new();
        let stream_config = config(&producer.endpoint, 60_000)
            .with_final_batch(FinalBatchPolicy::Discard);
        let context = session
            .streaming_context(stream_config, collector.clone())
            .unwrap();
        context.start().await.unwrap();
        producer.written.await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        context.stop().await.unwrap();

        assert!(collector.sequences().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_cancels_slow_handler_after_grace_period() {
        let producer = spawn_producer(vec![], Duration::ZERO, AfterWrite::HoldOpen).await;
        let handler = Arc::new(SlowHandler {
            invocations: Mutex::new(0),
        });

        let session = Session::new();
        let stream_config =
            config(&producer.endpoint, 30).with_grace_period(Duration::from_millis(100));
        let context = session
            .streaming_context(stream_config, handler.clone())
            .unwrap();
        context.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        tokio::time::timeout(Duration::from_secs(2), context.stop())
            .await
            .expect("stop should be bounded by the grace period")
            .unwrap();

        let invocations = *handler.invocations.lock().unwrap();
        assert_eq!(invocations, 1, "only one batch can be in flight at a time");
        assert!(context
            .outcomes()
            .iter()
            .any(|o| o.status == BatchStatus::Cancelled));

        // No stale callbacks after stop returns.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*handler.invocations.lock().unwrap(), invocations);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_fraud_detector_over_socket() {
        // userID is surname ++ name.
        let line = |name: &str, surname: &str, flag: u8| {
            format!(
                r#"{{"name":"{}","surname":"{}","amount":"10.0","delta_t":"0.4","flag":"{}"}}"#,
                name, surname, flag
            )
        };
        let input = vec![
            line("Smith", "Alice", 1),
            line("Jones", "Bob", 1),
            line("Smith", "Alice", 1),
            line("Jones", "Bob", 0),
        ];
        let producer = spawn_producer(input, Duration::ZERO, AfterWrite::HoldOpen).await;
        let (verdict_tx, mut verdict_rx) = mpsc::unbounded_channel();

        // Interval far longer than the test so everything lands in the final batch.
        let session = Session::new();
        let context = session
            .streaming_context(
                config(&producer.endpoint, 60_000),
                Arc::new(FraudDetector::new(ChannelSink::new(verdict_tx))),
            )
            .unwrap();
        context.start().await.unwrap();
        producer.written.await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        context.stop().await.unwrap();

        let result = verdict_rx.recv().await.unwrap();
        assert_eq!(result.transactions, 4);
        assert_eq!(
            result.verdicts,
            vec![FraudVerdict {
                user_id: "AliceSmith".to_string(),
                is_fraud: true,
            }]
        );
    }
}
