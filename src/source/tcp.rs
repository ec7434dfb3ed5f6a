// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::config::Endpoint;
use crate::errors::ConnectionError;
use crate::observability::messages::source::{SourceConnectFailed, SourceConnected};
use crate::observability::messages::StructuredLog;
use crate::traits::{LineSource, ReadOutcome};
use crate::types::Record;

/// Newline-delimited text over a client-side TCP connection.
///
/// The connection is closed when the source is dropped.
pub struct TcpLineSource {
    endpoint: String,
    reader: BufReader<TcpStream>,
    buf: Vec<u8>,
    bytes_read: u64,
}

impl TcpLineSource {
    /// Connect to `endpoint`, giving up after `timeout`.
    pub async fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<Self, ConnectionError> {
        let label = endpoint.to_string();
        let started = Instant::now();

        let connect = TcpStream::connect((endpoint.host(), endpoint.port()));
        let stream = match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                SourceConnectFailed {
                    endpoint: &label,
                    error: &e,
                }
                .log();
                return Err(ConnectionError::Unreachable {
                    endpoint: label,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                let error = ConnectionError::TimedOut {
                    endpoint: label.clone(),
                    timeout,
                };
                SourceConnectFailed {
                    endpoint: &label,
                    error: &error,
                }
                .log();
                return Err(error);
            }
        };

        SourceConnected {
            endpoint: &label,
            elapsed: started.elapsed(),
        }
        .log();

        Ok(Self {
            endpoint: label,
            reader: BufReader::new(stream),
            buf: Vec::with_capacity(256),
            bytes_read: 0,
        })
    }
}

#[async_trait]
impl LineSource for TcpLineSource {
    async fn read_line(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome, ConnectionError> {
        self.buf.clear();

        // read_until is not cancel safe; a cancelled partial line is dropped
        // together with the connection.
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            read = self.reader.read_until(b'\n', &mut self.buf) => Some(read),
        };

        let n = match read {
            None => return Ok(ReadOutcome::Cancelled),
            Some(Ok(n)) => n,
            Some(Err(e)) => {
                return Err(ConnectionError::Io {
                    endpoint: self.endpoint.clone(),
                    reason: e.to_string(),
                })
            }
        };

        if n == 0 {
            return Ok(ReadOutcome::EndOfStream);
        }

        self.bytes_read += n as u64;
        Ok(ReadOutcome::Line(Record::new(
            decode_line(&self.buf),
            Instant::now(),
        )))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

/// Strip the line terminator (`\n` or `\r\n`) and decode, replacing invalid UTF-8.
fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    async fn local_listener() -> (TcpListener, Endpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, Endpoint::new("127.0.0.1", port).unwrap())
    }

    async fn next_line(source: &mut TcpLineSource, cancel: &CancellationToken) -> String {
        match source.read_line(cancel).await.unwrap() {
            ReadOutcome::Line(record) => record.line,
            other => panic!("Expected a line, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_line_strips_terminators() {
        assert_eq!(decode_line(b"hello\n"), "hello");
        assert_eq!(decode_line(b"hello\r\n"), "hello");
        assert_eq!(decode_line(b"no newline"), "no newline");
        assert_eq!(decode_line(b"\n"), "");
        assert_eq!(decode_line(b"bad \xff byte\n"), "bad \u{fffd} byte");
    }

    #[tokio::test]
    async fn test_reads_lines_in_order_until_end_of_stream() {
        let (listener, endpoint) = local_listener().await;
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"first\r\nsecond\ntrailing").await.unwrap();
        });

        let mut source = TcpLineSource::connect(&endpoint, Duration::from_secs(1))
            .await
            .unwrap();
        server.await.unwrap();

        let cancel = CancellationToken::new();
        assert_eq!(next_line(&mut source, &cancel).await, "first");
        assert_eq!(next_line(&mut source, &cancel).await, "second");
        assert_eq!(next_line(&mut source, &cancel).await, "trailing");
        assert!(matches!(
            source.read_line(&cancel).await.unwrap(),
            ReadOutcome::EndOfStream
        ));
        assert_eq!(source.bytes_read(), 22);
    }

    #[tokio::test]
    async fn test_blocked_read_observes_cancellation() {
        let (listener, endpoint) = local_listener().await;
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            // Hold the connection open without writing.
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let mut source = TcpLineSource::connect(&endpoint, Duration::from_secs(1))
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let outcome = tokio::time::timeout(Duration::from_secs(2), source.read_line(&cancel))
            .await
            .expect("read_line should return once cancelled")
            .unwrap();
        assert!(matches!(outcome, ReadOutcome::Cancelled));
        server.abort();
    }

    #[tokio::test]
    async fn test_refused_endpoint_is_connection_error() {
        let (listener, endpoint) = local_listener().await;
        drop(listener);

        let result = TcpLineSource::connect(&endpoint, Duration::from_secs(1)).await;
        assert!(matches!(
            result,
            Err(ConnectionError::Unreachable { .. }) | Err(ConnectionError::TimedOut { .. })
        ));
    }
}
