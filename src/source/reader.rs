// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tokio_util::sync::CancellationToken;

use crate::engine::cutter::BatchBuffer;
use crate::errors::ConnectionError;
use crate::observability::messages::source::SourceClosed;
use crate::observability::messages::StructuredLog;
use crate::traits::{LineSource, ReadOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderSummary {
    pub lines_read: u64,
    pub bytes_read: u64,
}

/// Move lines from `source` into `buffer` until cancelled or the stream ends.
///
/// Cancellation is a clean exit. End of stream and read failures are terminal
/// connection errors; every line read before them has already been appended.
pub async fn pump_lines<S>(
    source: &mut S,
    buffer: &BatchBuffer,
    cancel: &CancellationToken,
) -> Result<ReaderSummary, ConnectionError>
where
    S: LineSource + ?Sized,
{
    let mut lines_read = 0u64;

    let result = loop {
        match source.read_line(cancel).await {
            Ok(ReadOutcome::Line(record)) => {
                buffer.append(record);
                lines_read += 1;
            }
            Ok(ReadOutcome::Cancelled) => break Ok(()),
            Ok(ReadOutcome::EndOfStream) => {
                break Err(ConnectionError::ClosedByPeer {
                    endpoint: source.endpoint().to_string(),
                    bytes_read: source.bytes_read(),
                })
            }
            Err(e) => break Err(e),
        }
    };

    SourceClosed {
        endpoint: source.endpoint(),
        lines_read,
        bytes_read: source.bytes_read(),
        by_peer: result.is_err(),
    }
    .log();

    result.map(|()| ReaderSummary {
        lines_read,
        bytes_read: source.bytes_read(),
    })
}
