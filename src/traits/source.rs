use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::ConnectionError;
use crate::types::Record;

/// Result of a single `read_line` call.
#[derive(Debug)]
pub enum ReadOutcome {
    Line(Record),
    /// The peer closed the connection cleanly.
    EndOfStream,
    /// The cancellation token fired while waiting for data.
    Cancelled,
}

/// A single-owner, order-preserving stream of text lines.
///
/// `read_line` takes `&mut self`, so two readers can never share one
/// connection; the source is moved into exactly one reader task.
#[async_trait]
pub trait LineSource: Send {
    /// Wait for the next complete line, the end of the stream, or cancellation.
    async fn read_line(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome, ConnectionError>;

    /// Human readable endpoint, used in logs and errors.
    fn endpoint(&self) -> &str;

    /// Bytes consumed from the connection so far.
    fn bytes_read(&self) -> u64;
}
