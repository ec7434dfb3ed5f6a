// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::fraud::BatchVerdicts;

/// Destination for per-batch fraud verdicts.
#[async_trait]
pub trait VerdictSink: Send + Sync {
    async fn emit(&self, verdicts: &BatchVerdicts) -> anyhow::Result<()>;
}

/// Prints one JSON object per flagged user to stdout.
pub struct StdoutSink;

#[async_trait]
impl VerdictSink for StdoutSink {
    async fn emit(&self, verdicts: &BatchVerdicts) -> anyhow::Result<()> {
        if verdicts.verdicts.is_empty() {
            return Ok(());
        }
        let mut out = tokio::io::stdout();
        out.write_all(&json_lines(verdicts)?).await?;
        out.flush().await?;
        Ok(())
    }
}

/// Verdicts of one batch as newline-terminated JSON objects.
fn json_lines(verdicts: &BatchVerdicts) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    for verdict in &verdicts.verdicts {
        serde_json::to_writer(&mut buf, verdict)?;
        buf.push(b'\n');
    }
    Ok(buf)
}

/// Forwards verdicts to a channel, for embedding the detector in a larger pipeline.
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<BatchVerdicts>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::UnboundedSender<BatchVerdicts>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl VerdictSink for ChannelSink {
    async fn emit(&self, verdicts: &BatchVerdicts) -> anyhow::Result<()> {
        self.sender
            .send(verdicts.clone())
            .map_err(|_| anyhow::anyhow!("verdict receiver dropped"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraud::FraudVerdict;

    fn verdicts(users: &[&str]) -> BatchVerdicts {
        BatchVerdicts {
            sequence: 3,
            transactions: 10,
            skipped: 0,
            verdicts: users
                .iter()
                .map(|u| FraudVerdict {
                    user_id: u.to_string(),
                    is_fraud: true,
                })
                .collect(),
        }
    }

    #[test]
    fn test_one_json_object_per_line() {
        let out = json_lines(&verdicts(&["AliceSmith", "CarolWhite"])).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"userID\":\"AliceSmith\",\"isFraud\":true}\n\
             {\"userID\":\"CarolWhite\",\"isFraud\":true}\n"
        );
    }

    #[tokio::test]
    async fn test_stdout_sink_writes_without_error() {
        StdoutSink.emit(&verdicts(&["AliceSmith"])).await.unwrap();
        StdoutSink.emit(&verdicts(&[])).await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_sink_forwards_verdicts() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        ChannelSink::new(tx).emit(&verdicts(&["AliceSmith"])).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), verdicts(&["AliceSmith"]));
    }
}
