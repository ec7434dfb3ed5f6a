// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::fraud::{Transaction, VerdictSink};
use crate::observability::messages::fraud::{FraudSummary, MalformedTransactionSkipped};
use crate::observability::messages::StructuredLog;
use crate::traits::BatchHandler;
use crate::types::Batch;

/// A user is flagged once their flagged transactions in one batch exceed this count.
pub const FRAUD_FLAG_THRESHOLD: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FraudVerdict {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "isFraud")]
    pub is_fraud: bool,
}

/// Verdicts for one batch, plus what was read to reach them.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchVerdicts {
    pub sequence: u64,
    pub transactions: usize,
    pub skipped: usize,
    pub verdicts: Vec<FraudVerdict>,
}

/// Users with more than [`FRAUD_FLAG_THRESHOLD`] flagged transactions, sorted by user id.
///
/// ```
/// use the_microbatch::fraud::{flag_fraudsters, Transaction};
///
/// let lines = [
///     r#"{"name":"Smith","surname":"Alice","amount":"10","delta_t":"1","flag":"1"}"#,
///     r#"{"name":"Smith","surname":"Alice","amount":"12","delta_t":"2","flag":"1"}"#,
///     r#"{"name":"Jones","surname":"Bob","amount":"99","delta_t":"1","flag":"1"}"#,
/// ];
/// let transactions: Vec<Transaction> =
///     lines.iter().map(|l| Transaction::parse(l).unwrap()).collect();
///
/// let verdicts = flag_fraudsters(&transactions);
/// assert_eq!(verdicts.len(), 1);
/// assert_eq!(verdicts[0].user_id, "AliceSmith");
/// ```
pub fn flag_fraudsters<'a, I>(transactions: I) -> Vec<FraudVerdict>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut flagged: BTreeMap<String, usize> = BTreeMap::new();
    for tx in transactions.into_iter().filter(|tx| tx.flag) {
        *flagged.entry(tx.user_id()).or_default() += 1;
    }

    flagged
        .into_iter()
        .filter(|(_, count)| *count > FRAUD_FLAG_THRESHOLD)
        .map(|(user_id, _)| FraudVerdict {
            user_id,
            is_fraud: true,
        })
        .collect()
}

/// Batch handler decoding transactions and emitting fraud verdicts to a sink.
///
/// Lines that do not decode are logged and skipped; they never fail the batch.
/// A sink error does.
pub struct FraudDetector<S> {
    sink: S,
}

impl<S: VerdictSink> FraudDetector<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Decode and aggregate one batch without emitting anything.
    pub fn evaluate(&self, batch: &Batch) -> BatchVerdicts {
        let mut transactions = Vec::with_capacity(batch.len());
        let mut skipped = 0;

        for line in batch.lines() {
            match Transaction::parse(line) {
                Ok(tx) => transactions.push(tx),
                Err(e) => {
                    skipped += 1;
                    MalformedTransactionSkipped {
                        sequence: batch.sequence,
                        line,
                        error: &e,
                    }
                    .log();
                }
            }
        }

        BatchVerdicts {
            sequence: batch.sequence,
            transactions: transactions.len(),
            skipped,
            verdicts: flag_fraudsters(&transactions),
        }
    }
}

#[async_trait]
impl<S: VerdictSink> BatchHandler for FraudDetector<S> {
    async fn handle(&self, batch: &Batch) -> anyhow::Result<()> {
        let verdicts = self.evaluate(batch);

        FraudSummary {
            sequence: verdicts.sequence,
            transactions: verdicts.transactions,
            skipped: verdicts.skipped,
            flagged_users: verdicts.verdicts.len(),
        }
        .log();

        self.sink.emit(&verdicts).await
    }

    fn name(&self) -> &'static str {
        "fraud_detector"
    }
}
