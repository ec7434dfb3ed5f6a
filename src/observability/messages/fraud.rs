// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the fraud flagging handler.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A line in the batch could not be decoded as a transaction.
///
/// # Log Level
/// `warn!` - Record skipped, batch continues
pub struct MalformedTransactionSkipped<'a> {
    pub sequence: u64,
    pub line: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for MalformedTransactionSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Skipping malformed transaction in batch {}: {} ({:?})",
            self.sequence, self.error, self.line
        )
    }
}

impl StructuredLog for MalformedTransactionSkipped<'_> {
    fn log(&self) {
        tracing::warn!(
            sequence = self.sequence,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "malformed_transaction",
            span_name = name,
            sequence = self.sequence,
        )
    }
}

/// Fraud verdicts were computed for a batch.
///
/// # Log Level
/// `info!` - One summary per batch
///
/// # Example
/// ```
/// use the_microbatch::observability::messages::fraud::FraudSummary;
///
/// let msg = FraudSummary {
///     sequence: 3,
///     transactions: 120,
///     skipped: 1,
///     flagged_users: 2,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct FraudSummary {
    pub sequence: u64,
    pub transactions: usize,
    pub skipped: usize,
    pub flagged_users: usize,
}

impl Display for FraudSummary {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch {}: {} transactions, {} skipped, {} users flagged as fraud",
            self.sequence, self.transactions, self.skipped, self.flagged_users
        )
    }
}

impl StructuredLog for FraudSummary {
    fn log(&self) {
        tracing::info!(
            sequence = self.sequence,
            transactions = self.transactions,
            skipped = self.skipped,
            flagged_users = self.flagged_users,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "fraud_summary",
            span_name = name,
            sequence = self.sequence,
        )
    }
}
