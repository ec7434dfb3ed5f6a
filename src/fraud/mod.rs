// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fraud flagging over transaction batches.
//!
//! Each line of a batch is a JSON transaction with string-encoded fields:
//!
//! ```text
//! {"name": "Alice", "surname": "Smith", "amount": "120.50", "delta_t": "3.2", "flag": "1"}
//! ```
//!
//! A user, identified as `surname ++ name`, is reported as fraudulent when
//! more than one of their transactions in the same batch carries `flag = 1`.
//! Counts never carry over between batches.

mod detector;
mod sink;
mod transaction;

pub use detector::{flag_fraudsters, BatchVerdicts, FraudDetector, FraudVerdict, FRAUD_FLAG_THRESHOLD};
pub use sink::{ChannelSink, StdoutSink, VerdictSink};
pub use transaction::Transaction;
