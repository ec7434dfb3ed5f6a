// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Line sources feeding the batch cutter.

mod reader;
mod tcp;

pub use reader::{pump_lines, ReaderSummary};
pub use tcp::TcpLineSource;
