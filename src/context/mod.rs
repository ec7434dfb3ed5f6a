// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Streaming context lifecycle.
//!
//! A [`Session`] hands out at most one active [`StreamContext`]. The context
//! owns the line source connection and the three tasks that make up a
//! running stream: reader, cutter and batch processor.

mod session;
mod stream_context;

pub use session::Session;
pub use stream_context::{StreamContext, StreamState};
