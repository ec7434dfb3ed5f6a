// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tracing_subscriber::EnvFilter;

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "MICROBATCH_LOG";

/// Installs a `tracing_subscriber` fmt subscriber using `MICROBATCH_LOG` first,
/// then `RUST_LOG`, then `info`.
///
/// Field contract for stream events:
/// - `sequence` on every batch-scoped event.
/// - `endpoint` on every source-scoped event.
/// - `handler` whenever a batch handler is involved.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
