// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::Arc;

use anyhow::Context;
use the_microbatch::config::load_and_validate_config;
use the_microbatch::context::Session;
use the_microbatch::fraud::{FraudDetector, StdoutSink};
use the_microbatch::observability::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <config.yaml>", args[0]);
        eprintln!("Example: {} configs/fraud-detection.yaml", args[0]);
        std::process::exit(1);
    }

    init_tracing();

    let config = load_and_validate_config(&args[1])
        .with_context(|| format!("loading configuration from {}", args[1]))?;

    let session = Session::new();
    let context = session.streaming_context(config, Arc::new(FraudDetector::new(StdoutSink)))?;
    context.start().await?;

    let terminated = tokio::select! {
        result = context.await_termination() => Some(result),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, stopping stream");
            None
        }
    };

    context.stop().await?;

    if let Some(result) = terminated {
        result.context("stream terminated")?;
    }

    Ok(())
}
