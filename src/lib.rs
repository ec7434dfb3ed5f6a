// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // YAML config + validated runtime config
pub mod context;    // session and stream lifecycle
pub mod engine;     // batch cutter and processor
pub mod errors;     // error handling
pub mod fraud;      // worked-example batch handler
pub mod observability;
pub mod source;     // line sources
pub mod traits;     // handler and source abstractions
pub mod types;
