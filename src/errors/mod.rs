// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod callback;
mod config;
mod connection;
mod lifecycle;
mod stream;

pub use callback::CallbackError;
pub use config::ConfigurationError;
pub use connection::ConnectionError;
pub use lifecycle::LifecycleError;
pub use stream::StreamError;
