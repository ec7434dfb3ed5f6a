// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::StreamConfig;
use crate::context::StreamContext;
use crate::errors::{ConfigurationError, StreamError};
use crate::traits::BatchHandler;

/// Owner of the single active streaming context.
///
/// Cloning a session shares the slot; two clones still allow only one
/// active context between them.
#[derive(Debug, Clone, Default)]
pub struct Session {
    active: Arc<AtomicBool>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a streaming context feeding `handler`.
    ///
    /// Fails with [`ConfigurationError::ContextAlreadyActive`] while another
    /// context from this session has not been stopped or dropped.
    pub fn streaming_context(
        &self,
        config: StreamConfig,
        handler: Arc<dyn BatchHandler>,
    ) -> Result<StreamContext, StreamError> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ConfigurationError::ContextAlreadyActive)?;

        Ok(StreamContext::new(
            config,
            handler,
            ActiveSlot(Some(Arc::clone(&self.active))),
        ))
    }

    pub fn has_active_context(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Claim on a session's context slot, released on stop or drop.
#[derive(Debug)]
pub(crate) struct ActiveSlot(Option<Arc<AtomicBool>>);

impl ActiveSlot {
    pub(crate) fn release(&mut self) {
        if let Some(active) = self.0.take() {
            active.store(false, Ordering::Release);
        }
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.release();
    }
}
