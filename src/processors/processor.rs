// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Processor trait with explicit context passing.
//!
//! Processors own their state and receive a [`ProcessorContext`] on every
//! call instead of holding links to their neighbours. Output goes through
//! unbounded channels, so sending never blocks and never re-enters another
//! processor.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::frames::FrameEnum;
use crate::processors::FrameDirection;

/// Channels and tokens handed to a processor for one `process()` call.
pub struct ProcessorContext {
    downstream_tx: mpsc::UnboundedSender<FrameEnum>,
    upstream_tx: mpsc::UnboundedSender<FrameEnum>,
    cancel_token: CancellationToken,
    /// Cancelled when the user interrupts while `process()` is running.
    interruption_token: CancellationToken,
}

impl ProcessorContext {
    pub fn new(
        downstream_tx: mpsc::UnboundedSender<FrameEnum>,
        upstream_tx: mpsc::UnboundedSender<FrameEnum>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            downstream_tx,
            upstream_tx,
            cancel_token,
            interruption_token: CancellationToken::new(),
        }
    }

    /// Create a context for unit tests.
    #[cfg(test)]
    pub fn for_test(
        downstream_tx: mpsc::UnboundedSender<FrameEnum>,
        upstream_tx: mpsc::UnboundedSender<FrameEnum>,
    ) -> Self {
        Self::new(downstream_tx, upstream_tx, CancellationToken::new())
    }

    /// Use `token` as the interruption token for subsequent calls.
    pub fn with_interruption_token(mut self, token: CancellationToken) -> Self {
        self.interruption_token = token;
        self
    }

    /// Send a frame downstream. Logs if the receiver is gone.
    pub fn send_downstream(&self, frame: FrameEnum) {
        if self.downstream_tx.send(frame).is_err() {
            tracing::warn!("ProcessorContext: downstream receiver dropped, frame lost");
        }
    }

    /// Send a frame upstream. Logs if the receiver is gone.
    pub fn send_upstream(&self, frame: FrameEnum) {
        if self.upstream_tx.send(frame).is_err() {
            tracing::warn!("ProcessorContext: upstream receiver dropped, frame lost");
        }
    }

    /// Send a frame in the given direction.
    pub fn send(&self, frame: FrameEnum, direction: FrameDirection) {
        match direction {
            FrameDirection::Downstream => self.send_downstream(frame),
            FrameDirection::Upstream => self.send_upstream(frame),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Token long-running processors select on to stop early.
    pub fn interruption_token(&self) -> &CancellationToken {
        &self.interruption_token
    }

    pub fn is_interrupted(&self) -> bool {
        self.interruption_token.is_cancelled()
    }
}

impl fmt::Debug for ProcessorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorContext")
            .field("cancelled", &self.cancel_token.is_cancelled())
            .field("interrupted", &self.interruption_token.is_cancelled())
            .finish()
    }
}

/// A pipeline stage.
///
/// Implementors forward every frame they do not consume, in the direction it
/// arrived from, so that unrelated frames pass through untouched.
#[async_trait]
pub trait Processor: Send + Sync + fmt::Debug + fmt::Display {
    /// Human-readable name for logging and metrics.
    fn name(&self) -> &str;

    /// Unique identifier for this processor instance.
    fn id(&self) -> u64;

    /// Process a single frame, emitting output through `ctx`.
    async fn process(
        &mut self,
        frame: FrameEnum,
        direction: FrameDirection,
        ctx: &ProcessorContext,
    );
}
