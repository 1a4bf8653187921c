// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! AI service integrations.

pub mod google;
pub mod shared;

use crate::processors::Processor;

/// Base trait for all AI services.
pub trait AIService: Processor {
    /// Get the model name used by this service.
    fn model(&self) -> Option<&str> {
        None
    }

    /// Whether the service reports TTFB and usage metrics.
    fn can_generate_metrics(&self) -> bool {
        false
    }
}
